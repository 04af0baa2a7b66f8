// Resolves job identity, requested resources, and the output directory before control passes to
// the sampler loop (spec 4.6).  Directly grounded in sps.cpp's own startup sequence: job id from
// SLURM_JOB_ID / SLURM_ARRAY_JOB_ID / SLURM_ARRAY_TASK_ID, cpu count from SLURM_CPUS_ON_NODE,
// memory request read from the scheduler's cgroup soft-limit file, and a job label used to name
// both the output directory and every file inside it.

use crate::cli::Args;

use std::path::PathBuf;

pub struct Bootstrap {
    pub job_label: String,
    pub cpus_requested: String,
    pub mem_requested_gb: String,
    pub cgroup_id: String,
    pub output_dir: PathBuf,
}

pub fn resolve(args: &Args) -> Result<Bootstrap, String> {
    let job_id = args
        .job_id
        .clone()
        .or_else(|| env_var("SLURM_JOB_ID"))
        .unwrap_or_default();
    let array_job = args
        .array_job_id
        .clone()
        .or_else(|| env_var("SLURM_ARRAY_JOB_ID"))
        .unwrap_or_default();
    let array_task = args
        .array_task_id
        .clone()
        .or_else(|| env_var("SLURM_ARRAY_TASK_ID"))
        .unwrap_or_default();

    let job_label = if !array_job.is_empty() && array_job != "0" {
        format!("{array_job}_{array_task}")
    } else if !job_id.is_empty() && job_id != "0" {
        job_id.clone()
    } else {
        "local".to_string()
    };

    let cpus_requested = args
        .cpu_count
        .clone()
        .or_else(|| env_var("SLURM_CPUS_ON_NODE"))
        .unwrap_or_else(|| "0".to_string());

    let mem_requested_gb = read_mem_request(&job_id);

    let cgroup_id = std::fs::read_to_string(format!("/proc/{}/cgroup", std::process::id()))
        .map_err(|e| format!("Failed to read own cgroup: {e}"))?
        .lines()
        .next()
        .unwrap_or("")
        .to_string();

    let prefix = args
        .output_prefix
        .clone()
        .unwrap_or_else(|| ".".to_string());
    let dirname = format!("sps-{job_label}");
    let output_dir = rotate(PathBuf::from(prefix).join(dirname))?;
    std::fs::create_dir_all(&output_dir)
        .map_err(|e| format!("Failed to create {}: {e}", output_dir.display()))?;

    Ok(Bootstrap {
        job_label,
        cpus_requested,
        mem_requested_gb,
        cgroup_id,
        output_dir,
    })
}

// The scheduler publishes the job's memory soft limit in bytes under its cgroup hierarchy; we
// convert to the GB units the rest of the system's memory figures use (unlike the original, which
// keeps kilobytes -- see DESIGN.md).
fn read_mem_request(job_id: &str) -> String {
    let path = format!(
        "/sys/fs/cgroup/memory/slurm/uid_{}/job_{}/memory.soft_limit_in_bytes",
        unsafe { libc::getuid() },
        job_id
    );
    match std::fs::read_to_string(&path) {
        Ok(s) => match s.trim().parse::<u64>() {
            Ok(bytes) => format!("{:.3}", crate::util::bytes_to_gb(bytes)),
            Err(_) => "0".to_string(),
        },
        Err(_) => "0".to_string(),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

// Appends `.1` .. `.9` to `path` if it already exists, returning the first free slot.  Running out
// of slots is fatal (spec 4.6, 7).
fn rotate(path: PathBuf) -> Result<PathBuf, String> {
    if !path.exists() {
        return Ok(path);
    }
    for suffix in 1..=9 {
        let candidate = PathBuf::from(format!("{}.{suffix}", path.display()));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(format!(
        "No free rotation slot for output directory {}",
        path.display()
    ))
}

// Detaches from the controlling terminal, keeps the current working directory, and redirects
// stdio to /dev/null (spec 4.6).  A no-op when running in the foreground for debugging.
pub fn daemonize(foreground: bool) -> Result<(), String> {
    if foreground {
        return Ok(());
    }
    if unsafe { libc::daemon(1, 0) } == -1 {
        return Err("Failed to daemonize".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_returns_the_path_unchanged_when_free() {
        let dir = std::env::temp_dir().join(format!("sps-bootstrap-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(rotate(dir.clone()).unwrap(), dir);
    }

    #[test]
    fn rotate_finds_the_first_free_suffix() {
        let dir = std::env::temp_dir().join(format!("sps-bootstrap-test2-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let dot1 = PathBuf::from(format!("{}.1", dir.display()));
        std::fs::create_dir_all(&dot1).unwrap();
        let rotated = rotate(dir.clone()).unwrap();
        assert_eq!(rotated, PathBuf::from(format!("{}.2", dir.display())));
        let _ = std::fs::remove_dir_all(&dir);
        let _ = std::fs::remove_dir_all(&dot1);
    }
}
