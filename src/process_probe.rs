// Maps the live state of /proc into per-comm aggregated samples for the processes belonging to
// one job, identified by cgroup membership (spec 4.1, "Process probe").
//
// Any read failure on any per-process file is silently treated as "this process is gone" and the
// process is dropped from this tick -- never a fatal error, never a partial tuple.  This mirrors
// both the teacher's procfs probe and the original sps.cpp, both of which tolerate pids
// disappearing between directory listing and read.

use crate::procfsapi::ProcfsAPI;
use crate::systemapi::SystemAPI;
use crate::util::{chunks, pages_to_gb};

use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProcessSample {
    pub cpu: f64,
    pub rss_gb: f64,
    pub read_gb: f64,
    pub write_gb: f64,
}

impl ProcessSample {
    fn add(&mut self, other: ProcessSample) {
        self.cpu += other.cpu;
        self.rss_gb += other.rss_gb;
        self.read_gb += other.read_gb;
        self.write_gb += other.write_gb;
    }
}

// Returns one aggregated sample per distinct `comm` among the processes whose cgroup equals
// `cgroup_id`.  The returned map is sorted by comm, which the TimeSeries store relies on being
// stable for append-mode writes (spec 4.4).
pub fn sample_processes(
    system: &dyn SystemAPI,
    fs: &dyn ProcfsAPI,
    cgroup_id: &str,
) -> Result<BTreeMap<String, ProcessSample>, String> {
    let ticks_per_sec = system.clock_ticks_per_sec();
    if ticks_per_sec == 0 {
        return Err("Could not get a sensible CLK_TCK".to_string());
    }
    let now_ticks = system.now_in_secs_since_epoch() * ticks_per_sec;
    let boot_ticks = system.boot_time_in_secs_since_epoch() * ticks_per_sec;

    let pids = fs.read_pids()?;
    let mut result = BTreeMap::<String, ProcessSample>::new();

    for pid in pids {
        let Ok(cgroup) = fs.read_to_string(&format!("{pid}/cgroup")) else {
            continue;
        };
        if cgroup.lines().next().unwrap_or("") != cgroup_id {
            continue;
        }

        let Ok(stat) = fs.read_to_string(&format!("{pid}/stat")) else {
            continue;
        };
        let Some(sample) = parse_stat(&stat, now_ticks, boot_ticks) else {
            continue;
        };
        let (comm, mut cpu_rss) = sample;

        let Ok(io) = fs.read_to_string(&format!("{pid}/io")) else {
            // The process may have gone away, or /proc/{pid}/io may be unreadable (permissions);
            // either way we still have cpu/mem, so report zero io rather than dropping the process.
            result.entry(comm).or_default().add(cpu_rss);
            continue;
        };
        let (read_gb, write_gb) = parse_io(&io);
        cpu_rss.read_gb = read_gb;
        cpu_rss.write_gb = write_gb;
        result.entry(comm).or_default().add(cpu_rss);
    }

    Ok(result)
}

// Parses /proc/{pid}/stat, returning (comm, sample) with read/write left at zero (filled in
// separately from the io file).  Fields are addressed by the 1-based stat-field numbering in
// spec 4.1: utime=14, stime=15, starttime=22, rss=24.  The comm field can itself contain spaces or
// parens, so it must be extracted first as the text between the first '(' and the last ')'.
fn parse_stat(line: &str, now_ticks: u64, boot_ticks: u64) -> Option<(String, ProcessSample)> {
    let commstart = line.find('(')?;
    let commend = line.rfind(')')?;
    if commend <= commstart {
        return None;
    }
    let comm = line[commstart + 1..commend].to_string();
    let rest = chunks(line[commend + 1..].trim());

    // `rest` starts at stat field 3 (state); field N is at rest[N - 3].
    let field = |n: usize| -> Option<u64> { rest.get(n - 3)?.parse::<u64>().ok() };

    let utime = field(14)?;
    let stime = field(15)?;
    let starttime = field(22)?;
    let rss_pages = field(24)?;

    let process_start_ticks = boot_ticks + starttime;
    let runtime_ticks = now_ticks.saturating_sub(process_start_ticks).max(1);
    let cpu_ticks = utime + stime;
    let cpu = cpu_ticks as f64 / runtime_ticks as f64;

    Some((
        comm,
        ProcessSample {
            cpu,
            rss_gb: pages_to_gb(rss_pages),
            read_gb: 0.0,
            write_gb: 0.0,
        },
    ))
}

// Parses /proc/{pid}/io.  Per spec 4.1, the read_bytes value is whitespace-token index 10 and the
// write_bytes value is index 12 (1-based) of the *whole file* split on whitespace, not per line.
fn parse_io(contents: &str) -> (f64, f64) {
    let tokens = chunks(contents);
    let read_bytes = tokens.get(9).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);
    let write_bytes = tokens.get(11).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);
    (
        crate::util::bytes_to_gb(read_bytes),
        crate::util::bytes_to_gb(write_bytes),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procfsapi::MockFS;
    use crate::util::map;

    fn stat_line(comm: &str, utime: u64, stime: u64, starttime: u64, rss_pages: u64) -> String {
        // pid (comm) state ppid pgrp session tty tpgid flags minflt cminflt majflt cmajflt
        // utime stime cutime cstime priority nice num_threads itrealvalue starttime vsize rss ...
        format!(
            "1 ({comm}) S 0 0 0 0 0 0 0 0 0 0 {utime} {stime} 0 0 0 0 1 0 {starttime} 0 {rss_pages}"
        )
    }

    fn io_text(read_bytes: u64, write_bytes: u64) -> String {
        format!(
            "rchar: 0\nwchar: 0\nsyscr: 0\nsyscw: 0\nread_bytes: {read_bytes}\nwrite_bytes: {write_bytes}\ncancelled_write_bytes: 0\n"
        )
    }

    #[test]
    fn single_process() {
        let system = crate::mocksystem::MockSystem {
            ticks_per_sec: 100,
            now: 1_000,
            boot_time: 0,
            pid: 1,
        };
        // starttime = 0 ticks since boot, now = 1000s = 100_000 ticks, so runtime = 100_000 ticks
        // = 1000s.  utime+stime = 100_000 ticks = 1000s of cpu => cpu == 1.0.
        let files = map! {
            "1/cgroup".to_string() => "/job1\n".to_string(),
            "1/stat".to_string() => stat_line("worker", 50_000, 50_000, 0, 250_000),
            "1/io".to_string() => io_text(2_000_000_000, 1_000_000_000),
        };
        let fs = MockFS::new(files, vec![1]);
        let samples = sample_processes(&system, &fs, "/job1").unwrap();
        let s = samples.get("worker").unwrap();
        assert!((s.cpu - 1.0).abs() < 1e-9);
        assert!((s.rss_gb - 1.024).abs() < 1e-9);
        assert!((s.read_gb - 2.0).abs() < 1e-9);
        assert!((s.write_gb - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cgroup_filter_excludes_other_jobs() {
        let system = crate::mocksystem::MockSystem::default();
        let files = map! {
            "1/cgroup".to_string() => "/job1\n".to_string(),
            "1/stat".to_string() => stat_line("worker", 10, 10, 0, 1),
            "1/io".to_string() => io_text(0, 0),
            "2/cgroup".to_string() => "/other\n".to_string(),
            "2/stat".to_string() => stat_line("intruder", 10, 10, 0, 1),
            "2/io".to_string() => io_text(0, 0),
        };
        let fs = MockFS::new(files, vec![1, 2]);
        let samples = sample_processes(&system, &fs, "/job1").unwrap();
        assert!(samples.contains_key("worker"));
        assert!(!samples.contains_key("intruder"));
    }

    #[test]
    fn same_comm_aggregates_by_sum() {
        // ticks_per_sec=100, now=1s, boot=0 => runtime = 100 ticks = 1s for a process with
        // starttime=0.  utime+stime of 40 and 60 ticks then give cpu 0.4 and 0.6, summing to 1.0.
        let system = crate::mocksystem::MockSystem {
            ticks_per_sec: 100,
            now: 1,
            boot_time: 0,
            pid: 1,
        };
        let files = map! {
            "1/cgroup".to_string() => "/job1\n".to_string(),
            "1/stat".to_string() => stat_line("w", 40, 0, 0, 0),
            "1/io".to_string() => io_text(0, 0),
            "2/cgroup".to_string() => "/job1\n".to_string(),
            "2/stat".to_string() => stat_line("w", 60, 0, 0, 0),
            "2/io".to_string() => io_text(0, 0),
        };
        let fs = MockFS::new(files, vec![1, 2]);
        let samples = sample_processes(&system, &fs, "/job1").unwrap();
        let s = samples.get("w").unwrap();
        assert!((s.cpu - 1.0).abs() < 1e-9);
    }

    #[test]
    fn vanished_process_is_dropped_not_fatal() {
        let system = crate::mocksystem::MockSystem::default();
        let files = map! {
            "1/cgroup".to_string() => "/job1\n".to_string(),
        };
        let fs = MockFS::new(files, vec![1, 2]);
        let samples = sample_processes(&system, &fs, "/job1").unwrap();
        assert!(samples.is_empty());
    }
}
