// The main loop (spec 4.5).  Single-threaded and synchronous: one iteration reads the process
// table and GPU devices, folds the results into the in-memory series, writes them to disk, and
// sleeps for the current sample period before advancing the tick.
//
// The ordering here is load-bearing (spec 4.5): `advance_tick` precedes every `add` for the tick;
// the writer runs before the shrink check, so a shrink-induced rewrite happens on the *next*
// iteration rather than mid-tick; and a newly discovered process key forces `rewrite_pending`
// before the append-vs-rewrite decision is made.

use crate::gpu::GpuAPI;
use crate::jobstate::JobState;
use crate::procfsapi::ProcfsAPI;
use crate::process_probe::{sample_processes, ProcessSample};
use crate::systemapi::SystemAPI;
use crate::{log, writer};

const SHRINK_INTERVAL: u64 = 4096;

pub fn run(
    job: &mut JobState,
    system: &dyn SystemAPI,
    fs: &dyn ProcfsAPI,
    gpu: &mut dyn GpuAPI,
    should_stop: &dyn Fn() -> bool,
) {
    loop {
        if should_stop() {
            return;
        }
        if let Err(e) = step(job, system, fs, gpu) {
            log::error(&format!("Fatal: {e}"));
            std::process::exit(1);
        }
        std::thread::sleep(std::time::Duration::from_secs(job.rate));
    }
}

// One sampling iteration. Exposed separately from `run` so tests can drive it tick by tick without
// sleeping.
pub fn step(
    job: &mut JobState,
    system: &dyn SystemAPI,
    fs: &dyn ProcfsAPI,
    gpu: &mut dyn GpuAPI,
) -> Result<(), String> {
    job.tick += 1;
    let tick = job.tick;

    for metric in job.process_metrics_mut() {
        metric.advance_tick();
    }
    for metric in job
        .gpu_load
        .iter_mut()
        .chain(job.gpu_mem.iter_mut())
        .chain(job.gpu_power.iter_mut())
    {
        metric.advance_tick();
    }

    let samples = sample_processes(system, fs, &job.cgroup_id)?;
    fold_process_samples(job, &samples, tick);

    let gpu_samples = gpu.sample(fs);
    fold_gpu_samples(job, &gpu_samples, tick);

    let rate = job.rate;
    if job.rewrite_pending {
        for metric in job.all_metrics_mut() {
            writer::rewrite_tab(metric, tick, rate)?;
        }
        job.rewrite_pending = false;
    } else {
        for metric in job.all_metrics_mut() {
            writer::append_tab(metric, tick, rate)?;
        }
    }

    if tick % SHRINK_INTERVAL == 0 {
        shrink(job);
    }

    Ok(())
}

fn fold_process_samples(
    job: &mut JobState,
    samples: &std::collections::BTreeMap<String, ProcessSample>,
    tick: u64,
) {
    for (comm, sample) in samples {
        let created = job.cpu.add(comm, sample.cpu, tick);
        job.mem.add(comm, sample.rss_gb, tick);
        job.read.add(comm, sample.read_gb, tick);
        job.write.add(comm, sample.write_gb, tick);
        if created {
            // `add` on the first metric already created this key's series; the other three were
            // backfilled by their own `add` calls above, but spec invariant 3 additionally requires
            // the key set to be identical across all four even before any of them have seen a
            // nonzero sample for it, so make sure each one actually has the series.
            job.mem.ensure_key(comm, tick);
            job.read.ensure_key(comm, tick);
            job.write.ensure_key(comm, tick);
            job.rewrite_pending = true;
        }
    }
}

fn fold_gpu_samples(job: &mut JobState, samples: &[crate::gpu::GpuSample], tick: u64) {
    for (i, sample) in samples.iter().enumerate() {
        if i >= job.gpu_load.len() {
            // A device appeared after bootstrap sized the metric vectors; spec 4.1 does not cover
            // hot-plug, so we simply stop tracking devices beyond what was enumerated at startup.
            break;
        }
        job.gpu_load[i].add("total", sample.load_pct, tick);
        job.gpu_mem[i].add("total", sample.mem_used_gb, tick);
        job.gpu_power[i].add("total", sample.power_watts, tick);
        for (comm, mem_gb) in &sample.mem_processes {
            if job.gpu_mem[i].add(comm, *mem_gb, tick) {
                job.rewrite_pending = true;
            }
        }
    }
}

fn shrink(job: &mut JobState) {
    let pad = job.tick % 2 == 1;
    for metric in job.all_metrics_mut() {
        metric.shrink(pad);
    }
    job.tick = if pad { job.tick + 1 } else { job.tick } / 2;
    job.rate *= 2;
    job.rewrite_pending = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mockgpu::MockGpu;
    use crate::mocksystem::MockSystem;
    use crate::procfsapi::MockFS;
    use crate::util::map;

    fn stat_line(comm: &str, utime: u64) -> String {
        format!("1 ({comm}) S 0 0 0 0 0 0 0 0 0 0 {utime} 0 0 0 0 0 1 0 0 0 0")
    }

    fn io_text() -> String {
        "rchar: 0\nwchar: 0\nsyscr: 0\nsyscw: 0\nread_bytes: 0\nwrite_bytes: 0\ncancelled_write_bytes: 0\n"
            .to_string()
    }

    #[test]
    fn first_tick_forces_rewrite_and_creates_shared_keys() {
        let dir = std::env::temp_dir().join(format!("sps-sampler-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let mut job = JobState::new(&dir, "local", "/job1".to_string(), "4".to_string(), "0".to_string(), 0);
        let system = MockSystem {
            ticks_per_sec: 100,
            now: 1,
            boot_time: 0,
            pid: 1,
        };
        let files = map! {
            "1/cgroup".to_string() => "/job1\n".to_string(),
            "1/stat".to_string() => stat_line("worker", 10),
            "1/io".to_string() => io_text(),
        };
        let fs = MockFS::new(files, vec![1]);
        let mut gpu = MockGpu::new(vec![]);

        step(&mut job, &system, &fs, &mut gpu).unwrap();

        assert_eq!(job.tick, 1);
        assert!(job.cpu.series.contains_key("worker"));
        assert!(job.mem.series.contains_key("worker"));
        assert!(job.read.series.contains_key("worker"));
        assert!(job.write.series.contains_key("worker"));
        assert!(!job.rewrite_pending);
        assert!(dir.join("sps-local-cpu.tsv").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn shrink_triggers_exactly_at_the_interval() {
        let dir = std::env::temp_dir().join(format!("sps-sampler-test2-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let mut job = JobState::new(&dir, "local", "/job1".to_string(), "4".to_string(), "0".to_string(), 0);
        let system = MockSystem::default();
        let fs = MockFS::new(std::collections::HashMap::new(), vec![]);
        let mut gpu = MockGpu::new(vec![]);

        job.cpu.series.insert("w".to_string(), vec![1.0; (SHRINK_INTERVAL - 1) as usize]);
        job.mem.series.insert("w".to_string(), vec![1.0; (SHRINK_INTERVAL - 1) as usize]);
        job.read.series.insert("w".to_string(), vec![1.0; (SHRINK_INTERVAL - 1) as usize]);
        job.write.series.insert("w".to_string(), vec![1.0; (SHRINK_INTERVAL - 1) as usize]);
        job.tick = SHRINK_INTERVAL - 1;
        job.rewrite_pending = false;

        step(&mut job, &system, &fs, &mut gpu).unwrap();

        assert_eq!(job.tick, SHRINK_INTERVAL / 2);
        assert_eq!(job.rate, 2);
        assert_eq!(job.cpu.series.get("w").unwrap().len(), (SHRINK_INTERVAL / 2) as usize);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
