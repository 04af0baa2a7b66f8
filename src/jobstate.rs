// Aggregate state for one profiled job (spec 3, "Job state").  Owns one Metric per observed
// dimension -- the four process-level ones plus three per detected GPU device -- and the tick/rate
// bookkeeping shared across all of them.

use crate::timeseries::Metric;

use std::path::Path;

pub struct JobState {
    pub cpu: Metric,
    pub mem: Metric,
    pub read: Metric,
    pub write: Metric,
    pub gpu_load: Vec<Metric>,
    pub gpu_mem: Vec<Metric>,
    pub gpu_power: Vec<Metric>,

    pub tick: u64,
    pub rate: u64,
    pub rewrite_pending: bool,
    pub cgroup_id: String,
    pub job_label: String,
}

impl JobState {
    pub fn new(
        dir: &Path,
        job_label: &str,
        cgroup_id: String,
        cpus_requested: String,
        mem_requested_gb: String,
        num_gpus: usize,
    ) -> JobState {
        // The file stem must equal the output directory's own name (`sps-<label>`), matching the
        // log file's `sps-<label>.log` naming (spec 6).
        let path = |suffix: &str| dir.join(format!("sps-{job_label}-{suffix}.tsv"));

        let gpu_load = (0..num_gpus)
            .map(|i| Metric::new("0".to_string(), path(&format!("gpu_load-{i}"))))
            .collect();
        let gpu_mem = (0..num_gpus)
            .map(|i| Metric::new("0".to_string(), path(&format!("gpu_mem-{i}"))))
            .collect();
        let gpu_power = (0..num_gpus)
            .map(|i| Metric::new("0".to_string(), path(&format!("gpu_power-{i}"))))
            .collect();

        JobState {
            cpu: Metric::new(cpus_requested, path("cpu")),
            mem: Metric::new(mem_requested_gb, path("mem")),
            read: Metric::new("0".to_string(), path("read")),
            write: Metric::new("0".to_string(), path("write")),
            gpu_load,
            gpu_mem,
            gpu_power,
            tick: 0,
            rate: 1,
            rewrite_pending: true,
            cgroup_id,
            job_label: job_label.to_string(),
        }
    }

    // All process-level metrics, in the fixed order used wherever the four must move in lockstep
    // (key creation, shrink padding) -- spec 3, invariant 3.
    pub fn process_metrics_mut(&mut self) -> [&mut Metric; 4] {
        [&mut self.cpu, &mut self.mem, &mut self.read, &mut self.write]
    }

    pub fn all_metrics_mut(&mut self) -> Vec<&mut Metric> {
        let mut v = vec![&mut self.cpu, &mut self.mem, &mut self.read, &mut self.write];
        v.extend(self.gpu_load.iter_mut());
        v.extend(self.gpu_mem.iter_mut());
        v.extend(self.gpu_power.iter_mut());
        v
    }
}
