// GPU probes (spec 4.1, "GPU probes").  Two independent vendor backends are combined behind one
// trait so the sampler loop never needs to know which libraries are actually present on the node;
// a node with neither library simply reports zero devices, which is not an error (spec 4.1, 7).

#[cfg(feature = "amd")]
pub mod amd;
#[cfg(test)]
pub mod mockgpu;
#[cfg(feature = "nvidia")]
pub mod nvidia;
pub mod realgpu;

use crate::procfsapi::ProcfsAPI;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpuSample {
    pub load_pct: f64,
    pub mem_used_gb: f64,
    pub power_watts: f64,
    // (comm, mem_gb) of processes the device reports as active.  Always empty for AMD devices --
    // spec 4.1 only specifies a per-process breakdown for NVIDIA memory.
    pub mem_processes: Vec<(String, f64)>,
}

// One sample per detected device, in stable index order: NVIDIA devices occupy `[0, Nn)`, AMD
// devices occupy `[Nn, Nn+Na)` (spec 4.1).
pub trait GpuAPI {
    fn sample(&mut self, fs: &dyn ProcfsAPI) -> Vec<GpuSample>;
}

// Resolves a pid reported by a GPU library to the `comm` the process probe would have used, so
// GPU-memory-by-process series share the same key space as the process-level metrics.  Falls back
// to the numeric pid (stringified) if /proc has already reclaimed the slot -- the device driver's
// view of "is this process alive" can lag procfs by a tick.
pub(crate) fn comm_for_pid(fs: &dyn ProcfsAPI, pid: u32) -> String {
    match fs.read_to_string(&format!("{pid}/comm")) {
        Ok(s) => s.trim().to_string(),
        Err(_) => pid.to_string(),
    }
}
