// NVIDIA backend via `nvml-wrapper`, the crate the pack's other GPU-telemetry repo
// (wandb-wandb/nvidia_gpu_stats) uses for the identical purpose.  Initialization failure --
// missing library, no devices, permission denied -- yields zero devices rather than an error
// (spec 4.1, 7); the node simply has no NVIDIA GPUs as far as this daemon is concerned.

use crate::gpu::{comm_for_pid, GpuSample};
use crate::procfsapi::ProcfsAPI;

use nvml_wrapper::enums::device::UsedGpuMemory;
use nvml_wrapper::Nvml;
use std::path::Path;

pub struct NvidiaProbe {
    nvml: Nvml,
    device_count: u32,
}

impl NvidiaProbe {
    pub fn new() -> Option<NvidiaProbe> {
        if !nvidia_present() {
            return None;
        }
        let nvml = Nvml::init().ok()?;
        let device_count = nvml.device_count().ok()?;
        Some(NvidiaProbe { nvml, device_count })
    }

    pub fn sample(&self, fs: &dyn ProcfsAPI) -> Vec<GpuSample> {
        let mut result = Vec::with_capacity(self.device_count as usize);
        for index in 0..self.device_count {
            let Ok(device) = self.nvml.device_by_index(index) else {
                result.push(GpuSample::default());
                continue;
            };

            let load_pct = device
                .utilization_rates()
                .map(|u| u.gpu as f64)
                .unwrap_or(0.0);
            let mem_used_gb = device
                .memory_info()
                .map(|m| crate::util::bytes_to_gb(m.used))
                .unwrap_or(0.0);
            let power_watts = device
                .power_usage()
                .map(|mw| crate::util::milliwatts_to_watts(mw as u64))
                .unwrap_or(0.0);

            // Count, allocate, query once: `running_compute_processes` returns an owned Vec from
            // a single NVML call, so there is no window in which the process count can change
            // between an initial count query and a separate fetch (spec 9, GPU process races).
            let mem_processes = device
                .running_compute_processes()
                .unwrap_or_default()
                .into_iter()
                .filter_map(|p| match p.used_gpu_memory {
                    UsedGpuMemory::Used(bytes) => {
                        Some((comm_for_pid(fs, p.pid), crate::util::bytes_to_gb(bytes)))
                    }
                    UsedGpuMemory::Unavailable => None,
                })
                .collect();

            result.push(GpuSample {
                load_pct,
                mem_used_gb,
                power_watts,
                mem_processes,
            });
        }
        result
    }
}

// On every node we've seen with NVIDIA accelerators, /sys/module/nvidia exists iff the driver is
// loaded; checking it avoids paying for a failed NVML init on nodes with no GPU at all.
fn nvidia_present() -> bool {
    Path::new("/sys/module/nvidia").exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nvidia_present_does_not_panic() {
        let _ = nvidia_present();
    }
}
