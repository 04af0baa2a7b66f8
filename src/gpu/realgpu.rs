// Combines the two vendor backends into the single stable index space the sampler loop expects:
// NVIDIA devices occupy `[0, Nn)`, AMD devices occupy `[Nn, Nn+Na)` (spec 4.1).

use crate::gpu::GpuAPI;
use crate::procfsapi::ProcfsAPI;

#[cfg(feature = "amd")]
use crate::gpu::amd::AmdProbe;
#[cfg(feature = "nvidia")]
use crate::gpu::nvidia::NvidiaProbe;

pub struct RealGpu {
    #[cfg(feature = "nvidia")]
    nvidia: Option<NvidiaProbe>,
    #[cfg(feature = "amd")]
    amd: Option<AmdProbe>,
}

impl RealGpu {
    pub fn new() -> RealGpu {
        RealGpu {
            #[cfg(feature = "nvidia")]
            nvidia: NvidiaProbe::new(),
            #[cfg(feature = "amd")]
            amd: AmdProbe::new(),
        }
    }

}

impl Default for RealGpu {
    fn default() -> RealGpu {
        RealGpu::new()
    }
}

impl GpuAPI for RealGpu {
    fn sample(&mut self, fs: &dyn ProcfsAPI) -> Vec<crate::gpu::GpuSample> {
        let mut result = Vec::new();

        #[cfg(feature = "nvidia")]
        if let Some(probe) = &self.nvidia {
            result.extend(probe.sample(fs));
        }

        #[cfg(feature = "amd")]
        if let Some(probe) = &self.amd {
            result.extend(probe.sample());
        }

        result
    }
}
