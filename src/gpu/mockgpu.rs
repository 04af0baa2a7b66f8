use crate::gpu::{GpuAPI, GpuSample};
use crate::procfsapi::ProcfsAPI;

// A fixed sequence of per-device samples, one Vec per tick; calling `sample` past the end repeats
// the last tick, which is enough for sampler-loop tests that only care about a handful of ticks.
pub struct MockGpu {
    ticks: Vec<Vec<GpuSample>>,
    next: usize,
}

impl MockGpu {
    pub fn new(ticks: Vec<Vec<GpuSample>>) -> MockGpu {
        MockGpu { ticks, next: 0 }
    }
}

impl GpuAPI for MockGpu {
    fn sample(&mut self, _fs: &dyn ProcfsAPI) -> Vec<GpuSample> {
        if self.ticks.is_empty() {
            return vec![];
        }
        let i = self.next.min(self.ticks.len() - 1);
        self.next += 1;
        self.ticks[i].clone()
    }
}
