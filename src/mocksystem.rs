use crate::systemapi::SystemAPI;

pub struct MockSystem {
    pub ticks_per_sec: u64,
    pub now: u64,
    pub boot_time: u64,
    pub pid: u32,
}

impl Default for MockSystem {
    fn default() -> MockSystem {
        MockSystem {
            ticks_per_sec: 100,
            now: 1_000_000,
            boot_time: 900_000,
            pid: 1,
        }
    }
}

impl SystemAPI for MockSystem {
    fn clock_ticks_per_sec(&self) -> u64 {
        self.ticks_per_sec
    }

    fn now_in_secs_since_epoch(&self) -> u64 {
        self.now
    }

    fn boot_time_in_secs_since_epoch(&self) -> u64 {
        self.boot_time
    }

    fn pid(&self) -> u32 {
        self.pid
    }
}
