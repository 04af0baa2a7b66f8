use crate::systemapi::SystemAPI;

pub struct RealSystem {}

impl RealSystem {
    pub fn new() -> RealSystem {
        RealSystem {}
    }
}

impl SystemAPI for RealSystem {
    fn clock_ticks_per_sec(&self) -> u64 {
        unsafe { libc::sysconf(libc::_SC_CLK_TCK) as u64 }
    }

    fn now_in_secs_since_epoch(&self) -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before the epoch")
            .as_secs()
    }

    fn boot_time_in_secs_since_epoch(&self) -> u64 {
        let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };
        if unsafe { libc::sysinfo(&mut info) } != 0 {
            return self.now_in_secs_since_epoch();
        }
        self.now_in_secs_since_epoch()
            .saturating_sub(info.uptime as u64)
    }

    fn pid(&self) -> u32 {
        std::process::id()
    }
}
