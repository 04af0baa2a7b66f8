// Abstraction over process-global system facts that the probes and bootstrap need but that
// can't come from /proc: the clock tick rate, the current wall time, and the system boot time.
// Kept separate from ProcfsAPI (procfsapi.rs) because these facts come from libc calls, not file
// reads, and because tests want to fix them independently of the fake /proc tree.

pub trait SystemAPI {
    // sysconf(_SC_CLK_TCK), the number of scheduler ticks per second.  Used to convert /proc/*/stat
    // tick counts into seconds.
    fn clock_ticks_per_sec(&self) -> u64;

    // Seconds since the Unix epoch, "now".
    fn now_in_secs_since_epoch(&self) -> u64;

    // Seconds since the Unix epoch at which the system booted.  Combined with a process's
    // starttime (itself in ticks since boot) this gives process wall-clock runtime.
    fn boot_time_in_secs_since_epoch(&self) -> u64;

    // This daemon's own pid, used to discover the job's cgroup at bootstrap.
    fn pid(&self) -> u32;
}
