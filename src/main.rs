mod bootstrap;
mod cli;
mod gpu;
mod interrupt;
mod jobstate;
mod log;
#[cfg(test)]
mod mocksystem;
mod procfsapi;
mod process_probe;
mod realsystem;
mod sampler;
mod shrink;
mod systemapi;
mod timeseries;
mod util;
mod writer;

use jobstate::JobState;

fn main() {
    let args = cli::command_line();

    let boot = match bootstrap::resolve(&args) {
        Ok(boot) => boot,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let log_path = boot
        .output_dir
        .join(format!("sps-{}.log", boot.job_label));
    if let Err(e) = log::open(&log_path) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let mut gpu = gpu::realgpu::RealGpu::new();
    let fs = procfsapi::RealFS::new();
    let num_gpus = { use gpu::GpuAPI; gpu.sample(&fs).len() };

    let mut job = JobState::new(
        &boot.output_dir,
        &boot.job_label,
        boot.cgroup_id.clone(),
        boot.cpus_requested.clone(),
        boot.mem_requested_gb.clone(),
        num_gpus,
    );

    log::info(&format!("SLURM_JOB_ID\t{}", boot.job_label));
    log::info(&format!("REQ_CPU_CORES\t{}", boot.cpus_requested));
    log::info(&format!("REQ_MEMORY_GB\t{}", boot.mem_requested_gb));
    log::info(&format!("OUTPUT_DIR\t{}", boot.output_dir.display()));

    if let Err(e) = bootstrap::daemonize(args.foreground) {
        log::error(&e);
        std::process::exit(1);
    }
    interrupt::handle_interruptions();
    log::info(&format!("SPS_PROCESS\t{}", std::process::id()));
    log::info("Starting profiling...");

    let system = realsystem::RealSystem::new();
    sampler::run(&mut job, &system, &fs, &mut gpu, &interrupt::is_interrupted);
}
