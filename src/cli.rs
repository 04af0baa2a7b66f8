// Hand-rolled argument parsing in the style of the teacher's `command_line()`/`usage()` -- no
// external arg-parsing crate (spec 6). Each option accepts both its short and long form; long
// forms take a glued `=value` (`--job-id=42`) or a separate following argument, short forms take a
// glued value (`-j42`) or a separate following argument.

const USAGE_ERROR: i32 = 2;

#[derive(Default, Debug, Clone)]
pub struct Args {
    pub job_id: Option<String>,
    pub cpu_count: Option<String>,
    pub array_job_id: Option<String>,
    pub array_task_id: Option<String>,
    pub output_prefix: Option<String>,
    pub foreground: bool,
}

pub fn command_line() -> Args {
    let argv = std::env::args().collect::<Vec<String>>();
    let mut args = Args::default();
    let mut next = 1;
    while next < argv.len() {
        let arg = argv[next].as_str();
        next += 1;
        if let Some((new_next, value)) = string_arg(arg, &argv, next, &["-j", "--job-id"]) {
            (next, args.job_id) = (new_next, Some(value));
        } else if let Some((new_next, value)) = string_arg(arg, &argv, next, &["-c", "--cpus"]) {
            (next, args.cpu_count) = (new_next, Some(value));
        } else if let Some((new_next, value)) =
            string_arg(arg, &argv, next, &["-a", "--array-job-id"])
        {
            (next, args.array_job_id) = (new_next, Some(value));
        } else if let Some((new_next, value)) =
            string_arg(arg, &argv, next, &["-t", "--array-task-id"])
        {
            (next, args.array_task_id) = (new_next, Some(value));
        } else if let Some((new_next, value)) =
            string_arg(arg, &argv, next, &["-o", "--output-prefix"])
        {
            (next, args.output_prefix) = (new_next, Some(value));
        } else if let Some(new_next) = bool_arg(arg, next, &["-f", "--foreground"]) {
            (next, args.foreground) = (new_next, true);
        } else if arg == "-h" || arg == "--help" {
            usage(false);
        } else {
            usage(true);
        }
    }
    args
}

fn bool_arg(arg: &str, next: usize, opt_names: &[&str]) -> Option<usize> {
    opt_names.contains(&arg).then_some(next)
}

fn string_arg(
    arg: &str,
    argv: &[String],
    next: usize,
    opt_names: &[&str],
) -> Option<(usize, String)> {
    for opt_name in opt_names {
        if arg == *opt_name {
            return if next < argv.len() {
                Some((next + 1, argv[next].clone()))
            } else {
                usage(true);
            };
        }
        if let Some(rest) = arg.strip_prefix(opt_name) {
            if opt_name.starts_with("--") {
                if let Some(value) = rest.strip_prefix('=') {
                    if !value.is_empty() {
                        return Some((next, value.to_string()));
                    }
                }
            } else if !rest.is_empty() {
                return Some((next, rest.to_string()));
            }
        }
    }
    None
}

fn usage(is_error: bool) -> ! {
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let out: &mut dyn std::io::Write = if is_error { &mut stderr } else { &mut stdout };
    let _ = std::io::Write::write_all(
        out,
        b"Usage: sps [OPTIONS]\n\n\
Options:\n\
  -j, --job-id ID           Job id (default: $SLURM_JOB_ID)\n\
  -c, --cpus N               Requested cpu count (default: $SLURM_CPUS_ON_NODE)\n\
  -a, --array-job-id ID     Array job id (default: $SLURM_ARRAY_JOB_ID)\n\
  -t, --array-task-id ID    Array task id (default: $SLURM_ARRAY_TASK_ID)\n\
  -o, --output-prefix DIR   Directory under which to create the sps-<label> output directory\n\
  -f, --foreground          Stay in the foreground instead of daemonizing\n\
  -h, --help                Print this message\n",
    );
    std::process::exit(if is_error { USAGE_ERROR } else { 0 });
}
