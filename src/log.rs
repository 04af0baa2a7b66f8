// A trivial logging package, matching the teacher's own in spirit, but backed by the job's own
// `.log` file once it has been opened (sps.cpp writes `job.log`, not stderr, once the daemon is
// under way) rather than always going to stderr. Before the log file exists -- during argument
// parsing and directory rotation -- everything still goes to stderr so startup failures are never
// silently swallowed.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::sync::Mutex;

static JOB_LOG: Mutex<Option<File>> = Mutex::new(None);

pub fn init() {
    // Nothing to do until open() is called; kept for symmetry with the teacher's log module.
}

// Opens the job's log file, replacing the stderr fallback for every call after this point.
pub fn open(path: &std::path::Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    *JOB_LOG.lock().unwrap() = Some(file);
    Ok(())
}

fn write_line(prefix: &str, s: &str) {
    let mut guard = JOB_LOG.lock().unwrap();
    if let Some(file) = guard.as_mut() {
        let _ = writeln!(file, "{prefix}{s}");
        let _ = file.flush();
    } else {
        eprintln!("{prefix}{s}");
    }
}

pub fn info(s: &str) {
    write_line("Info: ", s);
}

pub fn error(s: &str) {
    write_line("Error: ", s);
}

pub fn warn(s: &str) {
    write_line("Warning: ", s);
}
