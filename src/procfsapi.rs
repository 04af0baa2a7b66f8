// This creates an API by which the process probe accesses the underlying /proc tree, allowing the
// filesystem to be virtualized for tests.

use std::fs;
use std::path;

pub trait ProcfsAPI {
    // Open /proc/<path> (which can have multiple path elements, eg, {PID}/filename), read it, and
    // return its entire contents as a string.  Return a sensible error message if the file can't be
    // opened or read.
    fn read_to_string(&self, path: &str) -> Result<String, String>;

    // Return the numeric names of /proc/<N> directly below /proc, ie, candidate pids.  Return a
    // sensible error message if /proc itself can't be listed.
    fn read_pids(&self) -> Result<Vec<usize>, String>;
}

pub struct RealFS {}

impl RealFS {
    pub fn new() -> RealFS {
        RealFS {}
    }
}

impl ProcfsAPI for RealFS {
    fn read_to_string(&self, path: &str) -> Result<String, String> {
        let filename = format!("/proc/{path}");
        fs::read_to_string(path::Path::new(&filename)).map_err(|_| format!("Unable to read {filename}"))
    }

    fn read_pids(&self) -> Result<Vec<usize>, String> {
        let mut pids = vec![];
        let dir = fs::read_dir("/proc").map_err(|_| "Could not open /proc".to_string())?;
        for dirent in dir.flatten() {
            if let Some(name) = dirent.path().file_name() {
                if let Ok(pid) = name.to_string_lossy().parse::<usize>() {
                    pids.push(pid);
                }
            }
        }
        Ok(pids)
    }
}

#[cfg(test)]
pub struct MockFS {
    files: std::collections::HashMap<String, String>,
    pids: Vec<usize>,
}

#[cfg(test)]
impl MockFS {
    pub fn new(files: std::collections::HashMap<String, String>, pids: Vec<usize>) -> MockFS {
        MockFS { files, pids }
    }
}

#[cfg(test)]
impl ProcfsAPI for MockFS {
    fn read_to_string(&self, path: &str) -> Result<String, String> {
        match self.files.get(path) {
            Some(s) => Ok(s.clone()),
            None => Err(format!("Unable to read /proc/{path}")),
        }
    }

    fn read_pids(&self) -> Result<Vec<usize>, String> {
        Ok(self.pids.clone())
    }
}
