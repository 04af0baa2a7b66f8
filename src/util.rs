#![allow(unused_imports)]
#![allow(unused_macros)]

// Populate a HashMap, used by tests to build mock /proc trees.
#[cfg(test)]
macro_rules! map(
    { $($key:expr => $value:expr),* $(,)? } => {
        {
            let mut m = ::std::collections::HashMap::new();
            $(
                m.insert($key, $value);
            )*
            m
        }
     };
);

#[cfg(test)]
pub(crate) use map;

// Carve up a line of text into whitespace-separated chunks.  Used to address stat/io fields by
// space-separated index as required by the probes (spec 4.1).
pub fn chunks(input: &str) -> Vec<&str> {
    input.split_ascii_whitespace().collect()
}

// Bytes -> gigabytes, the decimal (1e9) convention used throughout for disk and GPU memory
// figures.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / 1_000_000_000.0
}

// Pages -> gigabytes, assuming the fixed 4 KiB page the spec mandates.
pub const PAGE_SIZE_BYTES: u64 = 4096;

pub fn pages_to_gb(pages: u64) -> f64 {
    bytes_to_gb(pages * PAGE_SIZE_BYTES)
}

// Milliwatts -> watts (NVIDIA).
pub fn milliwatts_to_watts(mw: u64) -> f64 {
    mw as f64 / 1000.0
}

// Microwatts -> watts (AMD).
pub fn microwatts_to_watts(uw: u64) -> f64 {
    uw as f64 / 1_000_000.0
}

#[test]
fn chunks_test() {
    assert_eq!(chunks("a  b\tc"), vec!["a", "b", "c"]);
    assert_eq!(chunks(""), Vec::<&str>::new());
}

#[test]
fn conversions_test() {
    assert!((bytes_to_gb(1_000_000_000) - 1.0).abs() < 1e-9);
    assert!((pages_to_gb(250_000) - 1.024).abs() < 1e-9);
    assert!((milliwatts_to_watts(123_000) - 123.0).abs() < 1e-9);
    assert!((microwatts_to_watts(123_000_000) - 123.0).abs() < 1e-9);
}
