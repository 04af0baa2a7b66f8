// The sampling and time-series engine (spec 3, 4.2): one Metric per observed dimension, each
// holding an ordered map of entity key -> sample vector.  The hard invariant is that every series
// in every metric has exactly `tick` samples after a completed sampling step (spec 3, invariant 1).
//
// `series` is a BTreeMap rather than a HashMap so that key iteration order is lexicographic and
// stable across the process lifetime without an explicit sort at every write (spec 4.4,
// "Key-order stability"; spec 9, "Stable ordered key iteration").

use std::collections::BTreeMap;

pub struct Metric {
    pub requested: String,
    pub output_path: std::path::PathBuf,
    pub series: BTreeMap<String, Vec<f64>>,
}

impl Metric {
    pub fn new(requested: String, output_path: std::path::PathBuf) -> Metric {
        Metric {
            requested,
            output_path,
            series: BTreeMap::new(),
        }
    }

    // Append a zero to every existing series.  Must be called once per tick, before any `add` for
    // that tick (spec 4.2).
    pub fn advance_tick(&mut self) {
        for v in self.series.values_mut() {
            v.push(0.0);
        }
    }

    // Add `value` to the last sample of `key`'s series, creating the series (backfilled with
    // zeros) if `key` is new.  Returns true if a new series was created, which the caller uses to
    // set `rewrite_pending` (spec 4.2).
    pub fn add(&mut self, key: &str, value: f64, tick: u64) -> bool {
        if let Some(v) = self.series.get_mut(key) {
            *v.last_mut().expect("advance_tick must precede add") += value;
            false
        } else {
            let mut v = vec![0.0; tick.saturating_sub(1) as usize];
            v.push(value);
            self.series.insert(key.to_string(), v);
            true
        }
    }

    // Ensure a series exists for `key` even if this tick has no value to add for it, used so that
    // the four process-level metrics (cpu/mem/read/write) always share the same key set (spec 3,
    // invariant 3; spec 4.2).
    pub fn ensure_key(&mut self, key: &str, tick: u64) -> bool {
        if self.series.contains_key(key) {
            false
        } else {
            self.series.insert(key.to_string(), vec![0.0; tick as usize]);
            true
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    // Apply one round of RRD-style compaction (spec 4.3) to every series of this metric.
    // `pad` must be the same value, derived once from the shared tick counter, across every
    // metric of a job so that all of them stay aligned after the halving.
    pub fn shrink(&mut self, pad: bool) {
        let mut refs: Vec<&mut Vec<f64>> = self.series.values_mut().collect();
        if pad {
            for v in refs.iter_mut() {
                let last = *v.last().unwrap_or(&0.0);
                v.push(last);
            }
        }
        for v in refs.iter_mut() {
            crate::shrink::halve(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m() -> Metric {
        Metric::new("0".to_string(), "/tmp/x".into())
    }

    #[test]
    fn advance_then_add_accumulates_on_last_element() {
        let mut metric = m();
        let mut tick = 1u64;
        metric.add("a", 1.0, tick);
        tick += 1;
        metric.advance_tick();
        metric.add("a", 2.0, tick);
        assert_eq!(metric.series.get("a").unwrap(), &vec![1.0, 2.0]);
    }

    #[test]
    fn new_key_backfills_with_zeros() {
        let mut metric = m();
        let tick = 3u64;
        // Simulate two prior ticks having happened for some other key.
        metric.series.insert("existing".to_string(), vec![0.0, 0.0, 5.0]);
        let created = metric.add("late", 7.0, tick);
        assert!(created);
        assert_eq!(metric.series.get("late").unwrap(), &vec![0.0, 0.0, 7.0]);
    }

    #[test]
    fn same_key_sums_within_a_tick() {
        let mut metric = m();
        metric.add("w", 0.4, 1);
        metric.add("w", 0.6, 1);
        assert_eq!(metric.series.get("w").unwrap(), &vec![1.0]);
    }

    #[test]
    fn shrink_halves_every_series_in_the_metric() {
        let mut metric = m();
        metric.series.insert("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]);
        metric.series.insert("b".to_string(), vec![10.0, 20.0, 30.0, 40.0]);
        metric.shrink(false);
        assert_eq!(metric.series.get("a").unwrap(), &vec![2.0, 4.0]);
        assert_eq!(metric.series.get("b").unwrap(), &vec![20.0, 40.0]);
    }

    #[test]
    fn length_invariant_across_ticks() {
        let mut metric = m();
        let mut tick = 1u64;
        metric.add("a", 1.0, tick);
        for _ in 0..4 {
            tick += 1;
            metric.advance_tick();
            metric.add("a", 1.0, tick);
        }
        assert_eq!(metric.series.get("a").unwrap().len(), tick as usize);
    }
}
