//! Reference time buffer: sorted series with linear interpolation

use super::TimeBuffer;
use crate::temporal::{Time, TimeSet, TIME_EPSILON};

/// Time-ordered rows with linear interpolation between neighbors and
/// clamped extrapolation beyond the ends
#[derive(Debug, Default)]
pub struct LinearBuffer {
    entries: Vec<(Time, Vec<f64>)>,
}

impl LinearBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl TimeBuffer for LinearBuffer {
    fn accept(&mut self, time: Time, values: Vec<f64>) {
        if let Some(entry) = self.entries.iter_mut().find(|(t, _)| t.equals(&time)) {
            entry.1 = values;
            return;
        }
        let at = self
            .entries
            .partition_point(|(t, _)| t.timestamp < time.timestamp);
        self.entries.insert(at, (time, values));
    }

    fn query(&self, at: &Time) -> Vec<f64> {
        let Some((first, _)) = self.entries.first() else {
            return Vec::new();
        };
        let stamp = at.end();
        if stamp <= first.timestamp {
            return self.entries[0].1.clone();
        }
        let (last, last_row) = self.entries.last().expect("non-empty checked above");
        if stamp >= last.timestamp {
            return last_row.clone();
        }

        // stamp lies strictly inside the buffered span
        let hi = self
            .entries
            .partition_point(|(t, _)| t.timestamp < stamp - TIME_EPSILON);
        let (t1, row1) = &self.entries[hi];
        if t1.equals(&Time::new(stamp)) {
            return row1.clone();
        }
        let (t0, row0) = &self.entries[hi - 1];
        let frac = (stamp - t0.timestamp) / (t1.timestamp - t0.timestamp);
        row0.iter()
            .zip(row1)
            .map(|(a, b)| a + (b - a) * frac)
            .collect()
    }

    fn clear_before(&mut self, timestamp: f64) {
        // Keep one entry at or before the cutoff so interpolation across it
        // stays possible.
        while self.entries.len() >= 2 && self.entries[1].0.timestamp <= timestamp {
            self.entries.remove(0);
        }
    }

    fn time_set(&self) -> TimeSet {
        TimeSet::from_times(self.entries.iter().map(|(t, _)| *t).collect())
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn filled() -> LinearBuffer {
        let mut buf = LinearBuffer::new();
        buf.accept(Time::new(1.0), vec![10.0, 100.0]);
        buf.accept(Time::new(3.0), vec![30.0, 300.0]);
        buf.accept(Time::new(2.0), vec![20.0, 200.0]);
        buf
    }

    #[test]
    fn test_accept_keeps_entries_sorted() {
        let buf = filled();
        let stamps: Vec<f64> = buf.time_set().times().iter().map(|t| t.timestamp).collect();
        assert_eq!(stamps, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_accept_replaces_equal_time() {
        let mut buf = filled();
        buf.accept(Time::new(2.0), vec![21.0, 201.0]);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.query(&Time::new(2.0)), vec![21.0, 201.0]);
    }

    #[test]
    fn test_query_exact_and_interpolated() {
        let buf = filled();
        assert_eq!(buf.query(&Time::new(2.0)), vec![20.0, 200.0]);
        assert_eq!(buf.query(&Time::new(1.5)), vec![15.0, 150.0]);
    }

    #[test]
    fn test_query_clamps_outside_span() {
        let buf = filled();
        assert_eq!(buf.query(&Time::new(0.0)), vec![10.0, 100.0]);
        assert_eq!(buf.query(&Time::new(9.0)), vec![30.0, 300.0]);
        assert!(LinearBuffer::new().query(&Time::new(1.0)).is_empty());
    }

    #[test]
    fn test_query_uses_span_end_for_durations() {
        let buf = filled();
        // span [1.0, 1.0+0.5] queries at its end, 1.5
        assert_eq!(buf.query(&Time::with_duration(1.0, 0.5)), vec![15.0, 150.0]);
    }

    #[test]
    fn test_clear_before_keeps_one_bracketing_entry() {
        let mut buf = filled();
        buf.clear_before(2.5);
        let stamps: Vec<f64> = buf.time_set().times().iter().map(|t| t.timestamp).collect();
        assert_eq!(stamps, vec![2.0, 3.0]);
        // interpolation across the cutoff still works
        assert_eq!(buf.query(&Time::new(2.5)), vec![25.0, 250.0]);
    }

    #[test]
    fn test_interpolation_stays_within_bounds_on_random_series() {
        let mut rng = rand::thread_rng();
        let mut buf = LinearBuffer::new();
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for i in 0..50 {
            let v: f64 = rng.gen_range(-100.0..100.0);
            lo = lo.min(v);
            hi = hi.max(v);
            buf.accept(Time::new(i as f64), vec![v]);
        }
        for _ in 0..200 {
            let at = Time::new(rng.gen_range(-5.0..55.0));
            let row = buf.query(&at);
            assert_eq!(row.len(), 1);
            assert!(row[0] >= lo - 1e-9 && row[0] <= hi + 1e-9);
        }
    }
}
