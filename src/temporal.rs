//! Time stamps, spans and time sets over which exchanged values are defined

use serde::{Deserialize, Serialize};

/// Comparison tolerance for timestamps, one microsecond in days
pub const TIME_EPSILON: f64 = 1.0e-6 / 24.0 / 3600.0;

/// A time stamp with an optional duration, in fractional days
///
/// A zero duration marks an instant; a positive duration marks a span
/// starting at `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Time {
    pub timestamp: f64,
    pub duration: f64,
}

impl Time {
    /// Create an instant
    pub fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            duration: 0.0,
        }
    }

    /// Create a span
    pub fn with_duration(timestamp: f64, duration: f64) -> Self {
        Self {
            timestamp,
            duration,
        }
    }

    /// End of the span (equals `timestamp` for instants)
    pub fn end(&self) -> f64 {
        self.timestamp + self.duration
    }

    /// Tolerant timestamp equality
    pub fn equals(&self, other: &Time) -> bool {
        (self.timestamp - other.timestamp).abs() < TIME_EPSILON
    }
}

/// An ordered set of time stamps or spans, with a derived time horizon
///
/// The horizon is a single [`Time`] spanning from the first stamp to the end
/// of the last one. Callers may override it for query purposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSet {
    times: Vec<Time>,
    horizon: Option<Time>,
    has_durations: bool,
}

impl TimeSet {
    /// Build a set from unordered times; sorts and derives the horizon
    pub fn from_times(mut times: Vec<Time>) -> Self {
        times.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        let has_durations = times.iter().any(|t| t.duration > 0.0);
        let mut set = Self {
            times,
            horizon: None,
            has_durations,
        };
        set.refresh_horizon();
        set
    }

    /// Build a set of instants from raw timestamps
    pub fn from_timestamps(stamps: &[f64]) -> Self {
        Self::from_times(stamps.iter().copied().map(Time::new).collect())
    }

    pub fn times(&self) -> &[Time] {
        &self.times
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn has_durations(&self) -> bool {
        self.has_durations
    }

    /// Insert a time keeping the set sorted, and refresh the horizon
    pub fn add_time(&mut self, time: Time) {
        let at = self
            .times
            .partition_point(|t| t.timestamp <= time.timestamp);
        self.times.insert(at, time);
        self.has_durations = self.has_durations || time.duration > 0.0;
        self.refresh_horizon();
    }

    /// Remove the time at `index`; out-of-range indices are ignored
    pub fn remove_time(&mut self, index: usize) {
        if index < self.times.len() {
            self.times.remove(index);
            self.refresh_horizon();
        }
    }

    /// The single span covering all times, if any
    pub fn horizon(&self) -> Option<Time> {
        self.horizon
    }

    /// Override the derived horizon (used by query specifiers)
    pub fn set_horizon(&mut self, horizon: Time) {
        self.horizon = Some(horizon);
    }

    pub fn horizon_start(&self) -> Option<f64> {
        self.horizon.map(|h| h.timestamp)
    }

    pub fn horizon_end(&self) -> Option<f64> {
        self.horizon.map(|h| h.end())
    }

    fn refresh_horizon(&mut self) {
        self.horizon = match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => Some(Time::with_duration(
                first.timestamp,
                last.end() - first.timestamp,
            )),
            _ => None,
        };
    }
}
