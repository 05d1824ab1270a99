//! Contracts for the numerical kernels the adaptors delegate to
//!
//! The core never computes remapping or resampling itself: the space-mapping
//! adaptor hands values to a [`SpatialMapper`], the time adaptor buffers
//! through a [`TimeBuffer`]. The reference implementations here
//! ([`ElementMapper`], [`LinearBuffer`]) keep the factories executable
//! end-to-end; hosts may substitute their own kernels.

mod buffer;
mod mapper;

pub use buffer::LinearBuffer;
pub use mapper::ElementMapper;

use crate::error::ExchangeResult;
use crate::spatial::ElementSet;
use crate::temporal::{Time, TimeSet};
use crate::values::ValueSet;
use serde::{Deserialize, Serialize};

/// Named strategies for transferring values between element sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingMethod {
    Nearest,
    Inverse,
    Mean,
    Sum,
    WeightedMean,
    WeightedSum,
    Value,
    Distribute,
}

/// Spatial remapping kernel consumed by the space-mapping adaptor
pub trait SpatialMapper {
    /// Prepare the kernel for a `(method, source, target)` triple
    fn initialize(
        &mut self,
        method: MappingMethod,
        source: &ElementSet,
        target: &ElementSet,
    ) -> ExchangeResult<()>;

    /// Transform source-indexed rows into target-indexed rows
    fn map_values(&self, source: &ValueSet) -> ExchangeResult<ValueSet>;
}

/// Temporal buffering/resampling kernel consumed by the time adaptor
pub trait TimeBuffer {
    /// Record one row of element values at `time`, replacing any row already
    /// held for (epsilon-)equal time
    fn accept(&mut self, time: Time, values: Vec<f64>);

    /// Values for `at`, interpolated inside the buffered span and clamped
    /// outside it; empty when nothing is buffered
    fn query(&self, at: &Time) -> Vec<f64>;

    /// Discard buffered content no consumer can request anymore
    fn clear_before(&mut self, timestamp: f64);

    /// The times currently buffered
    fn time_set(&self) -> TimeSet;

    fn is_empty(&self) -> bool;
}
