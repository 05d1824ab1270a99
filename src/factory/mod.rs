//! Adaptation factories: discover and instantiate adapted outputs
//!
//! A factory answers two questions: which adaptation methods apply between
//! a producer and an (optional) target consumer, and how to build the
//! adaptor behind a method id. Created adaptors are attached to the
//! adaptee's chain before they are handed back.

mod space;
mod time;

pub use space::SpaceAdaptedOutputFactory;
pub use time::TimeAdaptedOutputFactory;

use crate::error::ExchangeResult;
use crate::identity::{Describable, Identifier};
use crate::port::{AdaptedOutputRef, InputRef, OutputRef};

/// Common surface of the spatial and temporal factories
pub trait AdaptedOutputFactory: Describable {
    /// Method identifiers applicable between `adaptee` and `target`;
    /// target-independent methods are listed even without a target
    fn available_adapted_output_ids(
        &self,
        adaptee: &OutputRef,
        target: Option<&InputRef>,
    ) -> Vec<Identifier>;

    /// Build (or for caching factories, look up) the adaptor behind
    /// `adapted_output_id` and attach it to the adaptee's chain
    fn create_adapted_output(
        &self,
        adapted_output_id: &str,
        adaptee: &OutputRef,
        target: Option<&InputRef>,
    ) -> ExchangeResult<AdaptedOutputRef>;
}
