//! Exchange ports: the producer/consumer endpoints of the dataflow graph
//!
//! Ownership discipline: a component owns its ports, an output owns the
//! adapted-output chain stacked on it, and every back-reference (consumer,
//! provider, adaptee, component) is a [`Weak`] observation handle resolved
//! at use time. Expired handles are treated as absent and pruned.

mod input;
mod output;


pub use input::InputPort;
pub use output::OutputPort;

use crate::component::ComponentWeak;
use crate::compat;
use crate::error::ExchangeResult;
use crate::event::Listener;
use crate::identity::Describable;
use crate::quantity::ValueDefinition;
use crate::spatial::ElementSet;
use crate::temporal::{Time, TimeSet};
use crate::values::ValueSet;
use std::rc::{Rc, Weak};

/// Bounded in time: exposes the covered horizon
pub trait TimeBounded {
    /// The time span this item can currently deliver or accept
    fn time_extent(&self) -> Option<TimeSet>;

    /// End of the available horizon
    fn curr_time(&self) -> Option<Time> {
        self.time_extent()
            .and_then(|t| t.horizon_end())
            .map(Time::new)
    }
}

/// Bounded in space: exposes the spatial domain
pub trait SpatiallyBounded {
    fn spatial_definition(&self) -> Option<Rc<ElementSet>>;
}

/// A named, describable data port
pub trait ExchangeItem: Describable + TimeBounded + SpatiallyBounded {
    fn value_definition(&self) -> Option<ValueDefinition>;

    fn time_set(&self) -> Option<TimeSet>;
    fn set_time_set(&self, times: TimeSet);

    fn element_set(&self) -> Option<Rc<ElementSet>>;
    fn set_element_set(&self, elements: Rc<ElementSet>);

    /// Current value set; for an adapted output this pulls upstream
    fn get_values(&self) -> ExchangeResult<ValueSet>;

    /// Replace the value buffer and notify listeners
    fn set_values(&self, values: ValueSet);

    fn add_listener(&self, key: &str, listener: Listener);
    fn remove_listener(&self, key: &str);

    /// Release every reference and clear listeners; idempotent, and the
    /// item must not be used afterwards (precondition violation, not a
    /// handled state)
    fn reset(&self);
}

/// Producer side of an exchange link
pub trait Output: ExchangeItem {
    /// Registered consumers (weak; expired entries may linger until pruned)
    fn consumers(&self) -> Vec<InputWeak>;

    /// Register a consumer after compatibility checks; re-adding the same
    /// reference is a no-op. Counterpart registration happens in
    /// [`connect`].
    fn add_consumer(&self, consumer: &InputRef) -> ExchangeResult<()>;

    /// Drop a consumer by identity
    fn remove_consumer(&self, consumer: &InputRef);

    /// The adapted outputs stacked on this port (owned)
    fn adapted_outputs(&self) -> Vec<AdaptedOutputRef>;

    /// Attach an adapted output; re-attaching the same instance is a no-op
    fn add_adapted_output(&self, adaptor: AdaptedOutputRef) -> ExchangeResult<()>;

    fn remove_adapted_output(&self, adaptor: &AdaptedOutputRef);

    /// Cascade refresh into stacked adaptors that have live consumers or
    /// further adaptors of their own
    fn refresh_adapted_outputs(&self) -> ExchangeResult<()>;

    /// Whether this output transforms another output's values
    fn is_adapted(&self) -> bool {
        false
    }

    /// The component owning this port, if any
    fn component(&self) -> Option<ComponentWeak> {
        None
    }
}

/// Consumer side of an exchange link
pub trait Input: ExchangeItem {
    fn set_value_definition(&self, definition: ValueDefinition);

    fn providers(&self) -> Vec<OutputWeak>;

    /// Register a provider after a value-definition check; duplicate adds
    /// are no-ops. Counterpart registration happens in [`connect`].
    fn add_provider(&self, provider: &OutputRef) -> ExchangeResult<()>;

    fn remove_provider(&self, provider: &OutputRef);
}

/// Shared handle to an output port
pub type OutputRef = Rc<dyn Output>;
/// Non-owning handle to an output port
pub type OutputWeak = Weak<dyn Output>;
/// Shared handle to an input port
pub type InputRef = Rc<dyn Input>;
/// Non-owning handle to an input port
pub type InputWeak = Weak<dyn Input>;
/// Shared handle to an adapted output
pub type AdaptedOutputRef = Rc<dyn crate::adapt::AdaptedOutput>;

/// Wire a provider to a consumer, registering each side with the other
///
/// Fails without touching either port when the pair is not connectable;
/// callers then insert an adaptor or abort the composition.
pub fn connect(provider: &OutputRef, consumer: &InputRef) -> ExchangeResult<()> {
    compat::check_provider_consumer_connectable(provider.as_ref(), consumer.as_ref())?;
    provider.add_consumer(consumer)?;
    consumer.add_provider(provider)?;
    tracing::debug!(provider = provider.id(), consumer = consumer.id(), "ports connected");
    Ok(())
}

/// Detach a provider/consumer pair on both sides
pub fn disconnect(provider: &OutputRef, consumer: &InputRef) {
    provider.remove_consumer(consumer);
    consumer.remove_provider(provider);
    tracing::debug!(provider = provider.id(), consumer = consumer.id(), "ports disconnected");
}

pub(crate) fn contains_input(list: &[InputWeak], candidate: &InputRef) -> bool {
    let candidate = Rc::downgrade(candidate);
    list.iter().any(|weak| weak.ptr_eq(&candidate))
}

pub(crate) fn remove_input(list: &mut Vec<InputWeak>, candidate: &InputRef) {
    let candidate = Rc::downgrade(candidate);
    list.retain(|weak| weak.strong_count() > 0 && !weak.ptr_eq(&candidate));
}

pub(crate) fn contains_adaptor(list: &[AdaptedOutputRef], candidate: &AdaptedOutputRef) -> bool {
    list.iter().any(|a| Rc::ptr_eq(a, candidate))
}

pub(crate) fn contains_output(list: &[OutputWeak], candidate: &OutputRef) -> bool {
    let candidate = Rc::downgrade(candidate);
    list.iter().any(|weak| weak.ptr_eq(&candidate))
}

pub(crate) fn remove_output(list: &mut Vec<OutputWeak>, candidate: &OutputRef) {
    let candidate = Rc::downgrade(candidate);
    list.retain(|weak| weak.strong_count() > 0 && !weak.ptr_eq(&candidate));
}
