//! Adapted outputs: decorators that transform an output's values in flight
//!
//! An adapted output wraps an upstream output (its adaptee, held weakly)
//! and presents itself as an output again, so adaptors stack into chains.
//! The owning output keeps strong handles to the adaptors stacked on it.

mod area;
mod length;
mod space_map;
mod time;

pub use area::AreaAdaptor;
pub use length::LengthAdaptor;
pub use space_map::SpaceMapAdaptor;
pub use time::TimeAdaptor;

use crate::arguments::Argument;
use crate::compat;
use crate::error::{ExchangeError, ExchangeResult};
use crate::event::{EventBroadcast, ExchangeEvent, Listener};
use crate::identity::Describable;
use crate::port::{
    contains_adaptor, contains_input, remove_input, AdaptedOutputRef, InputRef, InputWeak, Output,
    OutputRef, OutputWeak,
};
use std::cell::RefCell;
use std::rc::Rc;

/// An output that transforms the values of another output
pub trait AdaptedOutput: Output {
    /// Upcast to the plain output handle so an adaptor can serve as the
    /// adaptee of the next adaptor in a chain
    fn as_output(self: Rc<Self>) -> OutputRef;

    /// The wrapped upstream output
    fn adaptee(&self) -> Option<OutputWeak>;

    /// Rebind (or with `None`, release) the wrapped output
    fn set_adaptee(&self, adaptee: Option<&OutputRef>);

    /// Recompute internal state after adaptee or arguments changed
    fn initialize(&self) -> ExchangeResult<()>;

    /// Push-style update invoked after the adaptee gained new values;
    /// cascades into adaptors stacked on this one
    fn refresh(&self) -> ExchangeResult<()>;

    fn arguments(&self) -> Vec<Argument>;

    /// Replace arguments and re-initialize
    fn set_arguments(&self, arguments: Vec<Argument>) -> ExchangeResult<()>;
}

impl std::fmt::Debug for dyn AdaptedOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptedOutput").field("id", &self.id()).finish()
    }
}

/// State shared by every adaptor implementation
pub(crate) struct AdaptorCore {
    id: String,
    caption: RefCell<String>,
    description: RefCell<String>,
    adaptee: RefCell<Option<OutputWeak>>,
    consumers: RefCell<Vec<InputWeak>>,
    adaptors: RefCell<Vec<AdaptedOutputRef>>,
    arguments: RefCell<Vec<Argument>>,
    listeners: EventBroadcast,
}

impl AdaptorCore {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            caption: RefCell::new(id.clone()),
            id,
            description: RefCell::new(String::new()),
            adaptee: RefCell::new(None),
            consumers: RefCell::new(Vec::new()),
            adaptors: RefCell::new(Vec::new()),
            arguments: RefCell::new(Vec::new()),
            listeners: EventBroadcast::new(),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn caption(&self) -> String {
        self.caption.borrow().clone()
    }

    pub(crate) fn set_caption(&self, caption: &str) {
        *self.caption.borrow_mut() = caption.to_owned();
    }

    pub(crate) fn description(&self) -> String {
        self.description.borrow().clone()
    }

    pub(crate) fn set_description(&self, description: &str) {
        *self.description.borrow_mut() = description.to_owned();
    }

    pub(crate) fn adaptee(&self) -> Option<OutputWeak> {
        self.adaptee.borrow().clone()
    }

    pub(crate) fn set_adaptee(&self, adaptee: Option<&OutputRef>) {
        *self.adaptee.borrow_mut() = adaptee.map(Rc::downgrade);
    }

    /// Resolve the adaptee or fail with the adaptor's id in the error
    pub(crate) fn adaptee_strong(&self) -> ExchangeResult<OutputRef> {
        self.adaptee
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .ok_or_else(|| ExchangeError::MissingAdaptee(self.id.clone()))
    }

    pub(crate) fn consumers(&self) -> Vec<InputWeak> {
        self.consumers.borrow().clone()
    }

    /// The consumer that most recently registered; adaptors use it as the
    /// query specifier for pull requests
    pub(crate) fn last_consumer(&self) -> Option<InputRef> {
        self.consumers
            .borrow()
            .iter()
            .rev()
            .find_map(|weak| weak.upgrade())
    }

    pub(crate) fn add_consumer<T>(&self, this: &T, consumer: &InputRef) -> ExchangeResult<()>
    where
        T: Output + ?Sized,
    {
        {
            let mut consumers = self.consumers.borrow_mut();
            consumers.retain(|weak| weak.strong_count() > 0);
            if contains_input(&consumers, consumer) {
                return Ok(());
            }
        }
        if !compat::value_definitions_fit(this, consumer.as_ref()) {
            return Err(ExchangeError::IncompatibleConnection {
                provider: self.id.clone(),
                consumer: consumer.id().to_owned(),
                reason: "value definitions differ".into(),
            });
        }
        compat::check_consumers_compatible(this, consumer.as_ref())?;
        self.consumers.borrow_mut().push(Rc::downgrade(consumer));
        Ok(())
    }

    pub(crate) fn remove_consumer(&self, consumer: &InputRef) {
        remove_input(&mut self.consumers.borrow_mut(), consumer);
    }

    pub(crate) fn adapted_outputs(&self) -> Vec<AdaptedOutputRef> {
        self.adaptors.borrow().clone()
    }

    pub(crate) fn add_adapted_output(&self, adaptor: AdaptedOutputRef) -> ExchangeResult<()> {
        {
            let adaptors = self.adaptors.borrow();
            if contains_adaptor(&adaptors, &adaptor) {
                return Ok(());
            }
        }
        self.adaptors.borrow_mut().push(adaptor);
        Ok(())
    }

    pub(crate) fn remove_adapted_output(&self, adaptor: &AdaptedOutputRef) {
        let removed = {
            let mut adaptors = self.adaptors.borrow_mut();
            let before = adaptors.len();
            adaptors.retain(|a| !Rc::ptr_eq(a, adaptor));
            adaptors.len() < before
        };
        // a detached adaptor must not keep pulling through its weak handle
        if removed {
            adaptor.set_adaptee(None);
        }
    }

    /// Cascade into stacked adaptors that still have observers
    pub(crate) fn refresh_stacked(&self) -> ExchangeResult<()> {
        let adaptors = self.adaptors.borrow().clone();
        for adaptor in adaptors {
            let has_work = adaptor
                .consumers()
                .iter()
                .any(|weak| weak.strong_count() > 0)
                || !adaptor.adapted_outputs().is_empty();
            if has_work {
                adaptor.refresh()?;
            }
        }
        Ok(())
    }

    pub(crate) fn arguments(&self) -> Vec<Argument> {
        self.arguments.borrow().clone()
    }

    pub(crate) fn set_arguments(&self, arguments: Vec<Argument>) {
        *self.arguments.borrow_mut() = arguments;
    }

    /// Value of a real-typed argument, falling back when absent
    pub(crate) fn real_argument(&self, key: &str, default: f64) -> f64 {
        self.arguments
            .borrow()
            .iter()
            .find(|a| a.key == key)
            .and_then(|a| a.value.as_real())
            .unwrap_or(default)
    }

    pub(crate) fn add_listener(&self, key: &str, listener: Listener) {
        self.listeners.attach(key, listener);
    }

    pub(crate) fn remove_listener(&self, key: &str) {
        self.listeners.detach(key);
    }

    pub(crate) fn broadcast(&self, message: &str) {
        if !self.listeners.is_empty() {
            self.listeners.emit(&ExchangeEvent::new(self.id.as_str(), message));
        }
    }

    /// Release every link this adaptor holds; idempotent
    pub(crate) fn release(&self) {
        *self.adaptee.borrow_mut() = None;
        self.consumers.borrow_mut().clear();
        self.adaptors.borrow_mut().clear();
        self.broadcast("output item reset");
        self.listeners.clear();
    }
}
