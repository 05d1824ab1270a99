//! The seam between exchange ports and the simulation components owning them
//!
//! A component owns its ports; a port holds only a weak back-reference to
//! its component. During a pull, the port asks the component to advance and
//! appends whatever rows the component produced; the component never writes
//! into the port directly.

use crate::error::ExchangeResult;
use crate::temporal::Time;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Lifecycle state of a linkable component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentStatus {
    Created,
    Initialized,
    Valid,
    Updating,
    /// Advanced and able to advance further
    Updated,
    Done,
    Failed,
}

/// One computed time step for a single output
#[derive(Debug, Clone, PartialEq)]
pub struct TimedRow {
    pub time: Time,
    pub values: Vec<f64>,
}

impl TimedRow {
    pub fn new(time: Time, values: Vec<f64>) -> Self {
        Self { time, values }
    }
}

/// A simulation component that produces values on its output ports
pub trait Component {
    fn id(&self) -> &str;

    fn status(&self) -> ComponentStatus;

    /// Advance one step and return the row produced for `output_id`, or
    /// `None` when the component has nothing further for that output
    fn advance(&mut self, output_id: &str) -> ExchangeResult<Option<TimedRow>>;
}

/// Shared handle to a component
pub type ComponentRef = Rc<RefCell<dyn Component>>;
/// Non-owning handle held by ports
pub type ComponentWeak = Weak<RefCell<dyn Component>>;
