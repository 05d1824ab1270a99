//! Adaptor that buffers and resamples values over time

use super::{AdaptedOutput, AdaptorCore};
use crate::arguments::Argument;
use crate::compat;
use crate::component::ComponentWeak;
use crate::error::{ExchangeError, ExchangeResult};
use crate::event::Listener;
use crate::identity::Describable;
use crate::kernel::{LinearBuffer, TimeBuffer};
use crate::port::{
    AdaptedOutputRef, ExchangeItem, InputPort, InputRef, InputWeak, Output, OutputRef, OutputWeak,
    SpatiallyBounded, TimeBounded,
};
use crate::quantity::ValueDefinition;
use crate::spatial::ElementSet;
use crate::temporal::TimeSet;
use crate::values::ValueSet;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Bridges mismatched time grids between an output and its consumers
///
/// Rows pulled from the adaptee are retained in a buffer and consumers
/// are answered by interpolating the buffered series at their own times.
/// The adaptor registers an internal query input as a consumer of the
/// adaptee, which is what drives the owning component forward when a
/// pull asks for times beyond the available horizon.
pub struct TimeAdaptor {
    core: AdaptorCore,
    buffer: RefCell<LinearBuffer>,
    query: Rc<InputPort>,
    extent: RefCell<Option<TimeSet>>,
    refreshing: Cell<bool>,
}

impl TimeAdaptor {
    pub fn new(id: impl Into<String>, adaptee: &OutputRef) -> ExchangeResult<Rc<Self>> {
        let core = AdaptorCore::new(id);
        core.set_adaptee(Some(adaptee));

        let query = InputPort::new(format!("{}.query", core.id()));
        query.set_caption(&core.caption());
        if let Some(definition) = adaptee.value_definition() {
            query.set_value_definition(definition);
        }
        if let Some(elements) = adaptee.element_set() {
            query.set_element_set(elements);
        }
        // Mirror the adaptee's current times so its trim pass keeps history
        // alive until the first pull has buffered it.
        if let Some(times) = adaptee.time_set() {
            if !times.is_empty() {
                query.set_time_set(times);
            }
        }
        let consumer: InputRef = query.clone();
        adaptee.add_consumer(&consumer)?;

        Ok(Rc::new(Self {
            core,
            buffer: RefCell::new(LinearBuffer::new()),
            query,
            extent: RefCell::new(None),
            refreshing: Cell::new(false),
        }))
    }

    /// Pull whatever the adaptee currently holds into the buffer; an
    /// adaptee that has produced nothing yet contributes nothing
    fn fill_buffer(&self) -> ExchangeResult<()> {
        let adaptee = self.core.adaptee_strong()?;
        let values = match adaptee.get_values() {
            Ok(values) => values,
            Err(ExchangeError::MissingState { .. }) => return Ok(()),
            Err(error) => return Err(error),
        };
        let Some(times) = adaptee.time_set() else {
            return Ok(());
        };
        let mut buffer = self.buffer.borrow_mut();
        for (index, time) in times.times().iter().enumerate() {
            if let Some(row) = values.row(index) {
                buffer.accept(*time, row.to_vec());
            }
        }
        Ok(())
    }
}

impl Describable for TimeAdaptor {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn caption(&self) -> String {
        self.core.caption()
    }

    fn set_caption(&self, caption: &str) {
        self.core.set_caption(caption);
    }

    fn description(&self) -> String {
        self.core.description()
    }

    fn set_description(&self, description: &str) {
        self.core.set_description(description);
    }
}

impl TimeBounded for TimeAdaptor {
    fn time_extent(&self) -> Option<TimeSet> {
        self.extent.borrow().clone()
    }
}

impl SpatiallyBounded for TimeAdaptor {
    fn spatial_definition(&self) -> Option<Rc<ElementSet>> {
        self.element_set()
    }
}

impl ExchangeItem for TimeAdaptor {
    fn value_definition(&self) -> Option<ValueDefinition> {
        self.core
            .adaptee_strong()
            .ok()
            .and_then(|a| a.value_definition())
    }

    /// The buffered times, not the adaptee's
    fn time_set(&self) -> Option<TimeSet> {
        Some(self.buffer.borrow().time_set())
    }

    fn set_time_set(&self, times: TimeSet) {
        *self.extent.borrow_mut() = Some(times);
        self.core.broadcast("time set replaced");
    }

    fn element_set(&self) -> Option<Rc<ElementSet>> {
        self.core.adaptee_strong().ok().and_then(|a| a.element_set())
    }

    fn set_element_set(&self, _elements: Rc<ElementSet>) {}

    fn get_values(&self) -> ExchangeResult<ValueSet> {
        let querier = self
            .core
            .last_consumer()
            .ok_or_else(|| ExchangeError::InvalidQuery {
                adaptor: self.core.id().to_owned(),
                querier: "none".into(),
                reason: "no consumer registered to query for".into(),
            })?;
        let query_times = match querier.time_set() {
            Some(times) if !times.is_empty() => times,
            _ => {
                return Err(ExchangeError::InvalidQuery {
                    adaptor: self.core.id().to_owned(),
                    querier: querier.id().to_owned(),
                    reason: "query specifier carries no time set".into(),
                })
            }
        };

        // Harvest what is already available before the adaptee trims rows
        // older than the new query horizon.
        self.fill_buffer()?;

        // Route the consumer's horizon through the internal query input so
        // the adaptee's update loop sees how far it has to advance.
        self.query.set_time_set(query_times.clone());
        self.fill_buffer()?;

        let definition = self
            .value_definition()
            .ok_or_else(|| ExchangeError::MissingState {
                item: self.core.id().to_owned(),
                what: "adaptee value definition".into(),
            })?;
        let buffer = self.buffer.borrow();
        let rows = query_times
            .times()
            .iter()
            .map(|time| buffer.query(time))
            .collect();
        drop(buffer);

        if let Some(earliest) = compat::earliest_consumer_time(self) {
            self.buffer.borrow_mut().clear_before(earliest.timestamp);
        }
        Ok(ValueSet::new(definition, rows))
    }

    /// Push rows straight into the buffer, paired with the buffered
    /// stamps in order; an empty buffer takes the adaptee's current
    /// stamps instead, since that is where fresh rows originate
    fn set_values(&self, values: ValueSet) {
        let times = {
            let buffered = self.buffer.borrow().time_set();
            if buffered.is_empty() {
                self.core
                    .adaptee_strong()
                    .ok()
                    .and_then(|a| a.time_set())
                    .unwrap_or_default()
            } else {
                buffered
            }
        };
        let mut buffer = self.buffer.borrow_mut();
        for (time, row) in times.times().iter().zip(values.rows()) {
            buffer.accept(*time, row.to_vec());
        }
        self.core.broadcast("value set replaced");
    }

    fn add_listener(&self, key: &str, listener: Listener) {
        self.core.add_listener(key, listener);
    }

    fn remove_listener(&self, key: &str) {
        self.core.remove_listener(key);
    }

    fn reset(&self) {
        if let Ok(adaptee) = self.core.adaptee_strong() {
            let consumer: InputRef = self.query.clone();
            adaptee.remove_consumer(&consumer);
        }
        *self.buffer.borrow_mut() = LinearBuffer::new();
        *self.extent.borrow_mut() = None;
        self.query.reset();
        self.core.release();
    }
}

impl Output for TimeAdaptor {
    fn consumers(&self) -> Vec<InputWeak> {
        self.core.consumers()
    }

    fn add_consumer(&self, consumer: &InputRef) -> ExchangeResult<()> {
        self.core.add_consumer(self, consumer)
    }

    fn remove_consumer(&self, consumer: &InputRef) {
        self.core.remove_consumer(consumer);
    }

    fn adapted_outputs(&self) -> Vec<AdaptedOutputRef> {
        self.core.adapted_outputs()
    }

    fn add_adapted_output(&self, adaptor: AdaptedOutputRef) -> ExchangeResult<()> {
        self.core.add_adapted_output(adaptor)
    }

    fn remove_adapted_output(&self, adaptor: &AdaptedOutputRef) {
        self.core.remove_adapted_output(adaptor);
    }

    fn refresh_adapted_outputs(&self) -> ExchangeResult<()> {
        self.core.refresh_stacked()
    }

    fn is_adapted(&self) -> bool {
        true
    }

    fn component(&self) -> Option<ComponentWeak> {
        self.core.adaptee_strong().ok().and_then(|a| a.component())
    }
}

impl AdaptedOutput for TimeAdaptor {
    fn as_output(self: Rc<Self>) -> OutputRef {
        self
    }

    fn adaptee(&self) -> Option<OutputWeak> {
        self.core.adaptee()
    }

    fn set_adaptee(&self, adaptee: Option<&OutputRef>) {
        self.core.set_adaptee(adaptee);
    }

    fn initialize(&self) -> ExchangeResult<()> {
        *self.buffer.borrow_mut() = LinearBuffer::new();
        Ok(())
    }

    /// Push-style entry invoked while the owning component is producing;
    /// re-entrant calls triggered by the buffer fill are absorbed
    fn refresh(&self) -> ExchangeResult<()> {
        if self.refreshing.get() {
            return Ok(());
        }
        self.refreshing.set(true);
        let result = self.fill_buffer().and_then(|_| self.core.refresh_stacked());
        self.refreshing.set(false);
        result
    }

    fn arguments(&self) -> Vec<Argument> {
        self.core.arguments()
    }

    fn set_arguments(&self, arguments: Vec<Argument>) -> ExchangeResult<()> {
        self.core.set_arguments(arguments);
        Ok(())
    }
}
