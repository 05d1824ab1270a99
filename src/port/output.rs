//! Concrete output port backed by a value buffer and an owning component

use super::{
    contains_adaptor, contains_input, remove_input, AdaptedOutputRef, ExchangeItem, InputRef,
    InputWeak, Output, SpatiallyBounded, TimeBounded,
};
use crate::adapt::AdaptedOutput;
use crate::compat;
use crate::component::{ComponentRef, ComponentStatus, ComponentWeak, TimedRow};
use crate::error::{ExchangeError, ExchangeResult};
use crate::event::{EventBroadcast, ExchangeEvent, Listener};
use crate::identity::Describable;
use crate::quantity::ValueDefinition;
use crate::spatial::ElementSet;
use crate::temporal::{Time, TimeSet};
use crate::values::ValueSet;
use std::cell::RefCell;
use std::rc::Rc;

/// Output port of a component
///
/// Pull driven: [`ExchangeItem::get_values`] advances the owning component
/// until the latest consumer horizon is covered, refreshes stacked adapted
/// outputs and trims rows no consumer can still ask for.
pub struct OutputPort {
    id: String,
    caption: RefCell<String>,
    description: RefCell<String>,
    component: RefCell<Option<ComponentWeak>>,
    definition: RefCell<Option<ValueDefinition>>,
    values: RefCell<Option<ValueSet>>,
    time_set: RefCell<Option<TimeSet>>,
    element_set: RefCell<Option<Rc<ElementSet>>>,
    consumers: RefCell<Vec<InputWeak>>,
    adaptors: RefCell<Vec<AdaptedOutputRef>>,
    listeners: EventBroadcast,
}

impl OutputPort {
    pub fn new(id: impl Into<String>) -> Rc<Self> {
        let id = id.into();
        Rc::new(Self {
            caption: RefCell::new(id.clone()),
            id,
            description: RefCell::new(String::new()),
            component: RefCell::new(None),
            definition: RefCell::new(None),
            values: RefCell::new(None),
            time_set: RefCell::new(None),
            element_set: RefCell::new(None),
            consumers: RefCell::new(Vec::new()),
            adaptors: RefCell::new(Vec::new()),
            listeners: EventBroadcast::new(),
        })
    }

    /// Bind the owning component; the port keeps only a weak handle
    pub fn set_component(&self, component: &ComponentRef) {
        *self.component.borrow_mut() = Some(Rc::downgrade(component));
    }

    pub fn set_value_definition(&self, definition: ValueDefinition) {
        *self.definition.borrow_mut() = Some(definition);
    }

    fn broadcast(&self, message: &str) {
        if !self.listeners.is_empty() {
            self.listeners.emit(&ExchangeEvent::new(self.id.as_str(), message));
        }
    }

    fn available_until(&self) -> Option<f64> {
        self.time_set.borrow().as_ref().and_then(|t| t.horizon_end())
    }

    /// Append one freshly computed row, keeping times and values aligned
    fn append_row(&self, row: TimedRow) -> ExchangeResult<()> {
        {
            let mut times = self.time_set.borrow_mut();
            times.get_or_insert_with(TimeSet::default).add_time(row.time);
        }
        let mut values = self.values.borrow_mut();
        match values.as_mut() {
            Some(set) => {
                set.push_row(row.values);
                Ok(())
            }
            None => {
                let definition = self
                    .definition
                    .borrow()
                    .clone()
                    .ok_or_else(|| ExchangeError::MissingState {
                        item: self.id.clone(),
                        what: "value definition".into(),
                    })?;
                let mut set = ValueSet::empty(definition);
                set.push_row(row.values);
                *values = Some(set);
                Ok(())
            }
        }
    }

    /// Drive the owning component forward until every live consumer's
    /// horizon is covered, then cascade into stacked adaptors
    fn update(&self) -> ExchangeResult<()> {
        let Some(latest) = compat::latest_consumer_time(self) else {
            return Ok(());
        };
        let component = self.component.borrow().clone();
        if let Some(component) = component.and_then(|weak| weak.upgrade()) {
            loop {
                let status = component.borrow().status();
                let covered = self
                    .available_until()
                    .map(|end| end >= latest.timestamp)
                    .unwrap_or(false);
                if status != ComponentStatus::Updated || covered {
                    break;
                }
                let row = component.borrow_mut().advance(&self.id)?;
                match row {
                    Some(row) => {
                        self.append_row(row)?;
                        self.broadcast("component updated");
                    }
                    None => break,
                }
            }
        }
        self.refresh_adapted_outputs()
    }

    /// Drop leading rows older than the earliest time any consumer can
    /// still query; with no consumer horizon, keep only the last row
    fn reduce_values_and_times(&self, earliest: Option<Time>) {
        let mut times = self.time_set.borrow_mut();
        let Some(times) = times.as_mut() else {
            return;
        };
        if times.is_empty() {
            return;
        }
        let cutoff = match earliest {
            Some(t) => t.timestamp,
            None => match times.times().last() {
                Some(last) => last.timestamp,
                None => return,
            },
        };
        let mut values = self.values.borrow_mut();
        while times.len() > 1 {
            let front = match times.times().first() {
                Some(t) => t.timestamp,
                None => break,
            };
            if front >= cutoff {
                break;
            }
            times.remove_time(0);
            if let Some(set) = values.as_mut() {
                set.remove_first_time();
            }
        }
    }
}

impl Describable for OutputPort {
    fn id(&self) -> &str {
        &self.id
    }

    fn caption(&self) -> String {
        self.caption.borrow().clone()
    }

    fn set_caption(&self, caption: &str) {
        *self.caption.borrow_mut() = caption.to_owned();
    }

    fn description(&self) -> String {
        self.description.borrow().clone()
    }

    fn set_description(&self, description: &str) {
        *self.description.borrow_mut() = description.to_owned();
    }
}

impl TimeBounded for OutputPort {
    fn time_extent(&self) -> Option<TimeSet> {
        self.time_set.borrow().clone()
    }
}

impl SpatiallyBounded for OutputPort {
    fn spatial_definition(&self) -> Option<Rc<ElementSet>> {
        self.element_set.borrow().clone()
    }
}

impl ExchangeItem for OutputPort {
    fn value_definition(&self) -> Option<ValueDefinition> {
        let stored = self.definition.borrow().clone();
        stored.or_else(|| self.values.borrow().as_ref().map(|v| v.definition().clone()))
    }

    fn time_set(&self) -> Option<TimeSet> {
        self.time_set.borrow().clone()
    }

    fn set_time_set(&self, times: TimeSet) {
        *self.time_set.borrow_mut() = Some(times);
        self.broadcast("time set replaced");
    }

    fn element_set(&self) -> Option<Rc<ElementSet>> {
        self.element_set.borrow().clone()
    }

    fn set_element_set(&self, elements: Rc<ElementSet>) {
        *self.element_set.borrow_mut() = Some(elements);
        self.broadcast("element set replaced");
    }

    fn get_values(&self) -> ExchangeResult<ValueSet> {
        let earliest = compat::earliest_consumer_time(self);
        self.update()?;
        self.reduce_values_and_times(earliest);
        self.values
            .borrow()
            .clone()
            .ok_or_else(|| ExchangeError::MissingState {
                item: self.id.clone(),
                what: "values".into(),
            })
    }

    fn set_values(&self, values: ValueSet) {
        *self.values.borrow_mut() = Some(values);
        self.broadcast("value set replaced");
    }

    fn add_listener(&self, key: &str, listener: Listener) {
        self.listeners.attach(key, listener);
    }

    fn remove_listener(&self, key: &str) {
        self.listeners.detach(key);
    }

    fn reset(&self) {
        *self.component.borrow_mut() = None;
        *self.values.borrow_mut() = None;
        *self.time_set.borrow_mut() = None;
        *self.element_set.borrow_mut() = None;
        self.consumers.borrow_mut().clear();
        self.adaptors.borrow_mut().clear();
        self.broadcast("output item reset");
        self.listeners.clear();
    }
}

impl Output for OutputPort {
    fn consumers(&self) -> Vec<InputWeak> {
        self.consumers.borrow().clone()
    }

    fn add_consumer(&self, consumer: &InputRef) -> ExchangeResult<()> {
        {
            let mut consumers = self.consumers.borrow_mut();
            consumers.retain(|weak| weak.strong_count() > 0);
            if contains_input(&consumers, consumer) {
                return Ok(());
            }
        }
        compat::check_provider_consumer_connectable(self, consumer.as_ref())?;
        compat::check_consumers_compatible(self, consumer.as_ref())?;
        self.consumers.borrow_mut().push(Rc::downgrade(consumer));
        Ok(())
    }

    fn remove_consumer(&self, consumer: &InputRef) {
        remove_input(&mut self.consumers.borrow_mut(), consumer);
    }

    fn adapted_outputs(&self) -> Vec<AdaptedOutputRef> {
        self.adaptors.borrow().clone()
    }

    fn add_adapted_output(&self, adaptor: AdaptedOutputRef) -> ExchangeResult<()> {
        {
            let adaptors = self.adaptors.borrow();
            if contains_adaptor(&adaptors, &adaptor) {
                return Ok(());
            }
        }
        self.adaptors.borrow_mut().push(adaptor);
        Ok(())
    }

    fn remove_adapted_output(&self, adaptor: &AdaptedOutputRef) {
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

    fn refresh_adapted_outputs(&self) -> ExchangeResult<()> {
        let adaptors = self.adaptors.borrow().clone();
        for adaptor in adaptors {
            let has_work = adaptor
                .as_ref()
                .consumers()
                .iter()
                .any(|weak| weak.strong_count() > 0)
                || !adaptor.as_ref().adapted_outputs().is_empty();
            if has_work {
                adaptor.refresh()?;
            }
        }
        Ok(())
    }

    fn component(&self) -> Option<ComponentWeak> {
        self.component.borrow().clone()
    }
}
