//! Concrete input port that aggregates values from its providers

use super::{
    contains_output, remove_output, ExchangeItem, Input, OutputRef, OutputWeak, SpatiallyBounded,
    TimeBounded,
};
use crate::compat;
use crate::error::{ExchangeError, ExchangeResult};
use crate::event::{EventBroadcast, ExchangeEvent, Listener};
use crate::identity::Describable;
use crate::quantity::ValueDefinition;
use crate::spatial::ElementSet;
use crate::temporal::TimeSet;
use crate::values::ValueSet;
use std::cell::RefCell;
use std::rc::Rc;

/// Input port of a component
///
/// [`ExchangeItem::get_values`] pulls every live provider and sums the
/// non-missing contributions into the port's own time/element frame, so a
/// consumer fed by several upstream sources sees one accumulated set.
pub struct InputPort {
    id: String,
    caption: RefCell<String>,
    description: RefCell<String>,
    definition: RefCell<Option<ValueDefinition>>,
    values: RefCell<Option<ValueSet>>,
    time_set: RefCell<Option<TimeSet>>,
    element_set: RefCell<Option<Rc<ElementSet>>>,
    providers: RefCell<Vec<OutputWeak>>,
    listeners: EventBroadcast,
}

impl InputPort {
    pub fn new(id: impl Into<String>) -> Rc<Self> {
        let id = id.into();
        Rc::new(Self {
            caption: RefCell::new(id.clone()),
            id,
            description: RefCell::new(String::new()),
            definition: RefCell::new(None),
            values: RefCell::new(None),
            time_set: RefCell::new(None),
            element_set: RefCell::new(None),
            providers: RefCell::new(Vec::new()),
            listeners: EventBroadcast::new(),
        })
    }

    pub fn set_value_definition(&self, definition: ValueDefinition) {
        *self.definition.borrow_mut() = Some(definition);
    }

    fn broadcast(&self, message: &str) {
        if !self.listeners.is_empty() {
            self.listeners.emit(&ExchangeEvent::new(self.id.as_str(), message));
        }
    }

    /// Fold provider value sets into the port's own frame, skipping
    /// missing-value markers so absent data never pollutes the sum
    fn accept_values(&self, incoming: Vec<ValueSet>) -> ExchangeResult<()> {
        let times = self.time_set.borrow().as_ref().map(|t| t.len()).unwrap_or(0);
        let elements = self
            .element_set
            .borrow()
            .as_ref()
            .map(|e| e.element_count())
            .unwrap_or(0);
        let definition = self
            .definition
            .borrow()
            .clone()
            .or_else(|| incoming.first().map(|v| v.definition().clone()))
            .ok_or_else(|| ExchangeError::MissingState {
                item: self.id.clone(),
                what: "value definition".into(),
            })?;
        let mut accumulated = ValueSet::empty(definition);
        for t in 0..times {
            for e in 0..elements {
                let mut sum = 0.0;
                for set in &incoming {
                    let Some(value) = set.value(t, e) else {
                        continue;
                    };
                    if let Some(missing) = set.definition().missing_value() {
                        if value == missing {
                            continue;
                        }
                    }
                    sum += value;
                }
                accumulated.set_or_add(t, e, sum);
            }
        }
        *self.values.borrow_mut() = Some(accumulated);
        Ok(())
    }

    fn update(&self) -> ExchangeResult<()> {
        let providers = self.providers.borrow().clone();
        let mut incoming = Vec::new();
        for provider in providers.iter().filter_map(|weak| weak.upgrade()) {
            incoming.push(provider.get_values()?);
        }
        self.accept_values(incoming)
    }
}

impl Describable for InputPort {
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

impl TimeBounded for InputPort {
    fn time_extent(&self) -> Option<TimeSet> {
        self.time_set.borrow().clone()
    }
}

impl SpatiallyBounded for InputPort {
    fn spatial_definition(&self) -> Option<Rc<ElementSet>> {
        self.element_set.borrow().clone()
    }
}

impl ExchangeItem for InputPort {
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
        self.update()?;
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
        *self.values.borrow_mut() = None;
        *self.time_set.borrow_mut() = None;
        *self.element_set.borrow_mut() = None;
        self.providers.borrow_mut().clear();
        self.broadcast("input item reset");
        self.listeners.clear();
    }
}

impl Input for InputPort {
    fn set_value_definition(&self, definition: ValueDefinition) {
        InputPort::set_value_definition(self, definition)
    }

    fn providers(&self) -> Vec<OutputWeak> {
        self.providers.borrow().clone()
    }

    fn add_provider(&self, provider: &OutputRef) -> ExchangeResult<()> {
        {
            let mut providers = self.providers.borrow_mut();
            providers.retain(|weak| weak.strong_count() > 0);
            if contains_output(&providers, provider) {
                return Ok(());
            }
        }
        if !compat::value_definitions_fit(provider.as_ref(), self) {
            return Err(ExchangeError::IncompatibleConnection {
                provider: provider.id().to_owned(),
                consumer: self.id.clone(),
                reason: "value definitions differ".into(),
            });
        }
        self.providers.borrow_mut().push(Rc::downgrade(provider));
        Ok(())
    }

    fn remove_provider(&self, provider: &OutputRef) {
        remove_output(&mut self.providers.borrow_mut(), provider);
    }
}
