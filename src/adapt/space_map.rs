//! Adaptor that maps values onto a different element set

use super::{AdaptedOutput, AdaptorCore};
use crate::arguments::Argument;
use crate::component::ComponentWeak;
use crate::error::{ExchangeError, ExchangeResult};
use crate::event::Listener;
use crate::identity::Describable;
use crate::kernel::{ElementMapper, MappingMethod, SpatialMapper};
use crate::port::{
    AdaptedOutputRef, ExchangeItem, InputPort, InputRef, InputWeak, Output, OutputRef, OutputWeak,
    SpatiallyBounded, TimeBounded,
};
use crate::quantity::ValueDefinition;
use crate::spatial::ElementSet;
use crate::temporal::TimeSet;
use crate::values::ValueSet;
use std::cell::RefCell;
use std::rc::Rc;

/// Regrids the adaptee's values onto a target element set
///
/// Each pull rebuilds nothing: the mapping weights are computed once from
/// the source and target geometries, queries only apply them. The adaptor
/// keeps an internal query input mirroring the adaptee spatially, which
/// carries the active consumer's time set during a pull.
pub struct SpaceMapAdaptor {
    core: AdaptorCore,
    method: MappingMethod,
    target: Rc<ElementSet>,
    query: Rc<InputPort>,
    mapper: RefCell<ElementMapper>,
}

impl SpaceMapAdaptor {
    /// `method_id` is the factory identifier the mapping was discovered
    /// under; the adaptor id becomes `"{adaptee}->{method_id}"`
    pub fn new(
        method_id: &str,
        method: MappingMethod,
        adaptee: &OutputRef,
        target: Rc<ElementSet>,
    ) -> ExchangeResult<Rc<Self>> {
        let id = format!("{}->{}", adaptee.id(), method_id);
        let core = AdaptorCore::new(id);
        core.set_adaptee(Some(adaptee));

        let source = adaptee
            .element_set()
            .ok_or_else(|| ExchangeError::UnsupportedAdaptee {
                adaptor: core.id().to_owned(),
                reason: "adaptee has no element set".into(),
            })?;
        let mut mapper = ElementMapper::new();
        mapper.initialize(method, &source, &target)?;

        // The query item matches the adaptee on everything but the time set.
        let query = InputPort::new(core.id());
        query.set_caption(&core.caption());
        query.set_element_set(source);
        if let Some(definition) = adaptee.value_definition() {
            query.set_value_definition(definition);
        }

        Ok(Rc::new(Self {
            core,
            method,
            target,
            query,
            mapper: RefCell::new(mapper),
        }))
    }

    pub fn method(&self) -> MappingMethod {
        self.method
    }

    pub fn target(&self) -> &Rc<ElementSet> {
        &self.target
    }
}

impl Describable for SpaceMapAdaptor {
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

impl TimeBounded for SpaceMapAdaptor {
    fn time_extent(&self) -> Option<TimeSet> {
        self.time_set()
    }
}

impl SpatiallyBounded for SpaceMapAdaptor {
    /// The target set; consumers see the mapped geometry
    fn spatial_definition(&self) -> Option<Rc<ElementSet>> {
        Some(self.target.clone())
    }
}

impl ExchangeItem for SpaceMapAdaptor {
    fn value_definition(&self) -> Option<ValueDefinition> {
        self.core
            .adaptee_strong()
            .ok()
            .and_then(|a| a.value_definition())
    }

    fn time_set(&self) -> Option<TimeSet> {
        self.core.adaptee_strong().ok().and_then(|a| a.time_set())
    }

    fn set_time_set(&self, _times: TimeSet) {}

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
        self.query.set_time_set(query_times);

        let adaptee = self.core.adaptee_strong()?;
        let incoming = adaptee.get_values()?;
        self.mapper.borrow().map_values(&incoming)
    }

    fn set_values(&self, _values: ValueSet) {}

    fn add_listener(&self, key: &str, listener: Listener) {
        self.core.add_listener(key, listener);
    }

    fn remove_listener(&self, key: &str) {
        self.core.remove_listener(key);
    }

    fn reset(&self) {
        self.query.reset();
        self.core.release();
    }
}

impl Output for SpaceMapAdaptor {
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

impl AdaptedOutput for SpaceMapAdaptor {
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
        let adaptee = self.core.adaptee_strong()?;
        let source = adaptee
            .element_set()
            .ok_or_else(|| ExchangeError::UnsupportedAdaptee {
                adaptor: self.core.id().to_owned(),
                reason: "adaptee has no element set".into(),
            })?;
        self.mapper
            .borrow_mut()
            .initialize(self.method, &source, &self.target)
    }

    fn refresh(&self) -> ExchangeResult<()> {
        self.core.refresh_stacked()
    }

    fn arguments(&self) -> Vec<Argument> {
        self.core.arguments()
    }

    fn set_arguments(&self, arguments: Vec<Argument>) -> ExchangeResult<()> {
        self.core.set_arguments(arguments);
        self.initialize()
    }
}
