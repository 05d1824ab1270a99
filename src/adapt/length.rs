//! Adaptor that multiplies values by the polyline length of each element

use super::area::check_shaped_quantity_adaptee;
use super::{AdaptedOutput, AdaptorCore};
use crate::arguments::Argument;
use crate::component::ComponentWeak;
use crate::error::{ExchangeError, ExchangeResult};
use crate::event::Listener;
use crate::identity::Describable;
use crate::port::{
    AdaptedOutputRef, ExchangeItem, InputRef, InputWeak, Output, OutputRef, OutputWeak,
    SpatiallyBounded, TimeBounded,
};
use crate::quantity::{DimensionBase, Quantity, Unit, ValueDefinition};
use crate::spatial::{ElementSet, ElementShape};
use crate::temporal::TimeSet;
use crate::values::ValueSet;
use std::cell::RefCell;
use std::rc::Rc;

const LENGTH_EXPONENT: &str = "LengthExponent";

/// Scales each element value by `length^exponent`
///
/// Counterpart of [`super::AreaAdaptor`] for polyline element sets; the
/// exposed quantity gains one length power per exponent unit.
pub struct LengthAdaptor {
    core: AdaptorCore,
    factors: RefCell<Vec<f64>>,
    derived: RefCell<Option<Quantity>>,
}

impl LengthAdaptor {
    pub fn new(id: impl Into<String>, adaptee: &OutputRef) -> ExchangeResult<Rc<Self>> {
        let core = AdaptorCore::new(id);
        check_shaped_quantity_adaptee(core.id(), adaptee, ElementShape::Polyline)?;
        core.set_adaptee(Some(adaptee));
        core.set_arguments(vec![Argument::real(LENGTH_EXPONENT, 1.0)
            .with_description("power applied to the element length factor")]);
        let adaptor = Rc::new(Self {
            core,
            factors: RefCell::new(Vec::new()),
            derived: RefCell::new(None),
        });
        adaptor.initialize()?;
        Ok(adaptor)
    }

    fn exponent(&self) -> f64 {
        self.core.real_argument(LENGTH_EXPONENT, 1.0)
    }

    fn calculate_factors(&self, elements: &ElementSet) {
        let exponent = self.exponent();
        let factors = elements
            .lengths()
            .into_iter()
            .map(|length| {
                if exponent == 1.0 {
                    length
                } else if exponent == -1.0 {
                    1.0 / length
                } else {
                    length.powf(exponent)
                }
            })
            .collect();
        *self.factors.borrow_mut() = factors;
    }

    fn update_quantity(&self, source: &Quantity) {
        let exponent = self.exponent();
        let mut dimension = source.unit.dimension.clone();
        dimension.set_power(
            DimensionBase::Length,
            dimension.power(DimensionBase::Length) + exponent,
        );
        let unit_suffix = format!(" * m^{}", exponent);
        let quantity_suffix = format!(" * length^{}", exponent);
        let unit = Unit::new(dimension, format!("{}{}", source.unit.caption, unit_suffix))
            .with_description(format!("{}{}", source.unit.description, unit_suffix))
            .with_conversion(source.unit.conversion_to_si, source.unit.offset_to_si);
        let derived = Quantity::new(unit, format!("{}{}", source.caption, quantity_suffix))
            .with_description(format!("{}{}", source.description, quantity_suffix))
            .with_missing_value(source.missing_value);
        *self.derived.borrow_mut() = Some(derived);
    }
}

impl Describable for LengthAdaptor {
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

impl TimeBounded for LengthAdaptor {
    fn time_extent(&self) -> Option<TimeSet> {
        self.time_set()
    }
}

impl SpatiallyBounded for LengthAdaptor {
    fn spatial_definition(&self) -> Option<Rc<ElementSet>> {
        self.element_set()
    }
}

impl ExchangeItem for LengthAdaptor {
    fn value_definition(&self) -> Option<ValueDefinition> {
        self.derived
            .borrow()
            .clone()
            .map(ValueDefinition::Quantity)
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
        let adaptee = self.core.adaptee_strong()?;
        let values = adaptee.get_values()?;
        values.scale_rows(&self.factors.borrow())
    }

    fn set_values(&self, _values: ValueSet) {}

    fn add_listener(&self, key: &str, listener: Listener) {
        self.core.add_listener(key, listener);
    }

    fn remove_listener(&self, key: &str) {
        self.core.remove_listener(key);
    }

    fn reset(&self) {
        self.factors.borrow_mut().clear();
        *self.derived.borrow_mut() = None;
        self.core.release();
    }
}

impl Output for LengthAdaptor {
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

impl AdaptedOutput for LengthAdaptor {
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
        let elements = adaptee
            .element_set()
            .ok_or_else(|| ExchangeError::MissingState {
                item: self.core.id().to_owned(),
                what: "adaptee element set".into(),
            })?;
        self.calculate_factors(&elements);
        let definition = adaptee
            .value_definition()
            .ok_or_else(|| ExchangeError::MissingState {
                item: self.core.id().to_owned(),
                what: "adaptee value definition".into(),
            })?;
        match definition.as_quantity() {
            Some(quantity) => {
                self.update_quantity(quantity);
                Ok(())
            }
            None => Err(ExchangeError::UnsupportedAdaptee {
                adaptor: self.core.id().to_owned(),
                reason: "value definition must be a quantity".into(),
            }),
        }
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
