//! Adaptor that multiplies values by the polygon area of each element

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

const AREA_EXPONENT: &str = "AreaExponent";

/// Scales each element value by `area^exponent`
///
/// The adaptee must expose a polygon element set and a quantity value
/// definition. The exposed quantity is derived from the adaptee's by
/// raising the length dimension accordingly, so a flux per square metre
/// multiplied by area comes out as a plain flux.
pub struct AreaAdaptor {
    core: AdaptorCore,
    factors: RefCell<Vec<f64>>,
    derived: RefCell<Option<Quantity>>,
}

impl AreaAdaptor {
    pub fn new(id: impl Into<String>, adaptee: &OutputRef) -> ExchangeResult<Rc<Self>> {
        let core = AdaptorCore::new(id);
        check_polygon_quantity_adaptee(core.id(), adaptee)?;
        core.set_adaptee(Some(adaptee));
        core.set_arguments(vec![Argument::real(AREA_EXPONENT, 1.0)
            .with_description("power applied to the element area factor")]);
        let adaptor = Rc::new(Self {
            core,
            factors: RefCell::new(Vec::new()),
            derived: RefCell::new(None),
        });
        adaptor.initialize()?;
        Ok(adaptor)
    }

    fn exponent(&self) -> f64 {
        self.core.real_argument(AREA_EXPONENT, 1.0)
    }

    fn calculate_factors(&self, elements: &ElementSet) {
        let exponent = self.exponent();
        let factors = elements
            .areas()
            .into_iter()
            .map(|area| {
                if exponent == 1.0 {
                    area
                } else if exponent == -1.0 {
                    1.0 / area
                } else {
                    area.powf(exponent)
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
            dimension.power(DimensionBase::Length) + 2.0 * exponent,
        );
        let unit_suffix = format!(" * m^{}", 2.0 * exponent);
        let quantity_suffix = format!(" * area^{}", exponent);
        let unit = Unit::new(dimension, format!("{}{}", source.unit.caption, unit_suffix))
            .with_description(format!("{}{}", source.unit.description, unit_suffix))
            .with_conversion(source.unit.conversion_to_si, source.unit.offset_to_si);
        let derived = Quantity::new(unit, format!("{}{}", source.caption, quantity_suffix))
            .with_description(format!("{}{}", source.description, quantity_suffix))
            .with_missing_value(source.missing_value);
        *self.derived.borrow_mut() = Some(derived);
    }
}

impl Describable for AreaAdaptor {
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

impl TimeBounded for AreaAdaptor {
    fn time_extent(&self) -> Option<TimeSet> {
        self.time_set()
    }
}

impl SpatiallyBounded for AreaAdaptor {
    fn spatial_definition(&self) -> Option<Rc<ElementSet>> {
        self.element_set()
    }
}

impl ExchangeItem for AreaAdaptor {
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

impl Output for AreaAdaptor {
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

impl AdaptedOutput for AreaAdaptor {
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

/// Shared adaptee validation for the measure-scaling adaptors
pub(super) fn check_polygon_quantity_adaptee(id: &str, adaptee: &OutputRef) -> ExchangeResult<()> {
    check_shaped_quantity_adaptee(id, adaptee, ElementShape::Polygon)
}

pub(super) fn check_shaped_quantity_adaptee(
    id: &str,
    adaptee: &OutputRef,
    shape: ElementShape,
) -> ExchangeResult<()> {
    let elements = adaptee
        .element_set()
        .ok_or_else(|| ExchangeError::UnsupportedAdaptee {
            adaptor: id.to_owned(),
            reason: "adaptee has no element set".into(),
        })?;
    if elements.shape != shape {
        return Err(ExchangeError::UnsupportedAdaptee {
            adaptor: id.to_owned(),
            reason: format!("adaptee elements must be {:?}s", shape),
        });
    }
    match adaptee.value_definition() {
        Some(def) if def.as_quantity().is_some() => Ok(()),
        _ => Err(ExchangeError::UnsupportedAdaptee {
            adaptor: id.to_owned(),
            reason: "value definition must be a quantity".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::OutputPort;
    use crate::quantity::Dimension;
    use crate::spatial::Element;
    use crate::temporal::TimeSet;

    fn unit_square_set() -> Rc<ElementSet> {
        let square = Element::new(
            "sq",
            vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]],
        );
        Rc::new(ElementSet::new("squares", ElementShape::Polygon, vec![square]))
    }

    fn rainfall_output() -> OutputRef {
        let port = OutputPort::new("rainfall");
        port.set_value_definition(ValueDefinition::Quantity(Quantity::new(
            Unit::new(Dimension::length_per_time(), "m/s"),
            "rainfall rate",
        )));
        port.set_element_set(unit_square_set());
        port.set_time_set(TimeSet::from_timestamps(&[0.0]));
        port.set_values(ValueSet::new(
            ValueDefinition::Quantity(Quantity::new(
                Unit::new(Dimension::length_per_time(), "m/s"),
                "rainfall rate",
            )),
            vec![vec![3.0]],
        ));
        port
    }

    #[test]
    fn test_values_scaled_by_polygon_area() {
        let adaptee = rainfall_output();
        let adaptor = AreaAdaptor::new("area", &adaptee).unwrap();
        let values = adaptor.get_values().unwrap();
        assert_eq!(values.row(0), Some([12.0].as_slice()));
    }

    #[test]
    fn test_exponent_argument_changes_factors() {
        let adaptee = rainfall_output();
        let adaptor = AreaAdaptor::new("area", &adaptee).unwrap();
        adaptor
            .set_arguments(vec![Argument::real(AREA_EXPONENT, -1.0)])
            .unwrap();
        let values = adaptor.get_values().unwrap();
        assert_eq!(values.row(0), Some([0.75].as_slice()));
    }

    #[test]
    fn test_derived_quantity_raises_length_power() {
        let adaptee = rainfall_output();
        let adaptor = AreaAdaptor::new("area", &adaptee).unwrap();
        let definition = adaptor.value_definition().unwrap();
        let quantity = definition.as_quantity().unwrap();
        assert_eq!(quantity.unit.dimension.power(DimensionBase::Length), 3.0);
        assert!(quantity.caption.ends_with(" * area^1"));
    }

    #[test]
    fn test_detach_releases_the_adaptee_link() {
        let adaptee = rainfall_output();
        let adaptor = AreaAdaptor::new("area", &adaptee).unwrap();
        let handle: AdaptedOutputRef = adaptor.clone();
        adaptee.add_adapted_output(handle.clone()).unwrap();

        adaptee.remove_adapted_output(&handle);
        assert!(adaptee.adapted_outputs().is_empty());
        assert!(adaptor.adaptee().is_none());
        assert!(matches!(
            adaptor.get_values(),
            Err(ExchangeError::MissingAdaptee(_))
        ));
    }

    #[test]
    fn test_reset_twice_leaves_adaptor_empty() {
        let adaptee = rainfall_output();
        let adaptor = AreaAdaptor::new("area", &adaptee).unwrap();
        let consumer: InputRef = {
            let input = crate::port::InputPort::new("sink");
            input.set_value_definition(adaptor.value_definition().unwrap());
            input
        };
        adaptor.add_consumer(&consumer).unwrap();

        adaptor.reset();
        adaptor.reset();
        assert!(adaptor.adaptee().is_none());
        assert!(adaptor.consumers().is_empty());
        assert!(adaptor.adapted_outputs().is_empty());
        assert!(matches!(
            adaptor.get_values(),
            Err(ExchangeError::MissingAdaptee(_))
        ));
    }

    #[test]
    fn test_point_adaptee_is_rejected() {
        let port = OutputPort::new("points");
        port.set_value_definition(ValueDefinition::Quantity(Quantity::new(
            Unit::new(Dimension::length(), "m"),
            "stage",
        )));
        port.set_element_set(Rc::new(ElementSet::new(
            "pts",
            ElementShape::Point,
            vec![Element::new("p", vec![[0.0, 0.0]])],
        )));
        let port: OutputRef = port;
        assert!(matches!(
            AreaAdaptor::new("area", &port),
            Err(ExchangeError::UnsupportedAdaptee { .. })
        ));
    }
}
