//! Shared fixtures for the integration scenarios
//!
//! Builders for the working quantity, element sets and consumer ports,
//! plus a scripted component that hands an output port one row per
//! advance call.

#![allow(dead_code)]

use coupler::{
    Component, ComponentRef, ComponentStatus, Dimension, Element, ElementSet, ElementShape,
    ExchangeItem, ExchangeResult, InputPort, InputRef, OutputPort, OutputRef, Quantity, Time,
    TimeSet, TimedRow, Unit, ValueDefinition, ValueSet,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Route port tracing into the captured test output; repeated calls
/// are fine, only the first subscriber wins
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Discharge in m^3/s, the working quantity of most scenarios
pub fn discharge() -> ValueDefinition {
    ValueDefinition::Quantity(Quantity::new(
        Unit::new(Dimension::volume_per_time(), "m^3/s"),
        "discharge",
    ))
}

pub fn point_set(id: &str, coords: &[[f64; 2]]) -> Rc<ElementSet> {
    Rc::new(ElementSet::new(
        id,
        ElementShape::Point,
        coords
            .iter()
            .enumerate()
            .map(|(i, c)| Element::new(format!("{id}-{i}"), vec![*c]))
            .collect(),
    ))
}

fn square(id: &str, x0: f64, y0: f64, side: f64) -> Element {
    Element::new(
        id,
        vec![
            [x0, y0],
            [x0 + side, y0],
            [x0 + side, y0 + side],
            [x0, y0 + side],
        ],
    )
}

/// Two axis-aligned square catchments with areas 4 and 1
pub fn catchment_pair(id: &str) -> Rc<ElementSet> {
    Rc::new(ElementSet::new(
        id,
        ElementShape::Polygon,
        vec![
            square("west", 0.0, 0.0, 2.0),
            square("east", 10.0, 0.0, 1.0),
        ],
    ))
}

/// Scripted component handing out a fixed sequence of rows
pub struct StepComponent {
    id: String,
    status: ComponentStatus,
    pending: VecDeque<TimedRow>,
}

impl StepComponent {
    pub fn scripted(id: &str, rows: Vec<TimedRow>) -> ComponentRef {
        Rc::new(RefCell::new(Self {
            id: id.to_owned(),
            status: ComponentStatus::Updated,
            pending: rows.into(),
        }))
    }
}

impl Component for StepComponent {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> ComponentStatus {
        self.status
    }

    fn advance(&mut self, _output_id: &str) -> ExchangeResult<Option<TimedRow>> {
        match self.pending.pop_front() {
            Some(row) => Ok(Some(row)),
            None => {
                self.status = ComponentStatus::Done;
                Ok(None)
            }
        }
    }
}

/// Single-element output fed by a scripted component; the row at `t`
/// carries the value `t * 10`
pub fn scripted_output(id: &str, stamps: &[f64]) -> (OutputRef, ComponentRef) {
    let rows = stamps
        .iter()
        .map(|&t| TimedRow::new(Time::new(t), vec![t * 10.0]))
        .collect();
    let component = StepComponent::scripted(id, rows);
    let port = OutputPort::new(format!("{id}.flow"));
    port.set_value_definition(discharge());
    port.set_element_set(point_set("station", &[[0.0, 0.0]]));
    port.set_component(&component);
    (port, component)
}

/// Output preset over `elements` with one row per timestamp
pub fn preset_output(
    id: &str,
    elements: Rc<ElementSet>,
    stamps: &[f64],
    rows: Vec<Vec<f64>>,
) -> OutputRef {
    let port = OutputPort::new(id);
    port.set_value_definition(discharge());
    port.set_element_set(elements);
    port.set_time_set(TimeSet::from_timestamps(stamps));
    port.set_values(ValueSet::new(discharge(), rows));
    port
}

/// Consumer over `elements` asking at `stamps`
pub fn consumer(id: &str, elements: Rc<ElementSet>, stamps: &[f64]) -> InputRef {
    let input = InputPort::new(id);
    input.set_value_definition(discharge());
    input.set_element_set(elements);
    input.set_time_set(TimeSet::from_timestamps(stamps));
    input
}
