//! Coupler: Exchange-Port and Adaptation Engine
//!
//! The runtime data-exchange core for coupled simulation components.
//! Components expose output and input ports; adapted outputs decorate an
//! output to bridge mismatched geometries, units and time grids between a
//! producer and its consumers.
//!
//! # Core Concepts
//!
//! - **Ports**: producer ([`OutputPort`]) and consumer ([`InputPort`])
//!   endpoints, pull driven and weakly cross-referenced
//! - **Adapted outputs**: stackable decorators (area/length scaling,
//!   spatial remapping, temporal buffering)
//! - **Factories**: discover applicable adaptation methods and build the
//!   adaptors behind them
//!
//! # Example
//!
//! ```
//! use coupler::{connect, InputPort, InputRef, OutputPort, OutputRef};
//! use coupler::{Dimension, Quantity, Unit, ValueDefinition};
//!
//! let definition = ValueDefinition::Quantity(Quantity::new(
//!     Unit::new(Dimension::volume_per_time(), "m^3/s"),
//!     "discharge",
//! ));
//! let source = OutputPort::new("river.discharge");
//! source.set_value_definition(definition.clone());
//! let sink = InputPort::new("floodplain.inflow");
//! sink.set_value_definition(definition);
//!
//! let source: OutputRef = source;
//! let sink: InputRef = sink;
//! connect(&source, &sink).unwrap();
//! ```

pub mod adapt;
pub mod arguments;
pub mod compat;
pub mod component;
pub mod error;
pub mod event;
pub mod factory;
pub mod identity;
pub mod kernel;
pub mod port;
pub mod quantity;
pub mod spatial;
pub mod temporal;
pub mod values;

pub use adapt::{AdaptedOutput, AreaAdaptor, LengthAdaptor, SpaceMapAdaptor, TimeAdaptor};
pub use arguments::{Argument, ArgumentValue};
pub use component::{Component, ComponentRef, ComponentStatus, ComponentWeak, TimedRow};
pub use error::{ExchangeError, ExchangeResult};
pub use event::{EventBroadcast, ExchangeEvent, Listener};
pub use factory::{AdaptedOutputFactory, SpaceAdaptedOutputFactory, TimeAdaptedOutputFactory};
pub use identity::{Describable, Identifier};
pub use kernel::{ElementMapper, LinearBuffer, MappingMethod, SpatialMapper, TimeBuffer};
pub use port::{
    connect, disconnect, AdaptedOutputRef, ExchangeItem, Input, InputPort, InputRef, InputWeak,
    Output, OutputPort, OutputRef, OutputWeak, SpatiallyBounded, TimeBounded,
};
pub use quantity::{Dimension, DimensionBase, Quality, Quantity, Unit, ValueDefinition};
pub use spatial::{Element, ElementSet, ElementShape};
pub use temporal::{Time, TimeSet, TIME_EPSILON};
pub use values::ValueSet;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
