//! Spatial adaptation factory backed by a static method table

use super::AdaptedOutputFactory;
use crate::adapt::{AreaAdaptor, LengthAdaptor, SpaceMapAdaptor};
use crate::arguments::Argument;
use crate::error::{ExchangeError, ExchangeResult};
use crate::identity::{Describable, Identifier};
use crate::kernel::MappingMethod;
use crate::port::{AdaptedOutputRef, InputRef, OutputRef};
use crate::spatial::ElementShape;
use std::cell::RefCell;
use std::sync::OnceLock;
use uuid::Uuid;

const OPERATION_PREFIX: &str = "ElementOperation";
const MAPPER_PREFIX: &str = "ElementMapper";

/// One entry of the process-wide method table
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub id: String,
    pub from: ElementShape,
    pub to: ElementShape,
    /// `None` marks an operation (scaling in place), `Some` a mapping
    /// onto a target element set
    pub method: Option<MappingMethod>,
    pub description: String,
}

impl MethodDescriptor {
    fn operation(number: u16, shape: ElementShape, description: &str) -> Self {
        Self {
            id: format!("{}{}", OPERATION_PREFIX, number),
            from: shape,
            to: shape,
            method: None,
            description: description.to_owned(),
        }
    }

    fn mapping(
        number: u16,
        from: ElementShape,
        to: ElementShape,
        method: MappingMethod,
        description: &str,
    ) -> Self {
        Self {
            id: format!("{}{}", MAPPER_PREFIX, number),
            from,
            to,
            method: Some(method),
            description: description.to_owned(),
        }
    }
}

/// The immutable table; id number ranges follow the source element shape
/// (100s point, 200s polyline, 300s polygon and so on per target shape)
fn method_table() -> &'static [MethodDescriptor] {
    static TABLE: OnceLock<Vec<MethodDescriptor>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use ElementShape::{Point, Polygon, Polyline};
        use MappingMethod::{
            Distribute, Inverse, Mean, Nearest, Sum, Value, WeightedMean, WeightedSum,
        };
        vec![
            MethodDescriptor::operation(
                200,
                Polyline,
                "Polyline operation, multiply by line length",
            ),
            MethodDescriptor::operation(300, Polygon, "Polygon operation, multiply by area"),
            MethodDescriptor::mapping(100, Point, Point, Nearest, "Point-to-point Nearest"),
            MethodDescriptor::mapping(101, Point, Point, Inverse, "Point-to-point Inverse"),
            MethodDescriptor::mapping(200, Point, Polyline, Nearest, "Point-to-polyline Nearest"),
            MethodDescriptor::mapping(201, Point, Polyline, Inverse, "Point-to-polyline Inverse"),
            MethodDescriptor::mapping(300, Point, Polygon, Mean, "Point-to-polygon Mean"),
            MethodDescriptor::mapping(301, Point, Polygon, Sum, "Point-to-polygon Sum"),
            MethodDescriptor::mapping(400, Polyline, Point, Nearest, "Polyline-to-point Nearest"),
            MethodDescriptor::mapping(401, Polyline, Point, Inverse, "Polyline-to-point Inverse"),
            MethodDescriptor::mapping(
                500,
                Polyline,
                Polygon,
                WeightedMean,
                "Polyline-to-polygon Weighted Mean",
            ),
            MethodDescriptor::mapping(
                501,
                Polyline,
                Polygon,
                WeightedSum,
                "Polyline-to-polygon Weighted Sum",
            ),
            MethodDescriptor::mapping(600, Polygon, Point, Value, "Polygon-to-point Value"),
            MethodDescriptor::mapping(
                700,
                Polygon,
                Polyline,
                WeightedMean,
                "Polygon-to-polyline Weighted Mean",
            ),
            MethodDescriptor::mapping(
                701,
                Polygon,
                Polyline,
                WeightedSum,
                "Polygon-to-polyline Weighted Sum",
            ),
            MethodDescriptor::mapping(
                800,
                Polygon,
                Polygon,
                WeightedMean,
                "Polygon-to-polygon Weighted Mean",
            ),
            MethodDescriptor::mapping(
                801,
                Polygon,
                Polygon,
                WeightedSum,
                "Polygon-to-polygon Weighted Sum",
            ),
            MethodDescriptor::mapping(
                802,
                Polygon,
                Polygon,
                Distribute,
                "Polygon-to-polygon Distribute",
            ),
        ]
    })
}

/// Factory for the spatial adaptors (scaling operations and mappings)
pub struct SpaceAdaptedOutputFactory {
    id: String,
    caption: RefCell<String>,
    description: RefCell<String>,
}

impl SpaceAdaptedOutputFactory {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            caption: RefCell::new(id.clone()),
            id,
            description: RefCell::new(String::new()),
        }
    }

    /// Lookup by method id; unknown ids do not belong to this factory
    pub fn find_method(id: &str) -> ExchangeResult<&'static MethodDescriptor> {
        method_table()
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ExchangeError::UnknownAdaptorId(id.to_owned()))
    }

    pub fn has_id(id: &str) -> bool {
        method_table().iter().any(|m| m.id == id)
    }

    /// Applicable method ids for a `(source, target)` shape pair, without
    /// needing live ports
    pub fn available_methods(source: ElementShape, target: ElementShape) -> Vec<Identifier> {
        method_table()
            .iter()
            .filter(|m| {
                m.from == source && (m.method.is_none() || m.to == target)
            })
            .map(|m| Identifier::new(m.id.as_str()).with_description(m.description.as_str()))
            .collect()
    }

    pub fn adapted_output_description(id: &str) -> ExchangeResult<Identifier> {
        let method = Self::find_method(id)?;
        Ok(Identifier::new(method.id.as_str()).with_description(method.description.as_str()))
    }

    /// Describes a method as a flat argument list for configuration UIs
    pub fn adapter_arguments(id: &str) -> ExchangeResult<Vec<Argument>> {
        let method = Self::find_method(id)?;
        let mut arguments = vec![
            Argument::text("Caption", method.id.as_str()),
            Argument::text("Description", method.description.as_str()),
            Argument::text(
                "Type",
                if method.method.is_some() {
                    "SpatialMapping"
                } else {
                    "SpatialOperation"
                },
            ),
            Argument::text("FromElementType", format!("{:?}", method.from)),
        ];
        if method.method.is_some() {
            arguments.push(Argument::text("ToElementType", format!("{:?}", method.to)));
        }
        Ok(arguments)
    }

    pub fn mapping_method(id: &str) -> ExchangeResult<Option<MappingMethod>> {
        Ok(Self::find_method(id)?.method)
    }

    pub fn to_element_shape(id: &str) -> ExchangeResult<ElementShape> {
        Ok(Self::find_method(id)?.to)
    }
}

impl Default for SpaceAdaptedOutputFactory {
    fn default() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

impl Describable for SpaceAdaptedOutputFactory {
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

impl AdaptedOutputFactory for SpaceAdaptedOutputFactory {
    fn available_adapted_output_ids(
        &self,
        adaptee: &OutputRef,
        target: Option<&InputRef>,
    ) -> Vec<Identifier> {
        let Some(source) = adaptee.element_set() else {
            return Vec::new();
        };
        let mut methods: Vec<Identifier> = method_table()
            .iter()
            .filter(|m| m.method.is_none() && m.from == source.shape)
            .map(|m| Identifier::new(m.id.as_str()).with_description(m.description.as_str()))
            .collect();

        let Some(target_set) = target.and_then(|t| t.element_set()) else {
            return methods;
        };
        methods.extend(
            method_table()
                .iter()
                .filter(|m| {
                    m.method.is_some() && m.from == source.shape && m.to == target_set.shape
                })
                .map(|m| Identifier::new(m.id.as_str()).with_description(m.description.as_str())),
        );
        methods
    }

    fn create_adapted_output(
        &self,
        adapted_output_id: &str,
        adaptee: &OutputRef,
        target: Option<&InputRef>,
    ) -> ExchangeResult<AdaptedOutputRef> {
        let method = Self::find_method(adapted_output_id)?;

        let adaptor: AdaptedOutputRef = match method.method {
            Some(mapping) => {
                let target_set = target
                    .and_then(|t| t.element_set())
                    .ok_or_else(|| ExchangeError::InvalidTarget(method.id.clone()))?;
                SpaceMapAdaptor::new(&method.id, mapping, adaptee, target_set)?
            }
            None if method.id == format!("{}200", OPERATION_PREFIX) => {
                LengthAdaptor::new(method.id.as_str(), adaptee)?
            }
            None => AreaAdaptor::new(method.id.as_str(), adaptee)?,
        };

        adaptee.add_adapted_output(adaptor.clone())?;
        tracing::debug!(adaptor = adaptor.id(), adaptee = adaptee.id(), "adaptor attached");
        Ok(adaptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ids_are_unique() {
        let table = method_table();
        for (i, a) in table.iter().enumerate() {
            for b in &table[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_operations_ignore_target_shape() {
        let ids = SpaceAdaptedOutputFactory::available_methods(
            ElementShape::Polygon,
            ElementShape::Point,
        );
        let ids: Vec<&str> = ids.iter().map(|i| i.id.as_str()).collect();
        assert!(ids.contains(&"ElementOperation300"));
        assert!(ids.contains(&"ElementMapper600"));
        assert!(!ids.contains(&"ElementOperation200"));
    }

    #[test]
    fn test_point_to_polygon_lists_mean_and_sum_only() {
        let ids = SpaceAdaptedOutputFactory::available_methods(
            ElementShape::Point,
            ElementShape::Polygon,
        );
        let ids: Vec<&str> = ids.iter().map(|i| i.id.as_str()).collect();
        assert!(ids.contains(&"ElementMapper300"));
        assert!(ids.contains(&"ElementMapper301"));
        assert!(!ids.contains(&"ElementMapper200"));
        assert!(!ids.contains(&"ElementMapper100"));
    }

    #[test]
    fn test_unknown_id_is_refused() {
        assert!(matches!(
            SpaceAdaptedOutputFactory::find_method("ElementMapper999"),
            Err(ExchangeError::UnknownAdaptorId(_))
        ));
        assert!(!SpaceAdaptedOutputFactory::has_id("bogus"));
    }

    #[test]
    fn test_adapter_arguments_distinguish_operations_from_mappings() {
        let operation = SpaceAdaptedOutputFactory::adapter_arguments("ElementOperation300").unwrap();
        assert!(operation
            .iter()
            .any(|a| a.key == "Type" && a.value.as_text() == Some("SpatialOperation")));
        assert!(!operation.iter().any(|a| a.key == "ToElementType"));

        let mapping = SpaceAdaptedOutputFactory::adapter_arguments("ElementMapper800").unwrap();
        assert!(mapping
            .iter()
            .any(|a| a.key == "Type" && a.value.as_text() == Some("SpatialMapping")));
        assert!(mapping.iter().any(|a| a.key == "ToElementType"));
    }
}
