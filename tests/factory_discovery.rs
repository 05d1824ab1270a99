//! Factory discovery and creation scenarios
//!
//! What a host sees when it asks a factory which adaptors apply between
//! two exchange items, and what create hands back: only shape-fitting
//! mapping ids, operations regardless of target, hard refusals that
//! leave the adaptee untouched, and a temporal factory that returns the
//! same cached instance for repeated creates.

mod common;

use common::{catchment_pair, consumer, point_set, preset_output};
use coupler::{
    AdaptedOutputFactory, ExchangeError, ExchangeItem, Output, SpaceAdaptedOutputFactory,
    SpatiallyBounded, TimeAdaptedOutputFactory,
};
use std::rc::Rc;

#[test]
fn test_point_to_polygon_discovery_lists_only_fitting_mappers() {
    common::init_tracing();
    let factory = SpaceAdaptedOutputFactory::default();
    let gauges = preset_output(
        "gauges",
        point_set("g", &[[0.0, 0.0], [4.0, 0.0]]),
        &[1.0],
        vec![vec![1.0, 2.0]],
    );
    let target = consumer("areas", catchment_pair("areas"), &[1.0]);

    let ids: Vec<String> = factory
        .available_adapted_output_ids(&gauges, Some(&target))
        .into_iter()
        .map(|i| i.id)
        .collect();

    assert!(ids.contains(&"ElementMapper300".to_owned()));
    assert!(ids.contains(&"ElementMapper301".to_owned()));
    // No operations exist for point sources, and the polyline mappers
    // do not fit the polygon target.
    assert!(!ids.iter().any(|id| id.starts_with("ElementOperation")));
    assert!(!ids.contains(&"ElementMapper200".to_owned()));
    assert!(!ids.contains(&"ElementMapper400".to_owned()));
}

#[test]
fn test_area_operation_scales_by_polygon_area() {
    let factory = SpaceAdaptedOutputFactory::default();
    let producer = preset_output(
        "runoff",
        catchment_pair("catchments"),
        &[1.0],
        vec![vec![3.0, 8.0]],
    );

    let adaptor = factory
        .create_adapted_output("ElementOperation300", &producer, None)
        .expect("polygon adaptee accepts the area operation");
    assert_eq!(producer.adapted_outputs().len(), 1);

    let spatial = adaptor
        .spatial_definition()
        .expect("operation keeps the adaptee geometry");
    assert_eq!(spatial.element_count(), 2);

    // [3, 8] times the element areas [4, 1].
    let values = adaptor.get_values().expect("scaled pull");
    assert_eq!(values.row(0), Some([12.0, 8.0].as_slice()));
}

#[test]
fn test_unknown_id_leaves_adaptee_untouched() {
    let factory = SpaceAdaptedOutputFactory::default();
    let producer = preset_output(
        "runoff",
        catchment_pair("catchments"),
        &[1.0],
        vec![vec![3.0, 8.0]],
    );

    let err = factory
        .create_adapted_output("ElementOperation999", &producer, None)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::UnknownAdaptorId(_)));
    assert!(producer.adapted_outputs().is_empty());
}

#[test]
fn test_mapping_without_target_is_refused() {
    let factory = SpaceAdaptedOutputFactory::default();
    let producer = preset_output(
        "runoff",
        catchment_pair("catchments"),
        &[1.0],
        vec![vec![3.0, 8.0]],
    );

    let err = factory
        .create_adapted_output("ElementMapper800", &producer, None)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidTarget(_)));
    assert!(producer.adapted_outputs().is_empty());
}

#[test]
fn test_temporal_factory_returns_cached_instance() {
    common::init_tracing();
    let factory = TimeAdaptedOutputFactory::new("time");
    let producer = preset_output(
        "stage",
        point_set("s", &[[0.0, 0.0]]),
        &[0.0, 1.0],
        vec![vec![1.0], vec![2.0]],
    );

    let first = factory.available_adapted_output_ids(&producer, None);
    let second = factory.available_adapted_output_ids(&producer, None);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, second[0].id);

    let a = factory
        .create_adapted_output(&first[0].id, &producer, None)
        .expect("first create");
    let b = factory
        .create_adapted_output(&first[0].id, &producer, None)
        .expect("second create");
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(producer.adapted_outputs().len(), 1);
}
