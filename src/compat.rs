//! Connectability checks between exchange items
//!
//! Free functions rather than methods so both port implementations and
//! adaptors can run the same checks against any `dyn` item. All functions
//! are generic over unsized items, so trait objects pass straight through.

use crate::error::{ExchangeError, ExchangeResult};
use crate::identity::Describable;
use crate::port::{ExchangeItem, Input, Output};
use crate::quantity::DimensionBase;
use crate::temporal::Time;

/// Whether the provider's quantity can feed the consumer's quantity
///
/// Both items must carry a quantity definition and the unit dimensions
/// must agree on every base power. Unit scale is allowed to differ;
/// qualities never fit.
pub fn value_definitions_fit<P, C>(provider: &P, consumer: &C) -> bool
where
    P: ExchangeItem + ?Sized,
    C: ExchangeItem + ?Sized,
{
    let (Some(p_def), Some(c_def)) = (provider.value_definition(), consumer.value_definition())
    else {
        return false;
    };
    let (Some(p_quantity), Some(c_quantity)) = (p_def.as_quantity(), c_def.as_quantity()) else {
        return false;
    };
    let p_dimension = &p_quantity.unit.dimension;
    let c_dimension = &c_quantity.unit.dimension;
    DimensionBase::ALL
        .iter()
        .all(|base| p_dimension.power(*base) == c_dimension.power(*base))
}

/// Whether the consumer's required times can be served by the provider
///
/// An empty side fits only a single-step counterpart. When both sides
/// specify times, a plain output must match the consumer step for step,
/// while an adapted output only needs its horizon to cover the consumer's
/// start and end (adaptors interpolate in between).
pub fn time_sets_fit<P, C>(provider: &P, consumer: &C) -> bool
where
    P: Output + ?Sized,
    C: ExchangeItem + ?Sized,
{
    let source = provider.time_set();
    let target = consumer.time_set();

    let source_empty = source.as_ref().map(|t| t.is_empty()).unwrap_or(true);
    let target_empty = target.as_ref().map(|t| t.is_empty()).unwrap_or(true);

    if source_empty {
        return match target {
            Some(target) if !target.is_empty() => target.len() == 1,
            _ => true,
        };
    }
    if target_empty {
        return source.as_ref().map(|t| t.len()) == Some(1);
    }

    let source = match source {
        Some(s) => s,
        None => return false,
    };
    let target = match target {
        Some(t) => t,
        None => return false,
    };

    if provider.is_adapted() {
        let (Some(s_start), Some(s_end)) = (source.horizon_start(), source.horizon_end()) else {
            return false;
        };
        let (Some(t_start), Some(t_end)) = (target.horizon_start(), target.horizon_end()) else {
            return false;
        };
        // Containment test kept asymmetric on purpose: a consumer horizon
        // starting before the source start is accepted as long as its end
        // does not run past the source end.
        t_start <= s_start && t_end <= s_end
    } else {
        source.len() == target.len()
            && source
                .times()
                .iter()
                .zip(target.times())
                .all(|(s, t)| s.equals(t))
    }
}

/// Spatial extension point; every element-set pairing is currently
/// accepted and left to the adaptors to bridge
pub fn element_sets_fit<P, C>(_provider: &P, _consumer: &C) -> bool
where
    P: ExchangeItem + ?Sized,
    C: ExchangeItem + ?Sized,
{
    true
}

/// Whether the pair can be wired directly, without an adaptor in between
///
/// Only the dimensional check is enforced; the time and element hooks are
/// extension points that currently pass everything. [`time_sets_fit`]
/// stays available for compositions that want the strict algorithm.
pub fn provider_consumer_connectable<P, C>(provider: &P, consumer: &C) -> bool
where
    P: Output + ?Sized,
    C: Input + ?Sized,
{
    value_definitions_fit(provider, consumer) && element_sets_fit(provider, consumer)
}

pub fn check_provider_consumer_connectable<P, C>(provider: &P, consumer: &C) -> ExchangeResult<()>
where
    P: Output + ?Sized,
    C: Input + ?Sized,
{
    if provider_consumer_connectable(provider, consumer) {
        Ok(())
    } else {
        Err(ExchangeError::IncompatibleConnection {
            provider: provider.id().to_owned(),
            consumer: consumer.id().to_owned(),
            reason: "value definitions differ, put an adapted output in between".into(),
        })
    }
}

/// Whether a new consumer can join the provider's existing consumer set
pub fn consumers_compatible<P, C>(provider: &P, new_consumer: &C) -> bool
where
    P: Output + ?Sized,
    C: Input + ?Sized,
{
    value_definitions_fit(provider, new_consumer) && element_sets_fit(provider, new_consumer)
}

pub fn check_consumers_compatible<P, C>(provider: &P, new_consumer: &C) -> ExchangeResult<()>
where
    P: Output + ?Sized,
    C: Input + ?Sized,
{
    if consumers_compatible(provider, new_consumer) {
        Ok(())
    } else {
        Err(ExchangeError::IncompatibleConnection {
            provider: provider.id().to_owned(),
            consumer: new_consumer.id().to_owned(),
            reason: "incompatible with already registered consumers".into(),
        })
    }
}

/// Start of the earliest horizon any live consumer still needs
pub fn earliest_consumer_time<P>(provider: &P) -> Option<Time>
where
    P: Output + ?Sized,
{
    let mut earliest: Option<f64> = None;
    for consumer in provider.consumers().iter().filter_map(|weak| weak.upgrade()) {
        let Some(start) = consumer.time_set().and_then(|t| t.horizon_start()) else {
            continue;
        };
        earliest = Some(match earliest {
            Some(current) => current.min(start),
            None => start,
        });
    }
    earliest.map(Time::new)
}

/// End of the latest horizon any live consumer requires
pub fn latest_consumer_time<P>(provider: &P) -> Option<Time>
where
    P: Output + ?Sized,
{
    let mut latest: Option<f64> = None;
    for consumer in provider.consumers().iter().filter_map(|weak| weak.upgrade()) {
        let Some(end) = consumer.time_set().and_then(|t| t.horizon_end()) else {
            continue;
        };
        latest = Some(match latest {
            Some(current) => current.max(end),
            None => end,
        });
    }
    latest.map(Time::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{connect, InputPort, InputRef, OutputPort, OutputRef};
    use crate::quantity::{Quantity, Unit, ValueDefinition};
    use crate::temporal::TimeSet;
    use std::rc::Rc;

    fn discharge() -> ValueDefinition {
        ValueDefinition::Quantity(Quantity::new(
            Unit::new(crate::quantity::Dimension::volume_per_time(), "m^3/s"),
            "discharge",
        ))
    }

    fn stage() -> ValueDefinition {
        ValueDefinition::Quantity(Quantity::new(
            Unit::new(crate::quantity::Dimension::length(), "m"),
            "stage",
        ))
    }

    fn output_with(definition: ValueDefinition, stamps: &[f64]) -> Rc<OutputPort> {
        let port = OutputPort::new("out");
        port.set_value_definition(definition);
        if !stamps.is_empty() {
            port.set_time_set(TimeSet::from_timestamps(stamps));
        }
        port
    }

    fn input_with(definition: ValueDefinition, stamps: &[f64]) -> Rc<InputPort> {
        let port = InputPort::new("in");
        port.set_value_definition(definition);
        if !stamps.is_empty() {
            port.set_time_set(TimeSet::from_timestamps(stamps));
        }
        port
    }

    #[test]
    fn test_dimension_equality_drives_value_definition_fit() {
        let provider = output_with(discharge(), &[]);
        let same = input_with(discharge(), &[]);
        let other = input_with(stage(), &[]);
        assert!(value_definitions_fit(provider.as_ref(), same.as_ref()));
        assert!(!value_definitions_fit(provider.as_ref(), other.as_ref()));
    }

    #[test]
    fn test_missing_definition_never_fits() {
        let provider = OutputPort::new("out");
        let consumer = input_with(discharge(), &[]);
        assert!(!value_definitions_fit(provider.as_ref(), consumer.as_ref()));
    }

    #[test]
    fn test_empty_source_fits_single_step_target_only() {
        let provider = output_with(discharge(), &[]);
        let single = input_with(discharge(), &[3.0]);
        let multi = input_with(discharge(), &[1.0, 2.0]);
        assert!(time_sets_fit(provider.as_ref(), single.as_ref()));
        assert!(!time_sets_fit(provider.as_ref(), multi.as_ref()));
    }

    #[test]
    fn test_empty_target_needs_single_step_source() {
        let single = output_with(discharge(), &[1.0]);
        let multi = output_with(discharge(), &[1.0, 2.0]);
        let consumer = input_with(discharge(), &[]);
        assert!(time_sets_fit(single.as_ref(), consumer.as_ref()));
        assert!(!time_sets_fit(multi.as_ref(), consumer.as_ref()));
    }

    #[test]
    fn test_plain_provider_needs_pairwise_equal_times() {
        let provider = output_with(discharge(), &[1.0, 2.0, 3.0]);
        let matching = input_with(discharge(), &[1.0, 2.0, 3.0]);
        let shifted = input_with(discharge(), &[1.0, 2.0, 3.5]);
        let shorter = input_with(discharge(), &[1.0, 2.0]);
        assert!(time_sets_fit(provider.as_ref(), matching.as_ref()));
        assert!(!time_sets_fit(provider.as_ref(), shifted.as_ref()));
        assert!(!time_sets_fit(provider.as_ref(), shorter.as_ref()));
    }

    #[test]
    fn test_connect_rejects_mismatched_quantities() {
        let provider: OutputRef = output_with(discharge(), &[1.0]);
        let consumer: InputRef = input_with(stage(), &[1.0]);
        let err = connect(&provider, &consumer).unwrap_err();
        assert!(err.to_string().contains("not connectable"));
        assert!(provider.consumers().is_empty());
        assert!(consumer.providers().is_empty());
    }

    #[test]
    fn test_connect_registers_both_sides_and_is_idempotent() {
        let provider: OutputRef = output_with(discharge(), &[1.0, 2.0]);
        let consumer: InputRef = input_with(discharge(), &[1.0, 2.0]);
        connect(&provider, &consumer).unwrap();
        connect(&provider, &consumer).unwrap();
        assert_eq!(provider.consumers().len(), 1);
        assert_eq!(consumer.providers().len(), 1);
    }

    #[test]
    fn test_consumer_horizon_bounds_span_all_live_consumers() {
        let provider: OutputRef = output_with(discharge(), &[]);
        let early: InputRef = input_with(discharge(), &[0.5]);
        let late: InputRef = input_with(discharge(), &[2.0]);
        connect(&provider, &early).unwrap();
        connect(&provider, &late).unwrap();
        assert_eq!(
            earliest_consumer_time(provider.as_ref()).map(|t| t.timestamp),
            Some(0.5)
        );
        assert_eq!(
            latest_consumer_time(provider.as_ref()).map(|t| t.timestamp),
            Some(2.0)
        );
    }

    #[test]
    fn test_dropped_consumer_no_longer_bounds_the_horizon() {
        let provider: OutputRef = output_with(discharge(), &[0.0, 1.0]);
        let consumer: InputRef = input_with(discharge(), &[0.0, 1.0]);
        connect(&provider, &consumer).unwrap();
        drop(consumer);
        assert!(latest_consumer_time(provider.as_ref()).is_none());
    }
}
