//! Physical dimensions, units and quantity value definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base dimensions a unit dimension is a vector of exponents over
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DimensionBase {
    Length,
    Mass,
    Time,
    ElectricCurrent,
    Temperature,
    AmountOfSubstance,
    LuminousIntensity,
    Currency,
}

impl DimensionBase {
    /// Every base, in declaration order
    pub const ALL: [DimensionBase; 8] = [
        DimensionBase::Length,
        DimensionBase::Mass,
        DimensionBase::Time,
        DimensionBase::ElectricCurrent,
        DimensionBase::Temperature,
        DimensionBase::AmountOfSubstance,
        DimensionBase::LuminousIntensity,
        DimensionBase::Currency,
    ];
}

/// Exponent per base dimension; absent bases have power zero
///
/// For a flow in m³/s: `power(Length) == 3.0`, `power(Time) == -1.0`,
/// every other base `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    powers: BTreeMap<DimensionBase, f64>,
}

impl Dimension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(base, power)` pairs
    pub fn from_powers(pairs: &[(DimensionBase, f64)]) -> Self {
        let mut dim = Self::new();
        for (base, power) in pairs {
            dim.set_power(*base, *power);
        }
        dim
    }

    pub fn power(&self, base: DimensionBase) -> f64 {
        self.powers.get(&base).copied().unwrap_or(0.0)
    }

    pub fn set_power(&mut self, base: DimensionBase, power: f64) {
        if power == 0.0 {
            self.powers.remove(&base);
        } else {
            self.powers.insert(base, power);
        }
    }

    /// True when every base exponent matches
    pub fn equal_to(&self, other: &Dimension) -> bool {
        DimensionBase::ALL
            .iter()
            .all(|base| self.power(*base) == other.power(*base))
    }

    // Common dimensions for coupling scenarios.

    pub fn length() -> Self {
        Self::from_powers(&[(DimensionBase::Length, 1.0)])
    }

    pub fn area() -> Self {
        Self::from_powers(&[(DimensionBase::Length, 2.0)])
    }

    pub fn volume() -> Self {
        Self::from_powers(&[(DimensionBase::Length, 3.0)])
    }

    pub fn length_per_time() -> Self {
        Self::from_powers(&[(DimensionBase::Length, 1.0), (DimensionBase::Time, -1.0)])
    }

    pub fn volume_per_time() -> Self {
        Self::from_powers(&[(DimensionBase::Length, 3.0), (DimensionBase::Time, -1.0)])
    }

    pub fn mass() -> Self {
        Self::from_powers(&[(DimensionBase::Mass, 1.0)])
    }

    pub fn mass_per_time() -> Self {
        Self::from_powers(&[(DimensionBase::Mass, 1.0), (DimensionBase::Time, -1.0)])
    }
}

/// A unit of measure with its dimension and SI conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub dimension: Dimension,
    pub caption: String,
    pub description: String,
    pub conversion_to_si: f64,
    pub offset_to_si: f64,
}

impl Unit {
    pub fn new(dimension: Dimension, caption: impl Into<String>) -> Self {
        Self {
            dimension,
            caption: caption.into(),
            description: String::new(),
            conversion_to_si: 1.0,
            offset_to_si: 0.0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_conversion(mut self, factor: f64, offset: f64) -> Self {
        self.conversion_to_si = factor;
        self.offset_to_si = offset;
        self
    }
}

/// A physical quantity description: unit plus missing-data marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub unit: Unit,
    pub caption: String,
    pub description: String,
    /// Value marking an absent slot in a value set
    pub missing_value: f64,
}

impl Quantity {
    pub fn new(unit: Unit, caption: impl Into<String>) -> Self {
        Self {
            unit,
            caption: caption.into(),
            description: String::new(),
            missing_value: -9999.0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_missing_value(mut self, missing: f64) -> Self {
        self.missing_value = missing;
        self
    }
}

/// A categorical (non-numeric) value description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quality {
    pub categories: Vec<String>,
    pub caption: String,
    pub description: String,
}

/// What an exchange item's values mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueDefinition {
    Quantity(Quantity),
    Quality(Quality),
}

impl ValueDefinition {
    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            ValueDefinition::Quantity(q) => Some(q),
            ValueDefinition::Quality(_) => None,
        }
    }

    /// Missing-data marker, when the definition is a quantity
    pub fn missing_value(&self) -> Option<f64> {
        self.as_quantity().map(|q| q.missing_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_bases_have_zero_power() {
        let flow = Dimension::volume_per_time();
        assert_eq!(flow.power(DimensionBase::Length), 3.0);
        assert_eq!(flow.power(DimensionBase::Time), -1.0);
        assert_eq!(flow.power(DimensionBase::Mass), 0.0);
        assert_eq!(flow.power(DimensionBase::Currency), 0.0);
    }

    #[test]
    fn test_equal_to_over_all_bases() {
        assert!(Dimension::area().equal_to(&Dimension::from_powers(&[(
            DimensionBase::Length,
            2.0
        )])));
        assert!(!Dimension::area().equal_to(&Dimension::length()));
    }

    #[test]
    fn test_setting_zero_power_clears_the_base() {
        let mut dim = Dimension::length();
        dim.set_power(DimensionBase::Length, 0.0);
        assert!(dim.equal_to(&Dimension::new()));
    }

    #[test]
    fn test_value_definition_quantity_accessors() {
        let q = Quantity::new(Unit::new(Dimension::length(), "m"), "water level")
            .with_missing_value(-999.0);
        let def = ValueDefinition::Quantity(q);
        assert_eq!(def.missing_value(), Some(-999.0));

        let flag = ValueDefinition::Quality(Quality {
            categories: vec!["wet".into(), "dry".into()],
            caption: "state".into(),
            description: String::new(),
        });
        assert!(flag.as_quantity().is_none());
    }
}
