//! Time-major value buffers carried by exchange items

use crate::error::{ExchangeError, ExchangeResult};
use crate::quantity::ValueDefinition;
use serde::{Deserialize, Serialize};

/// A 2D value buffer: one row of element values per time step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSet {
    definition: ValueDefinition,
    rows: Vec<Vec<f64>>,
}

impl ValueSet {
    pub fn new(definition: ValueDefinition, rows: Vec<Vec<f64>>) -> Self {
        Self { definition, rows }
    }

    /// A buffer with a definition but no values yet
    pub fn empty(definition: ValueDefinition) -> Self {
        Self::new(definition, Vec::new())
    }

    pub fn definition(&self) -> &ValueDefinition {
        &self.definition
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn times_count(&self) -> usize {
        self.rows.len()
    }

    /// Element count of the first time step (rows are uniform by contract)
    pub fn element_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, time_index: usize) -> Option<&[f64]> {
        self.rows.get(time_index).map(Vec::as_slice)
    }

    pub fn value(&self, time_index: usize, element_index: usize) -> Option<f64> {
        self.rows.get(time_index)?.get(element_index).copied()
    }

    /// Append a full time step
    pub fn push_row(&mut self, row: Vec<f64>) {
        self.rows.push(row);
    }

    /// Write a slot, growing rows and columns as needed
    ///
    /// New slots created by growth are filled with the definition's
    /// missing-data value (0.0 for non-quantity definitions).
    pub fn set_or_add(&mut self, time_index: usize, element_index: usize, value: f64) {
        let fill = self.definition.missing_value().unwrap_or(0.0);
        while self.rows.len() <= time_index {
            self.rows.push(Vec::new());
        }
        let row = &mut self.rows[time_index];
        while row.len() <= element_index {
            row.push(fill);
        }
        row[element_index] = value;
    }

    /// Drop the oldest time step, if any
    pub fn remove_first_time(&mut self) {
        if !self.rows.is_empty() {
            self.rows.remove(0);
        }
    }

    /// Elementwise multiply every row by per-element factors
    pub fn scale_rows(&self, factors: &[f64]) -> ExchangeResult<ValueSet> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            if row.len() != factors.len() {
                return Err(ExchangeError::ElementCountMismatch {
                    item: "value set".into(),
                    expected: factors.len(),
                    actual: row.len(),
                });
            }
            rows.push(row.iter().zip(factors).map(|(v, f)| v * f).collect());
        }
        Ok(ValueSet::new(self.definition.clone(), rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::{Dimension, Quantity, Unit};

    fn level_definition() -> ValueDefinition {
        ValueDefinition::Quantity(
            Quantity::new(Unit::new(Dimension::length(), "m"), "level")
                .with_missing_value(-999.0),
        )
    }

    #[test]
    fn test_set_or_add_grows_with_missing_fill() {
        let mut vs = ValueSet::empty(level_definition());
        vs.set_or_add(1, 2, 7.0);
        assert_eq!(vs.times_count(), 2);
        assert_eq!(vs.value(1, 2), Some(7.0));
        assert_eq!(vs.value(1, 0), Some(-999.0));
        assert_eq!(vs.row(0), Some(&[][..]));
    }

    #[test]
    fn test_scale_rows() {
        let vs = ValueSet::new(
            level_definition(),
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        );
        let scaled = vs.scale_rows(&[2.0, 0.5]).unwrap();
        assert_eq!(scaled.rows(), &[vec![2.0, 1.0], vec![6.0, 2.0]]);
    }

    #[test]
    fn test_scale_rows_rejects_count_mismatch() {
        let vs = ValueSet::new(level_definition(), vec![vec![1.0, 2.0]]);
        let err = vs.scale_rows(&[2.0]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ExchangeError::ElementCountMismatch { expected: 1, actual: 2, .. }
        ));
    }

    #[test]
    fn test_remove_first_time() {
        let mut vs = ValueSet::new(level_definition(), vec![vec![1.0], vec![2.0]]);
        vs.remove_first_time();
        assert_eq!(vs.rows(), &[vec![2.0]]);
        vs.remove_first_time();
        vs.remove_first_time(); // no-op on empty
        assert!(vs.is_empty());
    }
}
