//! Reference spatial mapper: centroid/measure weight matrix
//!
//! A deliberately simple kernel. Weights are derived from element centroids,
//! containment and measures (length/area) at initialize time; `map_values`
//! is then a sparse matrix apply per time step. Production hosts with exact
//! geometric overlay requirements plug in their own [`SpatialMapper`].

use super::{MappingMethod, SpatialMapper};
use crate::error::{ExchangeError, ExchangeResult};
use crate::spatial::{ElementSet, ElementShape};
use crate::values::ValueSet;

/// Sparse target-major weight matrix over source elements
#[derive(Debug, Default)]
pub struct ElementMapper {
    method: Option<MappingMethod>,
    source_count: usize,
    target_count: usize,
    weights: Vec<Vec<(usize, f64)>>,
}

const DISTANCE_FLOOR: f64 = 1.0e-9;

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

fn measures(set: &ElementSet) -> Vec<f64> {
    match set.shape {
        ElementShape::Polyline => set.lengths(),
        ElementShape::Polygon => set.areas(),
        _ => vec![1.0; set.element_count()],
    }
}

fn nearest(source_centroids: &[[f64; 2]], to: [f64; 2]) -> Option<usize> {
    source_centroids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance(**a, to).total_cmp(&distance(**b, to)))
        .map(|(j, _)| j)
}

impl ElementMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(&self) -> Option<MappingMethod> {
        self.method
    }

    /// Source elements whose centroid falls inside target element `i`
    fn contained(
        target: &ElementSet,
        i: usize,
        source_centroids: &[[f64; 2]],
    ) -> Vec<usize> {
        let Some(element) = target.element(i) else {
            return Vec::new();
        };
        source_centroids
            .iter()
            .enumerate()
            .filter(|(_, c)| element.contains(**c))
            .map(|(j, _)| j)
            .collect()
    }
}

impl SpatialMapper for ElementMapper {
    fn initialize(
        &mut self,
        method: MappingMethod,
        source: &ElementSet,
        target: &ElementSet,
    ) -> ExchangeResult<()> {
        let source_centroids = source.centroids();
        let target_centroids = target.centroids();
        let source_measures = measures(source);
        let target_measures = measures(target);

        let mut weights: Vec<Vec<(usize, f64)>> = Vec::with_capacity(target.element_count());
        for i in 0..target.element_count() {
            let row = match method {
                MappingMethod::Nearest => nearest(&source_centroids, target_centroids[i])
                    .map(|j| vec![(j, 1.0)])
                    .unwrap_or_default(),
                MappingMethod::Inverse => {
                    let raw: Vec<(usize, f64)> = source_centroids
                        .iter()
                        .enumerate()
                        .map(|(j, c)| {
                            let d = distance(*c, target_centroids[i]).max(DISTANCE_FLOOR);
                            (j, 1.0 / d)
                        })
                        .collect();
                    let total: f64 = raw.iter().map(|(_, w)| w).sum();
                    raw.into_iter().map(|(j, w)| (j, w / total)).collect()
                }
                MappingMethod::Mean | MappingMethod::Sum => {
                    let mut inside = Self::contained(target, i, &source_centroids);
                    if inside.is_empty() {
                        inside.extend(nearest(&source_centroids, target_centroids[i]));
                    }
                    let w = match method {
                        MappingMethod::Mean => 1.0 / inside.len().max(1) as f64,
                        _ => 1.0,
                    };
                    inside.into_iter().map(|j| (j, w)).collect()
                }
                MappingMethod::WeightedMean | MappingMethod::WeightedSum => {
                    let mut inside = Self::contained(target, i, &source_centroids);
                    if inside.is_empty() {
                        inside.extend(nearest(&source_centroids, target_centroids[i]));
                    }
                    let total: f64 = inside.iter().map(|j| source_measures[*j]).sum();
                    inside
                        .into_iter()
                        .map(|j| {
                            let w = match method {
                                MappingMethod::WeightedMean if total > 0.0 => {
                                    source_measures[j] / total
                                }
                                _ => source_measures[j],
                            };
                            (j, w)
                        })
                        .collect()
                }
                MappingMethod::Value | MappingMethod::Distribute => {
                    // The target centroid picks the source element covering it.
                    let covering = source_centroids
                        .iter()
                        .enumerate()
                        .position(|(j, _)| {
                            source
                                .element(j)
                                .is_some_and(|e| e.contains(target_centroids[i]))
                        })
                        .or_else(|| nearest(&source_centroids, target_centroids[i]));
                    match covering {
                        Some(j) if method == MappingMethod::Distribute => {
                            let share = if source_measures[j] > 0.0 {
                                target_measures[i] / source_measures[j]
                            } else {
                                1.0
                            };
                            vec![(j, share)]
                        }
                        Some(j) => vec![(j, 1.0)],
                        None => Vec::new(),
                    }
                }
            };
            weights.push(row);
        }

        self.method = Some(method);
        self.source_count = source.element_count();
        self.target_count = target.element_count();
        self.weights = weights;
        Ok(())
    }

    fn map_values(&self, source: &ValueSet) -> ExchangeResult<ValueSet> {
        if self.method.is_none() {
            return Err(ExchangeError::MissingState {
                item: "element mapper".into(),
                what: "initialize() has not run".into(),
            });
        }

        let mut rows = Vec::with_capacity(source.times_count());
        for row in source.rows() {
            if row.len() != self.source_count {
                return Err(ExchangeError::ElementCountMismatch {
                    item: "element mapper source".into(),
                    expected: self.source_count,
                    actual: row.len(),
                });
            }
            rows.push(
                self.weights
                    .iter()
                    .map(|cells| cells.iter().map(|(j, w)| row[*j] * w).sum())
                    .collect(),
            );
        }
        Ok(ValueSet::new(source.definition().clone(), rows))
    }
}
