//! Element sets: the spatial domains value sets are indexed over

use serde::{Deserialize, Serialize};

/// Shape type of the elements in a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementShape {
    /// No geometry, elements identified by id only
    IdBased,
    Point,
    Polyline,
    Polygon,
}

/// One spatial element: an id and its 2D vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub vertices: Vec<[f64; 2]>,
}

impl Element {
    pub fn new(id: impl Into<String>, vertices: Vec<[f64; 2]>) -> Self {
        Self {
            id: id.into(),
            vertices,
        }
    }

    /// Arithmetic mean of the vertices
    pub fn centroid(&self) -> [f64; 2] {
        if self.vertices.is_empty() {
            return [0.0, 0.0];
        }
        let n = self.vertices.len() as f64;
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), v| (sx + v[0], sy + v[1]));
        [sx / n, sy / n]
    }

    /// Shoelace area of the polygon outlined by the vertices
    pub fn area(&self) -> f64 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        let mut twice = 0.0;
        for i in 0..self.vertices.len() {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % self.vertices.len()];
            twice += a[0] * b[1] - b[0] * a[1];
        }
        twice.abs() / 2.0
    }

    /// Total length of the polyline through the vertices
    pub fn length(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|w| ((w[1][0] - w[0][0]).powi(2) + (w[1][1] - w[0][1]).powi(2)).sqrt())
            .sum()
    }

    /// Ray-cast point-in-polygon test; a point exactly on the boundary
    /// may land on either side depending on the edge
    pub fn contains(&self, point: [f64; 2]) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        let [px, py] = point;
        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let [xi, yi] = self.vertices[i];
            let [xj, yj] = self.vertices[j];
            if ((yi > py) != (yj > py))
                && (px <= (xj - xi) * (py - yi) / (yj - yi) + xi)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// The spatial domain of an exchange item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSet {
    pub id: String,
    pub shape: ElementShape,
    pub elements: Vec<Element>,
    /// Spatial reference system the vertices are expressed in
    pub srs: String,
    /// Bumped whenever the geometry changes
    pub version: i32,
}

impl ElementSet {
    pub fn new(id: impl Into<String>, shape: ElementShape, elements: Vec<Element>) -> Self {
        Self {
            id: id.into(),
            shape,
            elements,
            srs: String::new(),
            version: 0,
        }
    }

    pub fn with_srs(mut self, srs: impl Into<String>) -> Self {
        self.srs = srs.into();
        self
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Per-element polygon areas
    pub fn areas(&self) -> Vec<f64> {
        self.elements.iter().map(Element::area).collect()
    }

    /// Per-element polyline lengths
    pub fn lengths(&self) -> Vec<f64> {
        self.elements.iter().map(Element::length).collect()
    }

    /// Per-element centroids
    pub fn centroids(&self) -> Vec<[f64; 2]> {
        self.elements.iter().map(Element::centroid).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(id: &str) -> Element {
        Element::new(
            id,
            vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        )
    }

    #[test]
    fn test_polygon_area() {
        assert_eq!(unit_square("sq").area(), 1.0);
        // winding order must not matter
        let reversed = Element::new(
            "sq",
            vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        );
        assert_eq!(reversed.area(), 1.0);
    }

    #[test]
    fn test_polyline_length() {
        let line = Element::new("l", vec![[0.0, 0.0], [3.0, 0.0], [3.0, 4.0]]);
        assert_eq!(line.length(), 8.0);
    }

    #[test]
    fn test_centroid() {
        assert_eq!(unit_square("sq").centroid(), [0.5, 0.5]);
    }

    #[test]
    fn test_contains() {
        let sq = unit_square("sq");
        assert!(sq.contains([0.5, 0.5]));
        assert!(!sq.contains([1.5, 0.5]));
    }

    #[test]
    fn test_set_measures() {
        let set = ElementSet::new(
            "polys",
            ElementShape::Polygon,
            vec![unit_square("a"), unit_square("b")],
        );
        assert_eq!(set.element_count(), 2);
        assert_eq!(set.areas(), vec![1.0, 1.0]);
    }
}
