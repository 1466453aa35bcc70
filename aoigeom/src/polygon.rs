//! Simple (non self-intersecting) polygons

use crate::bbox::{Bbox, Point};
use serde::{Deserialize, Serialize};

/// Closed polygon given by its vertices in drawing order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Build from integer corner coordinates as produced by marker detectors
    pub fn from_corners(corners: &[[i32; 2]]) -> Self {
        Self::new(
            corners
                .iter()
                .map(|c| Point::new(c[0] as f32, c[1] as f32))
                .collect(),
        )
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// A polygon needs at least three vertices to enclose anything
    pub fn is_closed_shape(&self) -> bool {
        self.vertices.len() >= 3
    }

    pub fn bounding_box(&self) -> Option<Bbox> {
        Bbox::enclosing(&self.vertices)
    }

    /// Edges as (start, end) pairs, including the closing edge
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Unsigned area (shoelace formula)
    pub fn area(&self) -> f32 {
        if !self.is_closed_shape() {
            return 0.0;
        }
        let twice: f32 = self.edges().map(|(a, b)| a.x * b.y - b.x * a.y).sum();
        twice.abs() / 2.0
    }

    /// Vertex mean, good enough for label placement
    pub fn centroid(&self) -> Option<Point> {
        if self.vertices.is_empty() {
            return None;
        }
        let n = self.vertices.len() as f32;
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point::new(sx / n, sy / n))
    }

    /// Even-odd ray casting. Points exactly on an edge may fall either way.
    pub fn contains(&self, p: Point) -> bool {
        if !self.is_closed_shape() {
            return false;
        }
        match self.bounding_box() {
            Some(bbox) if bbox.contains(p) => {}
            _ => return false,
        }

        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }
}
