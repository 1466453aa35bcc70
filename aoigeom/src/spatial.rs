//! Uniform grid index for point-in-polygon hit testing
//!
//! Marker outlines are bucketed by their bounding boxes so a click only has to
//! be tested against the few polygons sharing its cell.

use crate::bbox::{Bbox, Point};
use crate::polygon::Polygon;
use std::collections::HashMap;

/// Spatial grid mapping cells to the polygons overlapping them
#[derive(Debug, Clone)]
pub struct SpatialGrid<K = u32> {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
    entries: Vec<(K, Polygon)>,
}

impl<K: Copy> SpatialGrid<K> {
    /// Create a new grid with the specified cell size
    ///
    /// # Arguments
    /// * `cell_size` - Edge length of a cell. Roughly the size of a marker works well.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn cell_range(&self, bbox: &Bbox) -> (i32, i32, i32, i32) {
        (
            (bbox.xmin / self.cell_size).floor() as i32,
            (bbox.ymin / self.cell_size).floor() as i32,
            (bbox.xmax / self.cell_size).floor() as i32,
            (bbox.ymax / self.cell_size).floor() as i32,
        )
    }

    fn cell_of(&self, p: Point) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    /// Index a polygon under `key`. Polygons that cannot enclose anything are skipped.
    pub fn insert_polygon(&mut self, polygon: &Polygon, key: K) {
        let Some(bbox) = polygon.bounding_box() else {
            return;
        };
        if !polygon.is_closed_shape() {
            return;
        }

        let idx = self.entries.len();
        self.entries.push((key, polygon.clone()));

        let (x0, y0, x1, y1) = self.cell_range(&bbox);
        for x in x0..=x1 {
            for y in y0..=y1 {
                self.cells.entry((x, y)).or_default().push(idx);
            }
        }
    }

    /// Keys of every indexed polygon containing `p`, in insertion order
    pub fn query(&self, p: Point) -> Vec<K> {
        let Some(candidates) = self.cells.get(&self.cell_of(p)) else {
            return Vec::new();
        };
        candidates
            .iter()
            .filter(|&&idx| self.entries[idx].1.contains(p))
            .map(|&idx| self.entries[idx].0)
            .collect()
    }

    /// First polygon containing `p`
    pub fn hit(&self, p: Point) -> Option<K> {
        self.query(p).into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries (reuse for the next snapshot)
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
    }

    /// Get statistics about grid usage
    pub fn stats(&self) -> SpatialGridStats {
        let total_cells = self.cells.len();
        let total_entries: usize = self.cells.values().map(|v| v.len()).sum();
        let max_entries = self.cells.values().map(|v| v.len()).max().unwrap_or(0);

        SpatialGridStats {
            total_cells,
            total_entries,
            max_entries_per_cell: max_entries,
        }
    }
}

/// Statistics about spatial grid usage
#[derive(Debug, Clone)]
pub struct SpatialGridStats {
    pub total_cells: usize,
    pub total_entries: usize,
    pub max_entries_per_cell: usize,
}
