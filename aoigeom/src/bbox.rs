//! Points and axis-aligned bounding boxes

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Integer pixel position, rounded towards zero
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x as f32, y as f32)
    }
}

/// Simple bounding box representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl Bbox {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Build a pixel box from a normalized `[ymin, xmin, ymax, xmax]` box,
    /// the layout object detectors commonly emit.
    pub fn from_normalized(normalized: [f32; 4], frame_width: u32, frame_height: u32) -> Self {
        let w = frame_width as f32;
        let h = frame_height as f32;
        Self {
            xmin: normalized[1] * w,
            ymin: normalized[0] * h,
            xmax: normalized[3] * w,
            ymax: normalized[2] * h,
        }
    }

    /// Smallest box enclosing all points, `None` for an empty slice
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            bbox.xmin = bbox.xmin.min(p.x);
            bbox.ymin = bbox.ymin.min(p.y);
            bbox.xmax = bbox.xmax.max(p.x);
            bbox.ymax = bbox.ymax.max(p.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new((self.xmin + self.xmax) / 2.0, (self.ymin + self.ymax) / 2.0)
    }

    /// Inclusive containment test
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    /// Convert to bounds array [xmin, ymin, xmax, ymax]
    pub fn to_bounds(&self) -> [f32; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bbox({}, {}, {}, {})",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}
