//! Planar geometry for areas of interest
//!
//! Small, dependency-light building blocks used by the interactive session:
//! axis-aligned boxes for hand detections, polygons for marker outlines and
//! AOI boundaries, and a uniform grid index for click hit-testing.
//!
//! ```rust,ignore
//! use aoigeom::{Point, Polygon, SpatialGrid};
//!
//! let marker = Polygon::from_corners(&[[10, 10], [50, 10], [50, 50], [10, 50]]);
//! let mut grid = SpatialGrid::new(64.0);
//! grid.insert_polygon(&marker, 3);
//! assert_eq!(grid.hit(Point::new(20.0, 20.0)), Some(3));
//! ```

pub mod bbox;
pub mod polygon;
pub mod spatial;

pub use bbox::{Bbox, Point};
pub use polygon::Polygon;
pub use spatial::{SpatialGrid, SpatialGridStats};
