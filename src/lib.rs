//! # cellkern
//!
//! `cellkern` is a geometric cell kernel: the mesh primitives a visualization
//! pipeline needs for coordinate inversion, interpolation, contouring, clipping,
//! picking and spatial culling. It is usable from Rust and compiles to
//! WebAssembly (WASM).
//!
//! ## Features
//!
//! - **Cells**: triangle, quad, pixel, polygon, tetrahedron, pyramid and pentagonal prism, behind one [`Cell`] trait and the [`AnyCell`] sum type.
//! - **Inverse mapping**: world to parametric coordinates (closed form or Newton iteration) with an inside/outside/failed classification.
//! - **Polygons**: ear-cut triangulation, randomized point-in-polygon voting, inverse-distance and mean-value interpolation.
//! - **Contour & clip**: case-table driven iso-line/iso-surface extraction and clipping with point merging through a [`locator::PointLocator`].
//! - **Implicit functions**: [`Plane`], [`Frustum`] and [`SelectionLoop`], with parallel batch evaluation.
//!
//! ## Example
//!
//! ```
//! use cellkern::{Cell, Location, Quad};
//!
//! let quad = Quad::from_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]);
//! let eval = quad.evaluate_position(&[0.5, 0.5, 0.0]);
//! assert_eq!(eval.location, Location::Inside);
//! ```

pub mod bounds;
pub mod cell;
pub mod contour;
pub mod error;
pub mod implicit;
pub mod locator;
pub mod math;
mod priority_queue;
pub mod wasm;

pub use bounds::BoundingBox;
pub use cell::polygon::{PolygonInterpolation, PolygonLocation};
pub use cell::{
    evaluate_positions, AnyCell, Cell, CellKind, LineHit, Location, NewtonSettings, PentagonalPrism, Pixel, Polygon,
    PositionEval, Pyramid, Quad, Tetra, Triangle,
};
pub use contour::CaseTable;
pub use error::KernelError;
pub use implicit::{Frustum, ImplicitFunction, LinePlane, Plane, SelectionLoop};
pub use locator::{CellArray, CutContext, MergePoints, PointLocator};
