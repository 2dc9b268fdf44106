use rayon::prelude::*;

use crate::bounds::BoundingBox;
use crate::error::KernelError;
use crate::locator::{CellArray, CutContext};
use crate::math::{add_scaled, determinant3x3, distance2, sub};

pub mod line;
pub mod pentagonal_prism;
pub mod pixel;
pub mod polygon;
pub mod pyramid;
pub mod quad;
pub mod tetra;
pub mod triangle;

pub use pentagonal_prism::PentagonalPrism;
pub use pixel::Pixel;
pub use polygon::Polygon;
pub use pyramid::Pyramid;
pub use quad::Quad;
pub use tetra::Tetra;
pub use triangle::Triangle;

/// Topological kind of a cell or of a primitive produced by contouring/clipping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    Line,
    Triangle,
    Quad,
    Pixel,
    Polygon,
    Tetra,
    Wedge,
    Pyramid,
    PentagonalPrism,
}

impl CellKind {
    /// Topological dimension.
    pub fn dimension(self) -> usize {
        match self {
            CellKind::Line => 1,
            CellKind::Triangle | CellKind::Quad | CellKind::Pixel | CellKind::Polygon => 2,
            CellKind::Tetra | CellKind::Wedge | CellKind::Pyramid | CellKind::PentagonalPrism => 3,
        }
    }

    /// Fixed vertex count, `None` for polygons.
    pub fn point_count(self) -> Option<usize> {
        match self {
            CellKind::Line => Some(2),
            CellKind::Triangle => Some(3),
            CellKind::Quad | CellKind::Pixel | CellKind::Tetra => Some(4),
            CellKind::Pyramid => Some(5),
            CellKind::Wedge => Some(6),
            CellKind::PentagonalPrism => Some(10),
            CellKind::Polygon => None,
        }
    }
}

/// Outcome of inverse mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Inside,
    Outside,
    /// Numerical failure (singular Jacobian, divergence, degenerate geometry).
    Failed,
}

impl Location {
    /// Integer status: 1 inside, 0 outside, -1 failed.
    pub fn code(self) -> i32 {
        match self {
            Location::Inside => 1,
            Location::Outside => 0,
            Location::Failed => -1,
        }
    }
}

/// Tunables of the Newton inverse mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonSettings {
    pub max_iterations: usize,
    /// Stop once every parametric coordinate moves less than this.
    pub converged: f64,
    /// Give up once any parametric coordinate exceeds this magnitude.
    pub diverged: f64,
}

/// Result of [`Cell::evaluate_position`].
#[derive(Clone, Debug, PartialEq)]
pub struct PositionEval {
    pub location: Location,
    pub pcoords: [f64; 3],
    /// Interpolation weights at `pcoords`, one per vertex.
    pub weights: Vec<f64>,
    /// Closest point on the cell (the query itself when inside a 3D cell).
    pub closest: [f64; 3],
    /// Squared distance from the query to `closest`.
    pub dist2: f64,
    /// Index of the sub-entity the evaluation ended on (always 0 for these cells).
    pub sub_id: usize,
}

impl PositionEval {
    pub(crate) fn failed(point_count: usize) -> Self {
        Self {
            location: Location::Failed,
            pcoords: [0.0; 3],
            weights: vec![0.0; point_count],
            closest: [0.0; 3],
            dist2: f64::MAX,
            sub_id: 0,
        }
    }

    pub fn is_inside(&self) -> bool {
        self.location == Location::Inside
    }
}

/// Result of [`Cell::intersect_with_line`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineHit {
    /// Parameter along the query segment, in [0, 1].
    pub t: f64,
    pub x: [f64; 3],
    pub pcoords: [f64; 3],
    /// Face (3D cells) the hit lies on.
    pub sub_id: usize,
}

/// Trait defining the operations shared by every cell kind.
///
/// Cells own their coordinates and global point ids. All queries are pure;
/// contouring and clipping write through a [`CutContext`] into a [`CellArray`].
pub trait Cell: Send + Sync {
    fn kind(&self) -> CellKind;

    /// World coordinates of the vertices, in canonical order.
    fn points(&self) -> &[[f64; 3]];

    /// Global ids of the vertices, parallel to [`Cell::points`].
    fn point_ids(&self) -> &[i64];

    fn dimension(&self) -> usize {
        self.kind().dimension()
    }

    fn point_count(&self) -> usize {
        self.points().len()
    }

    fn bounds(&self) -> BoundingBox<3> {
        BoundingBox::from_points(self.points())
    }

    /// Parametric coordinates of each vertex.
    fn parametric_coords(&self) -> Vec<[f64; 3]>;

    fn parametric_center(&self) -> [f64; 3];

    /// How far `pcoords` lies outside the unit parametric domain (0 when inside).
    fn parametric_distance(&self, pcoords: &[f64; 3]) -> f64 {
        pcoords
            .iter()
            .take(self.dimension())
            .map(|&pc| {
                if pc < 0.0 {
                    -pc
                } else if pc > 1.0 {
                    pc - 1.0
                } else {
                    0.0
                }
            })
            .fold(0.0, f64::max)
    }

    /// Interpolation weights at `pcoords`, one per vertex, summing to 1.
    fn interpolation_functions(&self, pcoords: &[f64; 3]) -> Vec<f64>;

    /// Weight derivatives, laid out as all d/dr, then all d/ds (then all d/dt).
    fn interpolation_derivs(&self, pcoords: &[f64; 3]) -> Vec<f64>;

    /// Inverse mapping: world point to parametric coordinates.
    fn evaluate_position(&self, x: &[f64; 3]) -> PositionEval;

    /// Forward mapping: parametric coordinates to a world point and its weights.
    fn evaluate_location(&self, pcoords: &[f64; 3]) -> ([f64; 3], Vec<f64>) {
        let weights = self.interpolation_functions(pcoords);
        (interpolate(self.points(), &weights), weights)
    }

    /// Extracts the iso-set `scalar == value` (segments for 2D cells, triangles for 3D cells).
    fn contour(&self, value: f64, scalars: &[f64], ctx: &mut CutContext, out: &mut CellArray);

    /// Keeps the part with `scalar >= value`, or the complement when `inside_out`.
    fn clip(&self, value: f64, scalars: &[f64], inside_out: bool, ctx: &mut CutContext, out: &mut CellArray);

    /// First intersection of segment `p1-p2` with the cell, within `tol`.
    fn intersect_with_line(&self, p1: &[f64; 3], p2: &[f64; 3], tol: f64) -> Option<LineHit>;

    /// Simplex decomposition in local vertex indices (triangles for 2D cells, tetrahedra for 3D).
    fn triangulate(&self) -> Result<Vec<usize>, KernelError>;
}

/// Closed set of cell kinds with static dispatch.
#[derive(Clone, Debug)]
pub enum AnyCell {
    Triangle(Triangle),
    Quad(Quad),
    Pixel(Pixel),
    Polygon(Polygon),
    Tetra(Tetra),
    Pyramid(Pyramid),
    PentagonalPrism(PentagonalPrism),
}

macro_rules! dispatch {
    ($self:ident, $cell:ident => $body:expr) => {
        match $self {
            AnyCell::Triangle($cell) => $body,
            AnyCell::Quad($cell) => $body,
            AnyCell::Pixel($cell) => $body,
            AnyCell::Polygon($cell) => $body,
            AnyCell::Tetra($cell) => $body,
            AnyCell::Pyramid($cell) => $body,
            AnyCell::PentagonalPrism($cell) => $body,
        }
    };
}

macro_rules! any_cell_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for AnyCell {
                fn from(cell: $variant) -> Self {
                    AnyCell::$variant(cell)
                }
            }
        )*
    };
}

any_cell_from!(Triangle, Quad, Pixel, Polygon, Tetra, Pyramid, PentagonalPrism);

impl Cell for AnyCell {
    fn kind(&self) -> CellKind {
        dispatch!(self, c => c.kind())
    }

    fn points(&self) -> &[[f64; 3]] {
        dispatch!(self, c => c.points())
    }

    fn point_ids(&self) -> &[i64] {
        dispatch!(self, c => c.point_ids())
    }

    fn parametric_coords(&self) -> Vec<[f64; 3]> {
        dispatch!(self, c => c.parametric_coords())
    }

    fn parametric_center(&self) -> [f64; 3] {
        dispatch!(self, c => c.parametric_center())
    }

    fn parametric_distance(&self, pcoords: &[f64; 3]) -> f64 {
        dispatch!(self, c => c.parametric_distance(pcoords))
    }

    fn interpolation_functions(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        dispatch!(self, c => c.interpolation_functions(pcoords))
    }

    fn interpolation_derivs(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        dispatch!(self, c => c.interpolation_derivs(pcoords))
    }

    fn evaluate_position(&self, x: &[f64; 3]) -> PositionEval {
        dispatch!(self, c => c.evaluate_position(x))
    }

    fn evaluate_location(&self, pcoords: &[f64; 3]) -> ([f64; 3], Vec<f64>) {
        dispatch!(self, c => c.evaluate_location(pcoords))
    }

    fn contour(&self, value: f64, scalars: &[f64], ctx: &mut CutContext, out: &mut CellArray) {
        dispatch!(self, c => c.contour(value, scalars, ctx, out))
    }

    fn clip(&self, value: f64, scalars: &[f64], inside_out: bool, ctx: &mut CutContext, out: &mut CellArray) {
        dispatch!(self, c => c.clip(value, scalars, inside_out, ctx, out))
    }

    fn intersect_with_line(&self, p1: &[f64; 3], p2: &[f64; 3], tol: f64) -> Option<LineHit> {
        dispatch!(self, c => c.intersect_with_line(p1, p2, tol))
    }

    fn triangulate(&self) -> Result<Vec<usize>, KernelError> {
        dispatch!(self, c => c.triangulate())
    }
}

/// Inverse-maps many points against one cell in parallel.
pub fn evaluate_positions<C: Cell + ?Sized>(cell: &C, points: &[[f64; 3]]) -> Vec<PositionEval> {
    points.par_iter().map(|x| cell.evaluate_position(x)).collect()
}

/// `sum_i weights[i] * points[i]`
pub(crate) fn interpolate(points: &[[f64; 3]], weights: &[f64]) -> [f64; 3] {
    let mut x = [0.0; 3];
    for (p, &w) in points.iter().zip(weights) {
        x = add_scaled(&x, p, w);
    }
    x
}

/// Newton iteration for 3D isoparametric cells.
///
/// `shape` returns `(weights, derivs)` at a parametric point. Returns `None`
/// on a singular Jacobian, divergence or exhausted iterations.
pub(crate) fn newton_3d<F>(
    points: &[[f64; 3]],
    x: &[f64; 3],
    start: [f64; 3],
    settings: &NewtonSettings,
    shape: F,
) -> Option<[f64; 3]>
where
    F: Fn(&[f64; 3]) -> (Vec<f64>, Vec<f64>),
{
    let n = points.len();
    let mut pcoords = start;

    for iteration in 0..settings.max_iterations {
        let (weights, derivs) = shape(&pcoords);

        // 1. Residual and Jacobian columns.
        let mut fcol = [0.0; 3];
        let mut rcol = [0.0; 3];
        let mut scol = [0.0; 3];
        let mut tcol = [0.0; 3];
        for (i, p) in points.iter().enumerate() {
            for j in 0..3 {
                fcol[j] += p[j] * weights[i];
                rcol[j] += p[j] * derivs[i];
                scol[j] += p[j] * derivs[n + i];
                tcol[j] += p[j] * derivs[2 * n + i];
            }
        }
        let fcol = sub(&fcol, x);

        // 2. Solve with Cramer's rule.
        let det = determinant3x3(&rcol, &scol, &tcol);
        if det.abs() < 1e-20 {
            tracing::debug!(iteration, det, "singular Jacobian in inverse mapping");
            return None;
        }
        let next = [
            pcoords[0] - determinant3x3(&fcol, &scol, &tcol) / det,
            pcoords[1] - determinant3x3(&rcol, &fcol, &tcol) / det,
            pcoords[2] - determinant3x3(&rcol, &scol, &fcol) / det,
        ];

        // 3. Convergence / divergence.
        if (0..3).all(|i| (next[i] - pcoords[i]).abs() < settings.converged) {
            return Some(next);
        }
        if next.iter().any(|c| c.abs() > settings.diverged) {
            tracing::debug!(iteration, "inverse mapping diverged");
            return None;
        }
        pcoords = next;
    }

    tracing::debug!(max_iterations = settings.max_iterations, "inverse mapping did not converge");
    None
}

/// Whether a quad `0-1-2-3` is split along `0-2` (otherwise `1-3`).
///
/// The shorter diagonal wins; ties go to the diagonal touching the smallest global id.
pub(crate) fn split_along_02(points: [&[f64; 3]; 4], ids: [i64; 4]) -> bool {
    let d02 = distance2(points[0], points[2]);
    let d13 = distance2(points[1], points[3]);
    if d02 < d13 {
        return true;
    }
    if d13 < d02 {
        return false;
    }
    let min = ids.iter().enumerate().min_by_key(|&(_, id)| *id).map_or(0, |(i, _)| i);
    min % 2 == 0
}

/// Triangles covering one polyhedron face, in local vertex indices.
fn face_triangles(face: &[usize], points: &[[f64; 3]], ids: &[i64]) -> Vec<[usize; 3]> {
    match face.len() {
        3 => vec![[face[0], face[1], face[2]]],
        4 => {
            let p = [&points[face[0]], &points[face[1]], &points[face[2]], &points[face[3]]];
            let i = [ids[face[0]], ids[face[1]], ids[face[2]], ids[face[3]]];
            if split_along_02(p, i) {
                vec![[face[0], face[1], face[2]], [face[0], face[2], face[3]]]
            } else {
                vec![[face[0], face[1], face[3]], [face[1], face[2], face[3]]]
            }
        }
        m => {
            // Fan from the vertex with the smallest global id.
            let start = (0..m).min_by_key(|&k| ids[face[k]]).unwrap_or(0);
            (1..m - 1)
                .map(|k| [face[start], face[(start + k) % m], face[(start + k + 1) % m]])
                .collect()
        }
    }
}

/// Nearest intersection of `p1-p2` with the faces of a polyhedron.
///
/// Returns `(t, x, face index)`.
pub(crate) fn intersect_faces(
    points: &[[f64; 3]],
    ids: &[i64],
    faces: &[&[usize]],
    p1: &[f64; 3],
    p2: &[f64; 3],
    tol: f64,
) -> Option<(f64, [f64; 3], usize)> {
    let mut best: Option<(f64, [f64; 3], usize)> = None;
    for (fi, face) in faces.iter().enumerate() {
        for [a, b, c] in face_triangles(face, points, ids) {
            if let Some(hit) = triangle::intersect_triangle(&points[a], &points[b], &points[c], p1, p2, tol) {
                if best.is_none_or(|(t, _, _)| hit.t < t) {
                    best = Some((hit.t, hit.x, fi));
                }
            }
        }
    }
    best
}
