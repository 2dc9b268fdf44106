use crate::cell::triangle::Triangle;
use crate::cell::{intersect_faces, Cell, CellKind, LineHit, Location, PositionEval};
use crate::contour::{self, tables, CutCell};
use crate::error::KernelError;
use crate::locator::{CellArray, CutContext};
use crate::math::{cross, determinant3x3, dot, sub};

/// Linear tetrahedron. Also the target of 3D clipping.
#[derive(Clone, Debug, PartialEq)]
pub struct Tetra {
    pub(crate) points: [[f64; 3]; 4],
    pub(crate) ids: [i64; 4],
}

/// Signed volume of tetrahedron `a b c d` (positive when `d` is above `abc`).
pub fn tetra_volume(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3], d: &[f64; 3]) -> f64 {
    dot(&cross(&sub(b, a), &sub(c, a)), &sub(d, a)) / 6.0
}

impl Tetra {
    pub const INSIDE_TOLERANCE: f64 = 1e-3;

    pub fn new(points: [[f64; 3]; 4], ids: [i64; 4]) -> Self {
        Self { points, ids }
    }

    /// Tetra with ids `0..4`.
    pub fn from_points(points: [[f64; 3]; 4]) -> Self {
        Self::new(points, [0, 1, 2, 3])
    }

    pub fn shape_functions(pcoords: &[f64; 3]) -> [f64; 4] {
        [1.0 - pcoords[0] - pcoords[1] - pcoords[2], pcoords[0], pcoords[1], pcoords[2]]
    }

    pub fn shape_derivatives(_pcoords: &[f64; 3]) -> [f64; 12] {
        [
            -1.0, 1.0, 0.0, 0.0, // d/dr
            -1.0, 0.0, 1.0, 0.0, // d/ds
            -1.0, 0.0, 0.0, 1.0, // d/dt
        ]
    }

    pub fn volume(&self) -> f64 {
        let [a, b, c, d] = &self.points;
        tetra_volume(a, b, c, d)
    }

    fn cut_cell<'c>(&'c self, scalars: &'c [f64]) -> CutCell<'c> {
        CutCell {
            points: &self.points,
            ids: &self.ids,
            scalars,
            edges: &tables::TETRA_EDGES,
        }
    }
}

impl Cell for Tetra {
    fn kind(&self) -> CellKind {
        CellKind::Tetra
    }

    fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn point_ids(&self) -> &[i64] {
        &self.ids
    }

    fn parametric_coords(&self) -> Vec<[f64; 3]> {
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
    }

    fn parametric_center(&self) -> [f64; 3] {
        [0.25, 0.25, 0.25]
    }

    fn parametric_distance(&self, pcoords: &[f64; 3]) -> f64 {
        let w = Self::shape_functions(pcoords);
        w.iter().map(|&v| if v < 0.0 { -v } else { 0.0 }).fold(0.0, f64::max)
    }

    fn interpolation_functions(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        Self::shape_functions(pcoords).to_vec()
    }

    fn interpolation_derivs(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        Self::shape_derivatives(pcoords).to_vec()
    }

    fn evaluate_position(&self, x: &[f64; 3]) -> PositionEval {
        let [p0, p1, p2, p3] = &self.points;
        let (c1, c2, c3) = (sub(p1, p0), sub(p2, p0), sub(p3, p0));
        let rhs = sub(x, p0);
        let det = determinant3x3(&c1, &c2, &c3);
        if det == 0.0 {
            tracing::debug!("degenerate tetra in inverse mapping");
            return PositionEval::failed(4);
        }
        let pcoords = [
            determinant3x3(&rhs, &c2, &c3) / det,
            determinant3x3(&c1, &rhs, &c3) / det,
            determinant3x3(&c1, &c2, &rhs) / det,
        ];
        let weights = Self::shape_functions(&pcoords).to_vec();

        if weights.iter().all(|&w| w >= -Self::INSIDE_TOLERANCE && w <= 1.0 + Self::INSIDE_TOLERANCE) {
            return PositionEval {
                location: Location::Inside,
                pcoords,
                weights,
                closest: *x,
                dist2: 0.0,
                sub_id: 0,
            };
        }

        // Nearest face.
        let mut closest = *x;
        let mut dist2 = f64::MAX;
        for face in tables::TETRA_FACES {
            let tri = Triangle::from_points([self.points[face[0]], self.points[face[1]], self.points[face[2]]]);
            let eval = tri.evaluate_position(x);
            if eval.location != Location::Failed && eval.dist2 < dist2 {
                dist2 = eval.dist2;
                closest = eval.closest;
            }
        }
        PositionEval {
            location: Location::Outside,
            pcoords,
            weights,
            closest,
            dist2,
            sub_id: 0,
        }
    }

    fn contour(&self, value: f64, scalars: &[f64], ctx: &mut CutContext, out: &mut CellArray) {
        contour::contour_cell(&self.cut_cell(scalars), &tables::TETRA_CONTOUR, value, 2, ctx, out);
    }

    fn clip(&self, value: f64, scalars: &[f64], inside_out: bool, ctx: &mut CutContext, out: &mut CellArray) {
        contour::clip_cell(&self.cut_cell(scalars), &tables::TETRA_CLIP, value, inside_out, 3, ctx, out);
    }

    fn intersect_with_line(&self, p1: &[f64; 3], p2: &[f64; 3], tol: f64) -> Option<LineHit> {
        let (t, x, face) = intersect_faces(&self.points, &self.ids, &tables::TETRA_FACES, p1, p2, tol)?;
        let pcoords = self.evaluate_position(&x).pcoords;
        Some(LineHit { t, x, pcoords, sub_id: face })
    }

    fn triangulate(&self) -> Result<Vec<usize>, KernelError> {
        Ok(vec![0, 1, 2, 3])
    }
}
