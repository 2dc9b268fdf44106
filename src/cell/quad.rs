use crate::cell::line::distance_to_line;
use crate::cell::polygon::compute_normal;
use crate::cell::{split_along_02, triangle, Cell, CellKind, LineHit, Location, NewtonSettings, PositionEval};
use crate::contour::{self, tables, CutCell};
use crate::error::KernelError;
use crate::implicit::plane::project_point;
use crate::locator::{CellArray, CutContext};
use crate::math::{determinant2x2, distance2, dominant_axis};

/// Bilinear quadrilateral, vertices counterclockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct Quad {
    pub(crate) points: [[f64; 3]; 4],
    pub(crate) ids: [i64; 4],
    newton: NewtonSettings,
}

impl Quad {
    pub const NEWTON: NewtonSettings = NewtonSettings {
        max_iterations: 20,
        converged: 1e-4,
        diverged: 1e6,
    };

    /// Parametric slack accepted as inside.
    pub const INSIDE_TOLERANCE: f64 = 1e-3;

    pub fn new(points: [[f64; 3]; 4], ids: [i64; 4]) -> Self {
        Self { points, ids, newton: Self::NEWTON }
    }

    /// Quad with ids `0..4`.
    pub fn from_points(points: [[f64; 3]; 4]) -> Self {
        Self::new(points, [0, 1, 2, 3])
    }

    pub fn with_newton(mut self, newton: NewtonSettings) -> Self {
        self.newton = newton;
        self
    }

    pub fn shape_functions(pcoords: &[f64; 3]) -> [f64; 4] {
        let (r, s) = (pcoords[0], pcoords[1]);
        let (rm, sm) = (1.0 - r, 1.0 - s);
        [rm * sm, r * sm, r * s, rm * s]
    }

    /// d/dr for the four vertices, then d/ds.
    pub fn shape_derivatives(pcoords: &[f64; 3]) -> [f64; 8] {
        let (r, s) = (pcoords[0], pcoords[1]);
        let (rm, sm) = (1.0 - r, 1.0 - s);
        [-sm, sm, s, -s, -rm, -r, r, rm]
    }

    /// Local triangles along the diagonal picked by [`split_along_02`].
    fn diagonal_triangles(&self) -> [[usize; 3]; 2] {
        let p = &self.points;
        if split_along_02([&p[0], &p[1], &p[2], &p[3]], self.ids) {
            [[0, 1, 2], [0, 2, 3]]
        } else {
            [[0, 1, 3], [1, 2, 3]]
        }
    }

    /// Newton iteration on the projected point, in the plane dropping axis `drop`.
    fn invert(&self, cp: &[f64; 3], drop: usize) -> Option<[f64; 3]> {
        let (i, j) = match drop {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        let mut pcoords = [0.5, 0.5, 0.0];

        for iteration in 0..self.newton.max_iterations {
            let weights = Self::shape_functions(&pcoords);
            let derivs = Self::shape_derivatives(&pcoords);

            let mut fcol = [-cp[i], -cp[j]];
            let mut rcol = [0.0; 2];
            let mut scol = [0.0; 2];
            for (k, p) in self.points.iter().enumerate() {
                let pt = [p[i], p[j]];
                for c in 0..2 {
                    fcol[c] += pt[c] * weights[k];
                    rcol[c] += pt[c] * derivs[k];
                    scol[c] += pt[c] * derivs[k + 4];
                }
            }

            let det = determinant2x2(&rcol, &scol);
            if det.abs() < 1e-20 {
                tracing::debug!(iteration, det, "singular Jacobian in quad inverse mapping");
                return None;
            }
            let next = [
                pcoords[0] - determinant2x2(&fcol, &scol) / det,
                pcoords[1] - determinant2x2(&rcol, &fcol) / det,
                0.0,
            ];

            if (next[0] - pcoords[0]).abs() < self.newton.converged && (next[1] - pcoords[1]).abs() < self.newton.converged {
                return Some(next);
            }
            if next[0].abs() > self.newton.diverged || next[1].abs() > self.newton.diverged {
                tracing::debug!(iteration, "quad inverse mapping diverged");
                return None;
            }
            pcoords = next;
        }
        tracing::debug!(max_iterations = self.newton.max_iterations, "quad inverse mapping did not converge");
        None
    }

    /// Closest boundary point for a query outside the parametric square.
    fn closest_outside(&self, x: &[f64; 3], pcoords: &[f64; 3]) -> ([f64; 3], f64) {
        let p = &self.points;
        let (r, s) = (pcoords[0], pcoords[1]);
        let corner = match (r < 0.0, r > 1.0, s < 0.0, s > 1.0) {
            (true, _, true, _) => Some(0),
            (_, true, true, _) => Some(1),
            (_, true, _, true) => Some(2),
            (true, _, _, true) => Some(3),
            _ => None,
        };
        if let Some(c) = corner {
            return (p[c], distance2(x, &p[c]));
        }
        let (a, b) = if r < 0.0 {
            (3, 0)
        } else if r > 1.0 {
            (1, 2)
        } else if s < 0.0 {
            (0, 1)
        } else {
            (2, 3)
        };
        let proj = distance_to_line(x, &p[a], &p[b]);
        (proj.closest, proj.dist2)
    }

    fn cut_cell<'c>(&'c self, scalars: &'c [f64]) -> CutCell<'c> {
        CutCell {
            points: &self.points,
            ids: &self.ids,
            scalars,
            edges: &tables::QUAD_EDGES,
        }
    }
}

impl Cell for Quad {
    fn kind(&self) -> CellKind {
        CellKind::Quad
    }

    fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn point_ids(&self) -> &[i64] {
        &self.ids
    }

    fn parametric_coords(&self) -> Vec<[f64; 3]> {
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
    }

    fn parametric_center(&self) -> [f64; 3] {
        [0.5, 0.5, 0.0]
    }

    fn interpolation_functions(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        Self::shape_functions(pcoords).to_vec()
    }

    fn interpolation_derivs(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        Self::shape_derivatives(pcoords).to_vec()
    }

    fn evaluate_position(&self, x: &[f64; 3]) -> PositionEval {
        let Some(normal) = compute_normal(&self.points) else {
            tracing::debug!("degenerate quad in inverse mapping");
            return PositionEval::failed(4);
        };
        let cp = project_point(x, &self.points[0], &normal);
        let Some(pcoords) = self.invert(&cp, dominant_axis(&normal)) else {
            return PositionEval::failed(4);
        };
        let weights = Self::shape_functions(&pcoords).to_vec();

        let range = -Self::INSIDE_TOLERANCE..=1.0 + Self::INSIDE_TOLERANCE;
        if range.contains(&pcoords[0]) && range.contains(&pcoords[1]) {
            return PositionEval {
                location: Location::Inside,
                pcoords,
                weights,
                closest: cp,
                dist2: distance2(&cp, x),
                sub_id: 0,
            };
        }

        let (closest, dist2) = self.closest_outside(x, &pcoords);
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
        contour::contour_cell(&self.cut_cell(scalars), &tables::QUAD_CONTOUR, value, 1, ctx, out);
    }

    fn clip(&self, value: f64, scalars: &[f64], inside_out: bool, ctx: &mut CutContext, out: &mut CellArray) {
        contour::clip_cell(&self.cut_cell(scalars), &tables::QUAD_CLIP, value, inside_out, 2, ctx, out);
    }

    fn intersect_with_line(&self, p1: &[f64; 3], p2: &[f64; 3], tol: f64) -> Option<LineHit> {
        let p = &self.points;
        let hit = self
            .diagonal_triangles()
            .iter()
            .filter_map(|&[a, b, c]| triangle::intersect_triangle(&p[a], &p[b], &p[c], p1, p2, tol))
            .min_by(|u, v| u.t.total_cmp(&v.t))?;
        let pcoords = self.evaluate_position(&hit.x).pcoords;
        Some(LineHit { t: hit.t, x: hit.x, pcoords, sub_id: 0 })
    }

    fn triangulate(&self) -> Result<Vec<usize>, KernelError> {
        Ok(self.diagonal_triangles().concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_corner_and_edge() {
        let quad = Quad::from_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]);
        let corner = quad.evaluate_position(&[2.0, 2.0, 0.0]);
        assert_eq!(corner.location, Location::Outside);
        assert_eq!(corner.closest, [1.0, 1.0, 0.0]);
        assert!((corner.dist2 - 2.0).abs() < 1e-9);

        let edge = quad.evaluate_position(&[0.5, -1.0, 0.0]);
        assert_eq!(edge.location, Location::Outside);
        assert!((edge.closest[0] - 0.5).abs() < 1e-9 && edge.closest[1].abs() < 1e-9);
    }

    #[test]
    fn test_warped_quad_round_trip() {
        let quad = Quad::from_points([[0.0, 0.0, 0.0], [2.0, 0.0, 0.1], [2.5, 1.5, 0.0], [-0.2, 1.0, 0.1]]);
        // Slight non-planarity: compare within the projected plane.
        let eval = quad.evaluate_position(&quad.evaluate_location(&[0.3, 0.6, 0.0]).0);
        assert_eq!(eval.location, Location::Inside);
    }

    #[test]
    fn test_zero_iterations_fail() {
        let quad = Quad::from_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]])
            .with_newton(NewtonSettings { max_iterations: 0, ..Quad::NEWTON });
        assert_eq!(quad.evaluate_position(&[0.5, 0.5, 0.0]).location, Location::Failed);
    }
}
