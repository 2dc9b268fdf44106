use crate::cell::{intersect_faces, newton_3d, split_along_02, Cell, CellKind, LineHit, Location, NewtonSettings, PositionEval};
use crate::contour::{self, tables, CutCell};
use crate::error::KernelError;
use crate::locator::{CellArray, CutContext};
use crate::math::{distance2, scale};

/// Five-node pyramid: quadrilateral base `0-1-2-3` and apex `4`.
#[derive(Clone, Debug, PartialEq)]
pub struct Pyramid {
    pub(crate) points: [[f64; 3]; 5],
    pub(crate) ids: [i64; 5],
    newton: NewtonSettings,
}

impl Pyramid {
    pub const NEWTON: NewtonSettings = NewtonSettings {
        max_iterations: 10,
        converged: 1e-4,
        diverged: 1e6,
    };

    /// Relative radius around the apex where inverse mapping short-circuits.
    pub const APEX_TOLERANCE: f64 = 1e-3;

    pub const INSIDE_TOLERANCE: f64 = 1e-3;

    pub fn new(points: [[f64; 3]; 5], ids: [i64; 5]) -> Self {
        Self { points, ids, newton: Self::NEWTON }
    }

    /// Pyramid with ids `0..5`.
    pub fn from_points(points: [[f64; 3]; 5]) -> Self {
        Self::new(points, [0, 1, 2, 3, 4])
    }

    pub fn with_newton(mut self, newton: NewtonSettings) -> Self {
        self.newton = newton;
        self
    }

    pub fn shape_functions(pcoords: &[f64; 3]) -> [f64; 5] {
        let (r, s, t) = (pcoords[0], pcoords[1], pcoords[2]);
        let (rm, sm, tm) = (1.0 - r, 1.0 - s, 1.0 - t);
        [rm * sm * tm, r * sm * tm, r * s * tm, rm * s * tm, t]
    }

    /// d/dr for the five vertices, then d/ds, then d/dt.
    pub fn shape_derivatives(pcoords: &[f64; 3]) -> [f64; 15] {
        let (r, s, t) = (pcoords[0], pcoords[1], pcoords[2]);
        let (rm, sm, tm) = (1.0 - r, 1.0 - s, 1.0 - t);
        [
            -sm * tm, sm * tm, s * tm, -s * tm, 0.0, // d/dr
            -rm * tm, -r * tm, r * tm, rm * tm, 0.0, // d/ds
            -rm * sm, -r * sm, -r * s, -rm * s, 1.0, // d/dt
        ]
    }

    fn base_center(&self) -> [f64; 3] {
        let p = &self.points;
        let mut c = [0.0; 3];
        for k in 0..3 {
            c[k] = p[0][k] + p[1][k] + p[2][k] + p[3][k];
        }
        scale(&c, 0.25)
    }

    fn inside(pcoords: &[f64; 3]) -> bool {
        pcoords.iter().all(|&pc| pc >= -Self::INSIDE_TOLERANCE && pc <= 1.0 + Self::INSIDE_TOLERANCE)
    }
}

impl Cell for Pyramid {
    fn kind(&self) -> CellKind {
        CellKind::Pyramid
    }

    fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn point_ids(&self) -> &[i64] {
        &self.ids
    }

    fn parametric_coords(&self) -> Vec<[f64; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.5, 0.5, 1.0],
        ]
    }

    fn parametric_center(&self) -> [f64; 3] {
        [0.4, 0.4, 0.2]
    }

    fn interpolation_functions(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        Self::shape_functions(pcoords).to_vec()
    }

    fn interpolation_derivs(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        Self::shape_derivatives(pcoords).to_vec()
    }

    fn evaluate_position(&self, x: &[f64; 3]) -> PositionEval {
        // The Jacobian is singular at the apex: answer it directly.
        let apex = &self.points[4];
        let height2 = distance2(apex, &self.base_center());
        if distance2(x, apex) < Self::APEX_TOLERANCE * Self::APEX_TOLERANCE * height2 {
            let pcoords = [0.5, 0.5, 1.0];
            return PositionEval {
                location: Location::Inside,
                pcoords,
                weights: Self::shape_functions(&pcoords).to_vec(),
                closest: *x,
                dist2: 0.0,
                sub_id: 0,
            };
        }

        let shape = |pc: &[f64; 3]| (Self::shape_functions(pc).to_vec(), Self::shape_derivatives(pc).to_vec());
        let Some(pcoords) = newton_3d(&self.points, x, self.parametric_center(), &self.newton, shape) else {
            return PositionEval::failed(5);
        };
        let weights = Self::shape_functions(&pcoords).to_vec();

        if Self::inside(&pcoords) {
            return PositionEval {
                location: Location::Inside,
                pcoords,
                weights,
                closest: *x,
                dist2: 0.0,
                sub_id: 0,
            };
        }

        let clamped = pcoords.map(|pc| pc.clamp(0.0, 1.0));
        let (closest, _) = self.evaluate_location(&clamped);
        PositionEval {
            location: Location::Outside,
            pcoords,
            weights,
            closest,
            dist2: distance2(&closest, x),
            sub_id: 0,
        }
    }

    fn contour(&self, value: f64, scalars: &[f64], ctx: &mut CutContext, out: &mut CellArray) {
        let cell = CutCell {
            points: &self.points,
            ids: &self.ids,
            scalars,
            edges: &tables::PYRAMID_EDGES,
        };
        contour::contour_cell(&cell, &tables::PYRAMID_CONTOUR, value, 2, ctx, out);
    }

    fn clip(&self, value: f64, scalars: &[f64], inside_out: bool, ctx: &mut CutContext, out: &mut CellArray) {
        match self.triangulate() {
            Ok(tets) => contour::clip_tetrahedra(&self.points, &self.ids, scalars, &tets, value, inside_out, ctx, out),
            Err(err) => tracing::debug!(%err, "skipping pyramid clip"),
        }
    }

    fn intersect_with_line(&self, p1: &[f64; 3], p2: &[f64; 3], tol: f64) -> Option<LineHit> {
        let (t, x, face) = intersect_faces(&self.points, &self.ids, &tables::PYRAMID_FACES, p1, p2, tol)?;
        let pcoords = self.evaluate_position(&x).pcoords;
        Some(LineHit { t, x, pcoords, sub_id: face })
    }

    /// Two tetrahedra sharing the base diagonal that [`split_along_02`] picks.
    fn triangulate(&self) -> Result<Vec<usize>, KernelError> {
        let p = &self.points;
        let ids = [self.ids[0], self.ids[1], self.ids[2], self.ids[3]];
        if split_along_02([&p[0], &p[1], &p[2], &p[3]], ids) {
            Ok(vec![0, 1, 2, 4, 0, 2, 3, 4])
        } else {
            Ok(vec![0, 1, 3, 4, 1, 2, 3, 4])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_pyramid() -> Pyramid {
        Pyramid::from_points([
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.5, 0.5, 1.0],
        ])
    }

    #[test]
    fn test_apex_short_circuit() {
        let eval = unit_pyramid().evaluate_position(&[0.5, 0.5, 1.0 - 1e-5]);
        assert_eq!(eval.location, Location::Inside);
        assert_eq!(eval.pcoords, [0.5, 0.5, 1.0]);
        assert!((eval.weights[4] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_interior_round_trip() {
        let pyr = unit_pyramid();
        let pc = [0.3, 0.6, 0.4];
        let (x, _) = pyr.evaluate_location(&pc);
        let eval = pyr.evaluate_position(&x);
        assert_eq!(eval.location, Location::Inside);
        for k in 0..3 {
            assert!((eval.pcoords[k] - pc[k]).abs() < 1e-4, "component {} = {}", k, eval.pcoords[k]);
        }
    }

    #[test]
    fn test_outside_below_base() {
        let eval = unit_pyramid().evaluate_position(&[0.5, 0.5, -0.5]);
        assert_eq!(eval.location, Location::Outside);
        assert!((eval.dist2 - 0.25).abs() < 1e-6);
    }
}
