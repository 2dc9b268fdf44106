use crate::cell::line::distance_to_loop;
use crate::cell::{Cell, CellKind, LineHit, Location, PositionEval};
use crate::contour::{self, tables, CutCell};
use crate::error::KernelError;
use crate::implicit::plane::{intersect_line_plane, LinePlane};
use crate::locator::{CellArray, CutContext};
use crate::math::{add_scaled, cross, determinant2x2, distance2, dominant_axis, dot, norm, normalize, sub};

/// Linear triangle. Parametric origin at vertex 0, `r` toward vertex 1, `s` toward vertex 2.
#[derive(Clone, Debug, PartialEq)]
pub struct Triangle {
    pub(crate) points: [[f64; 3]; 3],
    pub(crate) ids: [i64; 3],
}

/// Hit of a segment against a bare triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TriangleHit {
    pub t: f64,
    pub x: [f64; 3],
    pub pcoords: [f64; 3],
}

/// Unit normal of triangle `a b c`, `None` when degenerate.
pub fn triangle_normal(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3]) -> Option<[f64; 3]> {
    let mut n = cross(&sub(b, a), &sub(c, a));
    if normalize(&mut n) == 0.0 {
        None
    } else {
        Some(n)
    }
}

pub fn triangle_area(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3]) -> f64 {
    0.5 * norm(&cross(&sub(b, a), &sub(c, a)))
}

/// Parametric coordinates `(r, s)` of the projection of `x` onto the triangle plane.
///
/// Solves the 2x2 system on the two axes not dominated by `normal`.
fn barycentric(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3], normal: &[f64; 3], x: &[f64; 3]) -> Option<[f64; 2]> {
    let axis = dominant_axis(normal);
    let (i, j) = match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    };
    let c1 = [b[i] - a[i], b[j] - a[j]];
    let c2 = [c[i] - a[i], c[j] - a[j]];
    let rhs = [x[i] - a[i], x[j] - a[j]];
    let det = determinant2x2(&c1, &c2);
    if det == 0.0 {
        return None;
    }
    Some([determinant2x2(&rhs, &c2) / det, determinant2x2(&c1, &rhs) / det])
}

/// Segment `p1-p2` against triangle `a b c`.
///
/// Crossings that miss the triangle by at most `tol` still count.
pub(crate) fn intersect_triangle(
    a: &[f64; 3],
    b: &[f64; 3],
    c: &[f64; 3],
    p1: &[f64; 3],
    p2: &[f64; 3],
    tol: f64,
) -> Option<TriangleHit> {
    let normal = triangle_normal(a, b, c)?;
    let (t, x) = match intersect_line_plane(p1, p2, &normal, a) {
        LinePlane::Within { t, x } => (t, x),
        _ => return None,
    };

    let [r, s] = barycentric(a, b, c, &normal, &x)?;
    let weights = [1.0 - r - s, r, s];
    if weights.iter().all(|&w| (0.0..=1.0).contains(&w)) {
        return Some(TriangleHit { t, x, pcoords: [r, s, 0.0] });
    }

    let edge = distance_to_loop(&x, &[*a, *b, *c]);
    if edge.dist2 <= tol * tol {
        Some(TriangleHit { t, x, pcoords: [r, s, 0.0] })
    } else {
        None
    }
}

impl Triangle {
    pub fn new(points: [[f64; 3]; 3], ids: [i64; 3]) -> Self {
        Self { points, ids }
    }

    /// Triangle with ids `0..3`.
    pub fn from_points(points: [[f64; 3]; 3]) -> Self {
        Self::new(points, [0, 1, 2])
    }

    pub fn shape_functions(pcoords: &[f64; 3]) -> [f64; 3] {
        [1.0 - pcoords[0] - pcoords[1], pcoords[0], pcoords[1]]
    }

    pub fn shape_derivatives(_pcoords: &[f64; 3]) -> [f64; 6] {
        [-1.0, 1.0, 0.0, -1.0, 0.0, 1.0]
    }

    pub fn normal(&self) -> Option<[f64; 3]> {
        triangle_normal(&self.points[0], &self.points[1], &self.points[2])
    }

    pub fn area(&self) -> f64 {
        triangle_area(&self.points[0], &self.points[1], &self.points[2])
    }

    fn cut_cell<'c>(&'c self, scalars: &'c [f64]) -> CutCell<'c> {
        CutCell {
            points: &self.points,
            ids: &self.ids,
            scalars,
            edges: &tables::TRIANGLE_EDGES,
        }
    }
}

impl Cell for Triangle {
    fn kind(&self) -> CellKind {
        CellKind::Triangle
    }

    fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn point_ids(&self) -> &[i64] {
        &self.ids
    }

    fn parametric_coords(&self) -> Vec<[f64; 3]> {
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
    }

    fn parametric_center(&self) -> [f64; 3] {
        [1.0 / 3.0, 1.0 / 3.0, 0.0]
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
        let [a, b, c] = &self.points;
        let Some(normal) = self.normal() else {
            tracing::debug!("degenerate triangle in inverse mapping");
            return PositionEval::failed(3);
        };

        // Project onto the triangle plane.
        let cp = add_scaled(x, &normal, -dot(&normal, &sub(x, a)));
        let Some([r, s]) = barycentric(a, b, c, &normal, &cp) else {
            return PositionEval::failed(3);
        };
        let pcoords = [r, s, 0.0];
        let weights = Self::shape_functions(&pcoords).to_vec();

        if weights.iter().all(|&w| (0.0..=1.0).contains(&w)) {
            return PositionEval {
                location: Location::Inside,
                pcoords,
                weights,
                closest: cp,
                dist2: distance2(&cp, x),
                sub_id: 0,
            };
        }

        let edge = distance_to_loop(x, &self.points);
        PositionEval {
            location: Location::Outside,
            pcoords,
            weights,
            closest: edge.closest,
            dist2: edge.dist2,
            sub_id: 0,
        }
    }

    fn contour(&self, value: f64, scalars: &[f64], ctx: &mut CutContext, out: &mut CellArray) {
        contour::contour_cell(&self.cut_cell(scalars), &tables::TRIANGLE_CONTOUR, value, 1, ctx, out);
    }

    fn clip(&self, value: f64, scalars: &[f64], inside_out: bool, ctx: &mut CutContext, out: &mut CellArray) {
        contour::clip_cell(&self.cut_cell(scalars), &tables::TRIANGLE_CLIP, value, inside_out, 2, ctx, out);
    }

    fn intersect_with_line(&self, p1: &[f64; 3], p2: &[f64; 3], tol: f64) -> Option<LineHit> {
        let [a, b, c] = &self.points;
        intersect_triangle(a, b, c, p1, p2, tol).map(|hit| LineHit {
            t: hit.t,
            x: hit.x,
            pcoords: hit.pcoords,
            sub_id: 0,
        })
    }

    fn triangulate(&self) -> Result<Vec<usize>, KernelError> {
        Ok(vec![0, 1, 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn right_triangle() -> Triangle {
        Triangle::from_points([[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]])
    }

    #[test]
    fn test_inverse_mapping_inside() {
        let tri = right_triangle();
        let eval = tri.evaluate_position(&[0.5, 0.5, 1.0]);
        assert_eq!(eval.location, Location::Inside);
        assert!((eval.pcoords[0] - 0.25).abs() < 1e-12);
        assert!((eval.pcoords[1] - 0.25).abs() < 1e-12);
        assert!((eval.dist2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_mapping_outside_uses_edges() {
        let tri = right_triangle();
        let eval = tri.evaluate_position(&[3.0, 0.0, 0.0]);
        assert_eq!(eval.location, Location::Outside);
        assert_eq!(eval.closest, [2.0, 0.0, 0.0]);
        assert!((eval.dist2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_hits_within_tolerance() {
        let tri = right_triangle();
        let hit = tri.intersect_with_line(&[0.5, 0.5, 1.0], &[0.5, 0.5, -1.0], 0.0);
        assert!(hit.is_some_and(|h| (h.t - 0.5).abs() < 1e-12));
        // Just past the hypotenuse.
        let near = [1.0 + 1e-4, 1.0, 1.0];
        assert!(tri.intersect_with_line(&near, &[near[0], near[1], -1.0], 1e-3).is_some());
        assert!(tri.intersect_with_line(&near, &[near[0], near[1], -1.0], 1e-6).is_none());
    }

    #[test]
    fn test_degenerate_triangle_fails() {
        let tri = Triangle::from_points([[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert_eq!(tri.evaluate_position(&[0.5, 0.0, 0.0]).location, Location::Failed);
    }
}
