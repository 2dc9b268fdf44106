use crate::cell::line::{segment_intersection, SegmentIntersection};
use crate::cell::{split_along_02, Cell, CellKind, LineHit, Location, PositionEval};
use crate::contour::{self, tables, CutCell};
use crate::error::KernelError;
use crate::implicit::plane::{evaluate_plane, intersect_line_plane, project_point, LinePlane};
use crate::locator::{CellArray, CutContext};
use crate::math::{add_scaled, cross, distance2, dot, normalize, sub};

/// Pixel vertex order mapped onto counterclockwise quad order.
const QUAD_ORDER: [usize; 4] = [0, 1, 3, 2];

/// Axis-aligned rectangle. Vertex order is `(x0, y0)`, `(x1, y0)`, `(x0, y1)`, `(x1, y1)`
/// in the rectangle's own frame, so parametric coordinates are closed form.
#[derive(Clone, Debug, PartialEq)]
pub struct Pixel {
    pub(crate) points: [[f64; 3]; 4],
    pub(crate) ids: [i64; 4],
}

impl Pixel {
    pub fn new(points: [[f64; 3]; 4], ids: [i64; 4]) -> Self {
        Self { points, ids }
    }

    /// Pixel with ids `0..4`.
    pub fn from_points(points: [[f64; 3]; 4]) -> Self {
        Self::new(points, [0, 1, 2, 3])
    }

    pub fn shape_functions(pcoords: &[f64; 3]) -> [f64; 4] {
        let (r, s) = (pcoords[0], pcoords[1]);
        let (rm, sm) = (1.0 - r, 1.0 - s);
        [rm * sm, r * sm, rm * s, r * s]
    }

    pub fn shape_derivatives(pcoords: &[f64; 3]) -> [f64; 8] {
        let (r, s) = (pcoords[0], pcoords[1]);
        let (rm, sm) = (1.0 - r, 1.0 - s);
        [-sm, sm, -s, s, -rm, -r, rm, r]
    }

    pub fn normal(&self) -> Option<[f64; 3]> {
        let mut n = cross(&sub(&self.points[1], &self.points[0]), &sub(&self.points[2], &self.points[0]));
        if normalize(&mut n) == 0.0 {
            None
        } else {
            Some(n)
        }
    }

    fn quad_ordered<T: Copy>(values: &[T]) -> [T; 4] {
        QUAD_ORDER.map(|i| values[i])
    }

    /// Parametric coordinates of a point already in the pixel plane.
    fn pcoords_of(&self, cp: &[f64; 3]) -> Option<[f64; 3]> {
        let p21 = sub(&self.points[1], &self.points[0]);
        let p31 = sub(&self.points[2], &self.points[0]);
        let (l21, l31) = (dot(&p21, &p21), dot(&p31, &p31));
        if l21 == 0.0 || l31 == 0.0 {
            return None;
        }
        let d = sub(cp, &self.points[0]);
        Some([dot(&p21, &d) / l21, dot(&p31, &d) / l31, 0.0])
    }

    fn contains_in_plane(&self, x: &[f64; 3]) -> bool {
        self.pcoords_of(x)
            .is_some_and(|pc| (0.0..=1.0).contains(&pc[0]) && (0.0..=1.0).contains(&pc[1]))
    }

    /// Segment lying in the pixel plane: its start if inside, else the first boundary crossing.
    fn intersect_coplanar(&self, p1: &[f64; 3], p2: &[f64; 3]) -> Option<(f64, [f64; 3])> {
        if self.contains_in_plane(p1) {
            return Some((0.0, *p1));
        }
        let boundary = Self::quad_ordered(&self.points);
        (0..4)
            .filter_map(|k| match segment_intersection(p1, p2, &boundary[k], &boundary[(k + 1) % 4]) {
                SegmentIntersection::Intersect { u, .. } => Some(u),
                _ => None,
            })
            .min_by(f64::total_cmp)
            .map(|u| (u, add_scaled(p1, &sub(p2, p1), u)))
    }

    fn cut(&self, value: f64, scalars: &[f64], clip: Option<bool>, ctx: &mut CutContext, out: &mut CellArray) {
        let points = Self::quad_ordered(&self.points);
        let ids = Self::quad_ordered(&self.ids);
        let s = Self::quad_ordered(scalars);
        let cell = CutCell {
            points: &points,
            ids: &ids,
            scalars: &s,
            edges: &tables::QUAD_EDGES,
        };
        match clip {
            None => contour::contour_cell(&cell, &tables::QUAD_CONTOUR, value, 1, ctx, out),
            Some(inside_out) => contour::clip_cell(&cell, &tables::QUAD_CLIP, value, inside_out, 2, ctx, out),
        }
    }
}

impl Cell for Pixel {
    fn kind(&self) -> CellKind {
        CellKind::Pixel
    }

    fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn point_ids(&self) -> &[i64] {
        &self.ids
    }

    fn parametric_coords(&self) -> Vec<[f64; 3]> {
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]
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
        let Some(normal) = self.normal() else {
            tracing::debug!("degenerate pixel in inverse mapping");
            return PositionEval::failed(4);
        };
        let cp = project_point(x, &self.points[0], &normal);
        let Some(pcoords) = self.pcoords_of(&cp) else {
            return PositionEval::failed(4);
        };
        let weights = Self::shape_functions(&pcoords).to_vec();

        if (0.0..=1.0).contains(&pcoords[0]) && (0.0..=1.0).contains(&pcoords[1]) {
            return PositionEval {
                location: Location::Inside,
                pcoords,
                weights,
                closest: cp,
                dist2: distance2(&cp, x),
                sub_id: 0,
            };
        }

        let clamped = [pcoords[0].clamp(0.0, 1.0), pcoords[1].clamp(0.0, 1.0), 0.0];
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
        self.cut(value, scalars, None, ctx, out);
    }

    fn clip(&self, value: f64, scalars: &[f64], inside_out: bool, ctx: &mut CutContext, out: &mut CellArray) {
        self.cut(value, scalars, Some(inside_out), ctx, out);
    }

    fn intersect_with_line(&self, p1: &[f64; 3], p2: &[f64; 3], tol: f64) -> Option<LineHit> {
        let normal = self.normal()?;
        let (t, x) = match intersect_line_plane(p1, p2, &normal, &self.points[0]) {
            LinePlane::Within { t, x } => {
                let eval = self.evaluate_position(&x);
                if eval.location == Location::Failed || eval.dist2 > tol * tol {
                    return None;
                }
                (t, x)
            }
            LinePlane::Parallel if evaluate_plane(&normal, &self.points[0], p1).abs() <= tol => {
                self.intersect_coplanar(p1, p2)?
            }
            _ => return None,
        };
        let pcoords = self.pcoords_of(&x)?;
        Some(LineHit { t, x, pcoords, sub_id: 0 })
    }

    fn triangulate(&self) -> Result<Vec<usize>, KernelError> {
        let p = &self.points;
        // Same diagonal rule as quads, in counterclockwise order 0-1-3-2.
        if split_along_02([&p[0], &p[1], &p[3], &p[2]], Self::quad_ordered(&self.ids)) {
            Ok(vec![0, 1, 3, 0, 3, 2])
        } else {
            Ok(vec![0, 1, 2, 1, 3, 2])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_pixel() -> Pixel {
        Pixel::from_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]])
    }

    #[test]
    fn test_closed_form_pcoords() {
        let eval = unit_pixel().evaluate_position(&[0.25, 0.75, 2.0]);
        assert_eq!(eval.location, Location::Inside);
        assert_eq!(eval.pcoords, [0.25, 0.75, 0.0]);
        assert!((eval.dist2 - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_outside_is_clamped() {
        let eval = unit_pixel().evaluate_position(&[1.5, 0.5, 0.0]);
        assert_eq!(eval.location, Location::Outside);
        assert_eq!(eval.closest, [1.0, 0.5, 0.0]);
        assert!((eval.dist2 - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_coplanar_segment() {
        let px = unit_pixel();
        let hit = px.intersect_with_line(&[-1.0, 0.5, 0.0], &[1.0, 0.5, 0.0], 1e-6).unwrap();
        assert!((hit.t - 0.5).abs() < 1e-12);
        assert!(hit.x[0].abs() < 1e-12);

        let inside = px.intersect_with_line(&[0.5, 0.5, 0.0], &[2.0, 0.5, 0.0], 1e-6).unwrap();
        assert_eq!(inside.t, 0.0);
    }

    #[test]
    fn test_crossing_segment() {
        let hit = unit_pixel().intersect_with_line(&[0.2, 0.3, 1.0], &[0.2, 0.3, -3.0], 1e-6).unwrap();
        assert!((hit.t - 0.25).abs() < 1e-12);
        assert!((hit.pcoords[0] - 0.2).abs() < 1e-12 && (hit.pcoords[1] - 0.3).abs() < 1e-12);
        assert!(unit_pixel().intersect_with_line(&[2.0, 0.3, 1.0], &[2.0, 0.3, -1.0], 1e-6).is_none());
    }
}
