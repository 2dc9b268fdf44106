pub mod interpolation;
pub mod point_in_polygon;
pub mod triangulate;

use crate::bounds::BoundingBox;
use crate::cell::line::distance_to_loop;
use crate::cell::{Cell, CellKind, LineHit, Location, PositionEval};
use crate::contour;
use crate::error::KernelError;
use crate::implicit::plane::{intersect_line_plane, project_point, LinePlane};
use crate::locator::{CellArray, CutContext};
use crate::math::{add_scaled, cross, distance2, dot, normalize, scale, sub};

pub use interpolation::{InverseDistanceWeights, MeanValueWeights, PolygonInterpolation, WeightStrategy};
pub use point_in_polygon::{point_in_polygon, query_rng, PolygonLocation};
pub use triangulate::{ear_cut, non_degenerate_ear_cut};

/// Unit normal of a planar polygon, summed over triangles anchored at vertex 0.
///
/// `None` for fewer than three points or when every vertex is colinear.
pub fn compute_normal(points: &[[f64; 3]]) -> Option<[f64; 3]> {
    if points.len() < 3 {
        return None;
    }
    let anchor = &points[0];
    let mut n = [0.0; 3];
    for w in points[1..].windows(2) {
        let c = cross(&sub(&w[0], anchor), &sub(&w[1], anchor));
        n = add_scaled(&n, &c, 1.0);
    }
    if normalize(&mut n) == 0.0 {
        None
    } else {
        Some(n)
    }
}

/// Local planar frame of a polygon.
///
/// `origin + s * p10 + t * p20` spans the polygon's bounding rectangle in the
/// frame for `s, t` in [0, 1]. `p10` follows the first edge, `p20` is
/// `normal x p10`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolygonFrame {
    pub origin: [f64; 3],
    pub p10: [f64; 3],
    pub p20: [f64; 3],
    pub normal: [f64; 3],
}

impl PolygonFrame {
    pub fn to_parametric(&self, x: &[f64; 3]) -> [f64; 3] {
        let d = sub(x, &self.origin);
        [dot(&d, &self.p10) / dot(&self.p10, &self.p10), dot(&d, &self.p20) / dot(&self.p20, &self.p20), 0.0]
    }

    pub fn to_world(&self, pcoords: &[f64; 3]) -> [f64; 3] {
        let x = add_scaled(&self.origin, &self.p10, pcoords[0]);
        add_scaled(&x, &self.p20, pcoords[1])
    }
}

/// Planar polygon with any number of vertices (at least three).
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    points: Vec<[f64; 3]>,
    ids: Vec<i64>,
    interpolation: PolygonInterpolation,
    tolerance: f64,
    seed: u64,
}

impl Polygon {
    /// # Panics
    ///
    /// If `ids` and `points` differ in length.
    pub fn new(points: Vec<[f64; 3]>, ids: Vec<i64>) -> Result<Self, KernelError> {
        assert_eq!(points.len(), ids.len(), "one id per polygon vertex");
        if points.len() < 3 {
            return Err(KernelError::TooFewPoints { expected: 3, found: points.len() });
        }
        Ok(Self {
            points,
            ids,
            interpolation: PolygonInterpolation::default(),
            tolerance: triangulate::DEFAULT_TOLERANCE,
            seed: 0,
        })
    }

    /// Polygon with ids `0..n`.
    pub fn from_points(points: Vec<[f64; 3]>) -> Result<Self, KernelError> {
        let ids = (0..points.len() as i64).collect();
        Self::new(points, ids)
    }

    pub fn with_interpolation(mut self, interpolation: PolygonInterpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Relative merge tolerance used by triangulation.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Seed of the point classification rays.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn interpolation(&self) -> PolygonInterpolation {
        self.interpolation
    }

    pub fn normal(&self) -> Option<[f64; 3]> {
        compute_normal(&self.points)
    }

    /// Planar area (zero when degenerate).
    pub fn area(&self) -> f64 {
        let Some(n) = self.normal() else {
            return 0.0;
        };
        let anchor = &self.points[0];
        let twice: f64 = self.points[1..]
            .windows(2)
            .map(|w| dot(&cross(&sub(&w[0], anchor), &sub(&w[1], anchor)), &n))
            .sum();
        0.5 * twice.abs()
    }

    /// Area-weighted centroid; the vertex average for degenerate polygons.
    pub fn centroid(&self) -> [f64; 3] {
        let anchor = &self.points[0];
        let normal = self.normal();
        let mut sum = [0.0; 3];
        let mut total = 0.0;
        if let Some(n) = normal {
            for w in self.points[1..].windows(2) {
                let a = dot(&cross(&sub(&w[0], anchor), &sub(&w[1], anchor)), &n);
                let c = scale(&add_scaled(&add_scaled(anchor, &w[0], 1.0), &w[1], 1.0), 1.0 / 3.0);
                sum = add_scaled(&sum, &c, a);
                total += a;
            }
        }
        if total == 0.0 {
            let inv = 1.0 / self.points.len() as f64;
            return self.points.iter().fold([0.0; 3], |acc, p| add_scaled(&acc, p, inv));
        }
        scale(&sum, 1.0 / total)
    }

    /// No reflex vertex with respect to the polygon normal.
    pub fn is_convex(&self) -> bool {
        let Some(normal) = self.normal() else {
            return false;
        };
        let n = self.points.len();
        (0..n).all(|i| {
            let a = &self.points[(i + n - 1) % n];
            let b = &self.points[i];
            let c = &self.points[(i + 1) % n];
            dot(&cross(&sub(b, a), &sub(c, b)), &normal) >= 0.0
        })
    }

    /// Local frame, `None` for a degenerate polygon or zero-length first edge.
    pub fn parameterize(&self) -> Option<PolygonFrame> {
        let normal = self.normal()?;
        let origin = self.points[0];
        let mut p10 = sub(&self.points[1], &origin);
        let mut p20 = cross(&normal, &p10);
        let l10 = normalize(&mut p10);
        let l20 = normalize(&mut p20);
        if l10 == 0.0 || l20 == 0.0 {
            return None;
        }

        // Bounds of the vertices in the unit frame, then stretch onto them.
        let mut sb = [0.0f64, 0.0f64];
        let mut tb = [0.0f64, 0.0f64];
        for p in &self.points[1..] {
            let d = sub(p, &origin);
            let (s, t) = (dot(&d, &p10), dot(&d, &p20));
            sb = [sb[0].min(s), sb[1].max(s)];
            tb = [tb[0].min(t), tb[1].max(t)];
        }
        if sb[1] - sb[0] == 0.0 || tb[1] - tb[0] == 0.0 {
            return None;
        }

        let origin = add_scaled(&add_scaled(&origin, &p10, sb[0]), &p20, tb[0]);
        Some(PolygonFrame {
            origin,
            p10: scale(&p10, sb[1] - sb[0]),
            p20: scale(&p20, tb[1] - tb[0]),
            normal,
        })
    }

    /// Weights of world point `x` under the configured strategy.
    pub fn weights_at(&self, x: &[f64; 3]) -> Vec<f64> {
        self.interpolation.strategy().weights(x, &self.points)
    }

    /// Classifies `x` (assumed on the polygon plane) with rays seeded from this polygon's seed.
    pub fn point_location(&self, x: &[f64; 3]) -> PolygonLocation {
        let Some(normal) = self.normal() else {
            return PolygonLocation::Failure;
        };
        let bounds = self.bounds();
        let mut rng = query_rng(self.seed, x);
        point_in_polygon(x, &self.points, &bounds, &normal, &mut rng)
    }

    /// Distance from `x` to the polygon as a filled planar region.
    pub fn distance_to_polygon(&self, x: &[f64; 3]) -> f64 {
        self.evaluate_position(x).dist2.sqrt()
    }

    /// Triangulation that tolerates repeated points (pinched or self-touching loops).
    pub fn non_degenerate_triangulate(&self) -> Result<Vec<usize>, KernelError> {
        non_degenerate_ear_cut(&self.points, self.tolerance)
    }

    fn cut(&self, value: f64, scalars: &[f64], clip: Option<bool>, ctx: &mut CutContext, out: &mut CellArray) {
        match self.triangulate() {
            Ok(tris) => contour::cut_triangles(&self.points, &self.ids, scalars, &tris, value, clip, ctx, out),
            Err(err) => tracing::debug!(%err, "skipping polygon that cannot be triangulated"),
        }
    }
}

impl Cell for Polygon {
    fn kind(&self) -> CellKind {
        CellKind::Polygon
    }

    fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn point_ids(&self) -> &[i64] {
        &self.ids
    }

    fn bounds(&self) -> BoundingBox<3> {
        BoundingBox::from_points(&self.points)
    }

    fn parametric_coords(&self) -> Vec<[f64; 3]> {
        match self.parameterize() {
            Some(frame) => self.points.iter().map(|p| frame.to_parametric(p)).collect(),
            None => vec![[0.0; 3]; self.points.len()],
        }
    }

    fn parametric_center(&self) -> [f64; 3] {
        [0.5, 0.5, 0.0]
    }

    fn interpolation_functions(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        self.evaluate_location(pcoords).1
    }

    /// Central differences of the weights in the local frame.
    fn interpolation_derivs(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        const H: f64 = 1e-5;
        let n = self.points.len();
        let mut derivs = vec![0.0; 2 * n];
        for axis in 0..2 {
            let mut lo = *pcoords;
            let mut hi = *pcoords;
            lo[axis] -= H;
            hi[axis] += H;
            let wl = self.interpolation_functions(&lo);
            let wh = self.interpolation_functions(&hi);
            for i in 0..n {
                derivs[axis * n + i] = (wh[i] - wl[i]) / (2.0 * H);
            }
        }
        derivs
    }

    fn evaluate_position(&self, x: &[f64; 3]) -> PositionEval {
        let n = self.points.len();
        let Some(frame) = self.parameterize() else {
            tracing::debug!(count = n, "degenerate polygon in inverse mapping");
            return PositionEval::failed(n);
        };

        let cp = project_point(x, &self.points[0], &frame.normal);
        let pcoords = frame.to_parametric(&cp);
        let weights = self.weights_at(&cp);

        let in_frame = pcoords[..2].iter().all(|pc| (0.0..=1.0).contains(pc));
        if in_frame && self.point_location(&cp) == PolygonLocation::Inside {
            return PositionEval {
                location: Location::Inside,
                pcoords,
                weights,
                closest: cp,
                dist2: distance2(x, &cp),
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

    fn evaluate_location(&self, pcoords: &[f64; 3]) -> ([f64; 3], Vec<f64>) {
        let x = match self.parameterize() {
            Some(frame) => frame.to_world(pcoords),
            None => self.points[0],
        };
        let weights = self.weights_at(&x);
        (x, weights)
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
            LinePlane::Within { t, x } => (t, x),
            _ => return None,
        };
        let eval = self.evaluate_position(&x);
        match eval.location {
            Location::Inside => Some(LineHit { t, x, pcoords: eval.pcoords, sub_id: 0 }),
            Location::Outside if eval.dist2 <= tol * tol => Some(LineHit { t, x, pcoords: eval.pcoords, sub_id: 0 }),
            _ => None,
        }
    }

    fn triangulate(&self) -> Result<Vec<usize>, KernelError> {
        ear_cut(&self.points, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> Polygon {
        Polygon::from_points(vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_too_few_points() {
        let err = Polygon::from_points(vec![[0.0; 3], [1.0, 0.0, 0.0]]).unwrap_err();
        assert_eq!(err, KernelError::TooFewPoints { expected: 3, found: 2 });
    }

    #[test]
    fn test_area_and_convexity() {
        let poly = l_shape();
        assert!((poly.area() - 3.0).abs() < 1e-12);
        assert!(!poly.is_convex());
        let c = poly.centroid();
        assert!((c[0] - 5.0 / 6.0).abs() < 1e-12 && (c[1] - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_frame_spans_bounds() {
        let poly = l_shape();
        let frame = poly.parameterize().unwrap();
        assert_eq!(frame.to_parametric(&[2.0, 2.0, 0.0]), [1.0, 1.0, 0.0]);
        assert_eq!(frame.to_world(&[0.5, 0.5, 0.0]), [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_notch_is_outside() {
        let poly = l_shape().with_seed(11);
        let eval = poly.evaluate_position(&[1.5, 1.5, 0.0]);
        assert_eq!(eval.location, Location::Outside);
        assert!((eval.dist2 - 0.25).abs() < 1e-12);
        assert_eq!(poly.evaluate_position(&[0.5, 1.5, 0.0]).location, Location::Inside);
    }

    #[test]
    fn test_normal_of_clockwise_loop_points_down() {
        let n = compute_normal(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]]).unwrap();
        assert_eq!(n, [0.0, 0.0, -1.0]);
    }
}
