use crate::bounds::BoundingBox;
use crate::cell::line::distance_to_loop;
use crate::cell::polygon::{compute_normal, point_in_polygon, query_rng, PolygonLocation};
use crate::error::KernelError;
use crate::implicit::plane::project_point;
use crate::implicit::ImplicitFunction;
use crate::math::{add_scaled, normalize};

/// Loop points projected onto their best plane, rebuilt whenever the loop changes.
#[derive(Clone, Debug, PartialEq)]
struct LoopProjection {
    origin: [f64; 3],
    normal: [f64; 3],
    points: Vec<[f64; 3]>,
    bounds: BoundingBox<3>,
    /// Forward-difference step per axis.
    deltas: [f64; 3],
}

impl LoopProjection {
    fn build(points: &[[f64; 3]], normal: Option<[f64; 3]>) -> Result<Self, KernelError> {
        if points.is_empty() {
            return Err(KernelError::EmptyLoop);
        }
        if points.len() < 3 {
            return Err(KernelError::TooFewPoints { expected: 3, found: points.len() });
        }

        let normal = match normal {
            Some(mut n) => {
                if normalize(&mut n) == 0.0 {
                    return Err(KernelError::DegenerateNormal);
                }
                n
            }
            None => compute_normal(points).ok_or(KernelError::DegenerateNormal)?,
        };

        let inv = 1.0 / points.len() as f64;
        let origin = points.iter().fold([0.0; 3], |acc, p| add_scaled(&acc, p, inv));
        let projected: Vec<[f64; 3]> = points.iter().map(|p| project_point(p, &origin, &normal)).collect();
        let bounds = BoundingBox::from_points(&projected);

        let extents = [bounds.length(0), bounds.length(1), bounds.length(2)];
        let largest = extents.iter().copied().fold(0.0, f64::max);
        if largest == 0.0 {
            return Err(KernelError::DegenerateNormal);
        }
        let deltas = extents.map(|e| if e > 0.0 { e / 100.0 } else { largest / 100.0 });

        Ok(Self { origin, normal, points: projected, bounds, deltas })
    }
}

/// Implicit region bounded by a closed loop of points.
///
/// The loop is projected onto a plane (its own average normal, or one given by
/// the caller). A query is projected onto the same plane; its value is the
/// in-plane distance to the nearest loop edge, negated when the projection
/// falls inside the loop. The region is therefore an infinite prism swept
/// along the loop normal.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionLoop {
    points: Vec<[f64; 3]>,
    automatic_normal: bool,
    normal: [f64; 3],
    seed: u64,
    projection: Result<LoopProjection, KernelError>,
}

impl Default for SelectionLoop {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SelectionLoop {
    pub fn new(points: Vec<[f64; 3]>) -> Self {
        let mut selection = Self {
            points,
            automatic_normal: true,
            normal: [0.0, 0.0, 1.0],
            seed: 0,
            projection: Err(KernelError::EmptyLoop),
        };
        selection.rebuild();
        selection
    }

    /// Loop projected along a fixed `normal` instead of the computed one.
    pub fn with_normal(points: Vec<[f64; 3]>, normal: [f64; 3]) -> Self {
        let mut selection = Self::new(points);
        selection.automatic_normal = false;
        selection.normal = normal;
        selection.rebuild();
        selection
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn rebuild(&mut self) {
        let normal = (!self.automatic_normal).then_some(self.normal);
        self.projection = LoopProjection::build(&self.points, normal);
        if let Err(err) = &self.projection {
            tracing::debug!(%err, count = self.points.len(), "selection loop cannot be projected");
        }
    }

    pub fn loop_points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn set_loop(&mut self, points: Vec<[f64; 3]>) {
        self.points = points;
        self.rebuild();
    }

    pub fn normal(&self) -> [f64; 3] {
        self.normal
    }

    /// Sets the projection normal. Only used when automatic normal generation is off.
    pub fn set_normal(&mut self, normal: [f64; 3]) {
        self.normal = normal;
        self.rebuild();
    }

    pub fn automatic_normal_generation(&self) -> bool {
        self.automatic_normal
    }

    pub fn set_automatic_normal_generation(&mut self, automatic: bool) {
        self.automatic_normal = automatic;
        self.rebuild();
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether the loop can be evaluated, and why not if it cannot.
    pub fn status(&self) -> Result<(), KernelError> {
        self.projection.as_ref().map(|_| ()).map_err(Clone::clone)
    }

    /// Normal actually used for projection.
    pub fn effective_normal(&self) -> Option<[f64; 3]> {
        self.projection.as_ref().ok().map(|p| p.normal)
    }
}

impl ImplicitFunction for SelectionLoop {
    /// `f64::MAX` when the loop cannot be projected.
    fn evaluate(&self, x: &[f64; 3]) -> f64 {
        let Ok(projection) = &self.projection else {
            return f64::MAX;
        };
        let xp = project_point(x, &projection.origin, &projection.normal);
        let mut rng = query_rng(self.seed, x);
        let inside = point_in_polygon(&xp, &projection.points, &projection.bounds, &projection.normal, &mut rng)
            == PolygonLocation::Inside;

        let dist = distance_to_loop(&xp, &projection.points).dist2.sqrt();
        if inside { -dist } else { dist }
    }

    fn gradient(&self, x: &[f64; 3]) -> [f64; 3] {
        let Ok(projection) = &self.projection else {
            return [0.0; 3];
        };
        let f0 = self.evaluate(x);
        std::array::from_fn(|axis| {
            let mut xi = *x;
            xi[axis] += projection.deltas[axis];
            (self.evaluate(&xi) - f0) / projection.deltas[axis]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> SelectionLoop {
        SelectionLoop::new(vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [0.0, 2.0, 0.0]])
    }

    #[test]
    fn test_sign_follows_containment() {
        let selection = square();
        assert!((selection.evaluate(&[1.0, 1.0, 5.0]) + 1.0).abs() < 1e-12);
        assert!((selection.evaluate(&[3.0, 1.0, -2.0]) - 1.0).abs() < 1e-12);
        assert!(selection.contains(&[0.5, 1.5, 0.0]));
    }

    #[test]
    fn test_gradient_points_outward() {
        let g = square().gradient(&[1.5, 1.0, 0.0]);
        assert!((g[0] - 1.0).abs() < 1e-9, "gradient {:?}", g);
        assert!(g[1].abs() < 1e-9);
        assert!(g[2].abs() < 1e-9);
    }

    #[test]
    fn test_invalid_loop() {
        let mut selection = SelectionLoop::default();
        assert_eq!(selection.status(), Err(KernelError::EmptyLoop));
        assert_eq!(selection.evaluate(&[0.0; 3]), f64::MAX);

        selection.set_loop(vec![[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert_eq!(selection.status(), Err(KernelError::DegenerateNormal));
    }

    #[test]
    fn test_explicit_normal() {
        let mut selection = SelectionLoop::with_normal(
            vec![[0.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 2.0, 2.0], [0.0, 0.0, 2.0]],
            [3.0, 0.0, 0.0],
        );
        assert_eq!(selection.effective_normal(), Some([1.0, 0.0, 0.0]));
        assert!(selection.evaluate(&[7.0, 1.0, 1.0]) < 0.0);

        selection.set_automatic_normal_generation(true);
        assert!(selection.status().is_ok());
    }
}
