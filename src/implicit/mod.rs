use rayon::prelude::*;

pub mod frustum;
pub mod plane;
pub mod selection_loop;

pub use frustum::Frustum;
pub use plane::{LinePlane, Plane};
pub use selection_loop::SelectionLoop;

/// Trait defining an implicit function `F(x)`.
///
/// `F(x) < 0` inside, `F(x) > 0` outside, zero on the surface.
/// Must be Send + Sync to support parallel batch evaluation.
pub trait ImplicitFunction: Send + Sync + std::fmt::Debug {
    fn evaluate(&self, x: &[f64; 3]) -> f64;

    fn gradient(&self, x: &[f64; 3]) -> [f64; 3];

    /// Whether `x` is inside or on the surface.
    fn contains(&self, x: &[f64; 3]) -> bool {
        self.evaluate(x) <= 0.0
    }

    /// Evaluates every point in parallel.
    fn evaluate_many(&self, points: &[[f64; 3]]) -> Vec<f64> {
        points.par_iter().map(|x| self.evaluate(x)).collect()
    }

    /// Classifies every point in parallel.
    fn contains_many(&self, points: &[[f64; 3]]) -> Vec<bool> {
        points.par_iter().map(|x| self.contains(x)).collect()
    }
}
