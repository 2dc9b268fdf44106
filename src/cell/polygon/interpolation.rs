use std::f64::consts::PI;

use crate::math::{cross, distance2, dot, norm, sub};

/// Computes per-vertex interpolation weights of a point with respect to a polygon.
pub trait WeightStrategy: Send + Sync {
    /// Weights of `x`, one per vertex of `points`, summing to 1.
    fn weights(&self, x: &[f64; 3], points: &[[f64; 3]]) -> Vec<f64>;
}

/// Inverse squared distance weighting. A query on a vertex gets weight 1 there.
#[derive(Clone, Copy, Debug, Default)]
pub struct InverseDistanceWeights;

/// Mean value coordinates (Floater). Smooth inside convex and concave polygons.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanValueWeights;

/// Selects a [`WeightStrategy`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolygonInterpolation {
    #[default]
    InverseDistance,
    MeanValue,
}

impl PolygonInterpolation {
    pub fn strategy(self) -> &'static dyn WeightStrategy {
        match self {
            PolygonInterpolation::InverseDistance => &InverseDistanceWeights,
            PolygonInterpolation::MeanValue => &MeanValueWeights,
        }
    }
}

fn unit_weight(n: usize, at: usize) -> Vec<f64> {
    let mut w = vec![0.0; n];
    w[at] = 1.0;
    w
}

impl WeightStrategy for InverseDistanceWeights {
    fn weights(&self, x: &[f64; 3], points: &[[f64; 3]]) -> Vec<f64> {
        let n = points.len();
        let mut weights = Vec::with_capacity(n);
        let mut sum = 0.0;
        for (i, p) in points.iter().enumerate() {
            let d2 = distance2(x, p);
            if d2 == 0.0 {
                return unit_weight(n, i);
            }
            weights.push(1.0 / d2);
            sum += 1.0 / d2;
        }
        for w in weights.iter_mut() {
            *w /= sum;
        }
        weights
    }
}

impl WeightStrategy for MeanValueWeights {
    fn weights(&self, x: &[f64; 3], points: &[[f64; 3]]) -> Vec<f64> {
        const EPS: f64 = 1e-8;
        let n = points.len();

        // 1. Unit directions and distances to every vertex.
        let mut dirs = Vec::with_capacity(n);
        let mut dist = Vec::with_capacity(n);
        for (i, p) in points.iter().enumerate() {
            let d = sub(p, x);
            let len = norm(&d);
            if len < EPS {
                return unit_weight(n, i);
            }
            dirs.push([d[0] / len, d[1] / len, d[2] / len]);
            dist.push(len);
        }

        // 2. Angles subtended by each edge; a straight angle means x lies on that edge.
        let mut tan_half = Vec::with_capacity(n);
        for i in 0..n {
            let j = (i + 1) % n;
            let sine = norm(&cross(&dirs[i], &dirs[j]));
            let cosine = dot(&dirs[i], &dirs[j]).clamp(-1.0, 1.0);
            let theta = sine.atan2(cosine);
            if PI - theta < 0.001 {
                let mut w = vec![0.0; n];
                w[i] = dist[j] / (dist[i] + dist[j]);
                w[j] = dist[i] / (dist[i] + dist[j]);
                return w;
            }
            tan_half.push((0.5 * theta).tan());
        }

        // 3. w_i = (tan(a_{i-1}/2) + tan(a_i/2)) / r_i
        let mut weights = Vec::with_capacity(n);
        let mut sum = 0.0;
        for i in 0..n {
            let prev = (i + n - 1) % n;
            let w = (tan_half[prev] + tan_half[i]) / dist[i];
            weights.push(w);
            sum += w;
        }
        if sum != 0.0 {
            for w in weights.iter_mut() {
                *w /= sum;
            }
        }
        weights
    }
}
