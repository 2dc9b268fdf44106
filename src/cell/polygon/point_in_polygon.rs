use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bounds::BoundingBox;
use crate::cell::line::{segment_intersection, SegmentIntersection};
use crate::math::{add_scaled, dominant_axis, norm};

/// Maximum number of rays fired per query.
pub const MAX_TRIALS: usize = 10;

/// A classification is accepted once inside and outside votes differ by this much.
pub const VOTE_MARGIN: i32 = 2;

/// Crossings closer than this (as a fraction of the edge) to an edge end make a ray uncertain.
pub const RAY_TOLERANCE: f64 = 1e-3;

/// Outcome of [`point_in_polygon`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolygonLocation {
    Inside,
    Outside,
    /// Degenerate polygon (zero extent or normal).
    Failure,
}

/// Deterministic generator for one query, derived from a user seed and the query point.
pub fn query_rng(seed: u64, x: &[f64; 3]) -> StdRng {
    let mut h = seed ^ 0x9e37_79b9_7f4a_7c15;
    for c in x {
        h = (h ^ c.to_bits()).wrapping_mul(0x0000_0100_0000_01b3);
        h ^= h >> 29;
    }
    StdRng::seed_from_u64(h)
}

/// Random in-plane direction of length up to `magnitude`, or `None` after repeated near-zero draws.
fn random_direction<R: Rng + ?Sized>(rng: &mut R, normal: &[f64; 3], magnitude: f64) -> Option<[f64; 3]> {
    let axis = dominant_axis(normal);
    let (c0, c1) = ((axis + 1) % 3, (axis + 2) % 3);
    for _ in 0..32 {
        let mut ray = [0.0; 3];
        ray[c0] = rng.gen_range(-magnitude..=magnitude);
        ray[c1] = rng.gen_range(-magnitude..=magnitude);
        ray[axis] = -(normal[c0] * ray[c0] + normal[c1] * ray[c1]) / normal[axis];
        if norm(&ray) > 1e-6 * magnitude {
            return Some(ray);
        }
    }
    None
}

/// Classifies `x` against a planar polygon by voting over random ray casts.
///
/// Each trial fires a ray in the polygon plane and counts edge crossings.
/// Trials whose ray passes too close to a vertex, or runs parallel to an edge,
/// are discarded. An odd count votes inside, an even count outside; trials stop
/// once the vote margin reaches [`VOTE_MARGIN`] or after [`MAX_TRIALS`].
pub fn point_in_polygon<R: Rng + ?Sized>(
    x: &[f64; 3],
    points: &[[f64; 3]],
    bounds: &BoundingBox<3>,
    normal: &[f64; 3],
    rng: &mut R,
) -> PolygonLocation {
    if points.len() < 3 {
        return PolygonLocation::Failure;
    }

    // 1. Bounding box rejection, with slack for projection round-off.
    let diagonal = bounds.diagonal_length();
    if !bounds.inflate(1e-12 * diagonal).contains(x) {
        return PolygonLocation::Outside;
    }

    // 2. Ray length long enough to leave the box from anywhere inside it.
    let magnitude = 1.1 * diagonal;
    if magnitude == 0.0 || normal[dominant_axis(normal)] == 0.0 {
        tracing::debug!(count = points.len(), "degenerate polygon in point classification");
        return PolygonLocation::Failure;
    }

    // 3. Vote.
    let n = points.len();
    let mut votes = 0i32;
    for _ in 0..MAX_TRIALS {
        if votes.abs() >= VOTE_MARGIN {
            break;
        }
        let Some(ray) = random_direction(rng, normal, magnitude) else {
            continue;
        };
        let end = add_scaled(x, &ray, magnitude / norm(&ray));

        let mut crossings = 0usize;
        let mut certain = true;
        for i in 0..n {
            match segment_intersection(x, &end, &points[i], &points[(i + 1) % n]) {
                SegmentIntersection::Intersect { v, .. } => {
                    if v > RAY_TOLERANCE && v < 1.0 - RAY_TOLERANCE {
                        crossings += 1;
                    } else {
                        certain = false;
                        break;
                    }
                }
                SegmentIntersection::OnLine => {
                    certain = false;
                    break;
                }
                SegmentIntersection::NoIntersection => {}
            }
        }

        if certain {
            votes += if crossings % 2 == 1 { 1 } else { -1 };
        }
    }

    if votes > 0 {
        PolygonLocation::Inside
    } else {
        PolygonLocation::Outside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<[f64; 3]> {
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
    }

    #[test]
    fn test_square_classification() {
        let pts = square();
        let bounds = BoundingBox::from_points(&pts);
        let n = [0.0, 0.0, 1.0];
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(point_in_polygon(&[0.5, 0.5, 0.0], &pts, &bounds, &n, &mut rng), PolygonLocation::Inside);
        assert_eq!(point_in_polygon(&[1.5, 0.5, 0.0], &pts, &bounds, &n, &mut rng), PolygonLocation::Outside);
    }

    #[test]
    fn test_zero_extent_fails() {
        let pts = vec![[1.0, 1.0, 1.0]; 3];
        let bounds = BoundingBox::from_points(&pts);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            point_in_polygon(&[1.0, 1.0, 1.0], &pts, &bounds, &[0.0, 0.0, 1.0], &mut rng),
            PolygonLocation::Failure
        );
    }

    #[test]
    fn test_query_rng_is_repeatable() {
        let a: u64 = query_rng(3, &[0.1, 0.2, 0.3]).r#gen();
        let b: u64 = query_rng(3, &[0.1, 0.2, 0.3]).r#gen();
        let c: u64 = query_rng(4, &[0.1, 0.2, 0.3]).r#gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
