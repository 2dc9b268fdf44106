use crate::math::{add_scaled, distance2, dot, sub};

/// Classification of a segment/segment closest-approach test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SegmentIntersection {
    /// Closest approach lies within both segments, at `u` along the first and `v` along the second.
    Intersect { u: f64, v: f64 },
    /// Closest approach lies outside at least one segment.
    NoIntersection,
    /// The segments are parallel (or one is degenerate); no unique crossing exists.
    OnLine,
}

/// Result of projecting a point onto a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineProjection {
    /// Squared distance from the query to `closest`.
    pub dist2: f64,
    /// Unclamped parameter of the projection along the segment.
    pub t: f64,
    /// Closest point on the (clamped) segment.
    pub closest: [f64; 3],
}

/// Closest approach of segments `a1-a2` and `b1-b2`.
///
/// Solves the 2x2 normal equations of `|a1 + u (a2 - a1) - b1 - v (b2 - b1)|^2`.
pub fn segment_intersection(a1: &[f64; 3], a2: &[f64; 3], b1: &[f64; 3], b2: &[f64; 3]) -> SegmentIntersection {
    let u21 = sub(a2, a1);
    let v21 = sub(b2, b1);
    let w = sub(b1, a1);

    let uu = dot(&u21, &u21);
    let uv = dot(&u21, &v21);
    let vv = dot(&v21, &v21);

    let det = uu * vv - uv * uv;
    if det.abs() <= 1e-12 * uu * vv || uu == 0.0 || vv == 0.0 {
        return SegmentIntersection::OnLine;
    }

    let c0 = dot(&u21, &w);
    let c1 = -dot(&v21, &w);
    let u = (c0 * vv + uv * c1) / det;
    let v = (uu * c1 + uv * c0) / det;

    if (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v) {
        SegmentIntersection::Intersect { u, v }
    } else {
        SegmentIntersection::NoIntersection
    }
}

/// Distance from `x` to the segment `p1-p2`.
pub fn distance_to_line(x: &[f64; 3], p1: &[f64; 3], p2: &[f64; 3]) -> LineProjection {
    let p21 = sub(p2, p1);
    let denom = dot(&p21, &p21);
    if denom == 0.0 {
        return LineProjection { dist2: distance2(x, p1), t: 0.0, closest: *p1 };
    }

    let t = dot(&sub(x, p1), &p21) / denom;
    let closest = if t < 0.0 {
        *p1
    } else if t > 1.0 {
        *p2
    } else {
        add_scaled(p1, &p21, t)
    };
    LineProjection { dist2: distance2(x, &closest), t, closest }
}

/// Closest point on the boundary of a closed loop of points.
pub fn distance_to_loop(x: &[f64; 3], points: &[[f64; 3]]) -> LineProjection {
    let n = points.len();
    let mut best = LineProjection { dist2: f64::MAX, t: 0.0, closest: *x };
    for i in 0..n {
        let proj = distance_to_line(x, &points[i], &points[(i + 1) % n]);
        if proj.dist2 < best.dist2 {
            best = proj;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_segments() {
        match segment_intersection(&[0.0, 0.0, 0.0], &[2.0, 0.0, 0.0], &[1.0, -1.0, 0.0], &[1.0, 3.0, 0.0]) {
            SegmentIntersection::Intersect { u, v } => {
                assert!((u - 0.5).abs() < 1e-12);
                assert!((v - 0.25).abs() < 1e-12);
            }
            other => panic!("expected crossing, got {:?}", other),
        }
    }

    #[test]
    fn test_parallel_and_disjoint() {
        let parallel = segment_intersection(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[1.0, 1.0, 0.0]);
        assert_eq!(parallel, SegmentIntersection::OnLine);
        let apart = segment_intersection(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], &[2.0, -1.0, 0.0], &[2.0, 1.0, 0.0]);
        assert_eq!(apart, SegmentIntersection::NoIntersection);
    }

    #[test]
    fn test_distance_to_line_clamps() {
        let p = distance_to_line(&[3.0, 1.0, 0.0], &[0.0, 0.0, 0.0], &[2.0, 0.0, 0.0]);
        assert!((p.t - 1.5).abs() < 1e-12);
        assert_eq!(p.closest, [2.0, 0.0, 0.0]);
        assert!((p.dist2 - 2.0).abs() < 1e-12);
    }
}
