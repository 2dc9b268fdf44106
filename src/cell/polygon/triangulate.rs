use crate::bounds::BoundingBox;
use crate::cell::line::{segment_intersection, SegmentIntersection};
use crate::cell::polygon::compute_normal;
use crate::error::KernelError;
use crate::locator::{MergePoints, PointLocator};
use crate::math::{cross, distance2, dot, norm, normalize, sub};
use crate::priority_queue::PriorityQueue;

/// Default merge tolerance, relative to the polygon's bounding-box diagonal.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Circular doubly linked list over the polygon's vertices.
struct EarLoop<'p> {
    points: &'p [[f64; 3]],
    /// Original vertex index for each slot.
    ids: Vec<usize>,
    prev: Vec<usize>,
    next: Vec<usize>,
    count: usize,
    normal: [f64; 3],
    tol: f64,
}

impl<'p> EarLoop<'p> {
    #[inline]
    fn x(&self, slot: usize) -> &[f64; 3] {
        &self.points[self.ids[slot]]
    }

    /// Ear quality of `slot`: squared perimeter over twice the area, smaller is better.
    /// Reflex vertices give -1, colinear ones -inf; neither is ever queued.
    fn measure(&self, slot: usize) -> f64 {
        let v = self.x(slot);
        let p = self.x(self.prev[slot]);
        let n = self.x(self.next[slot]);

        let a = sub(n, v);
        let b = sub(p, v);
        let area = dot(&cross(&a, &b), &self.normal);
        if area < 0.0 {
            return -1.0;
        }
        if area == 0.0 {
            return f64::NEG_INFINITY;
        }
        let perimeter = norm(&a) + norm(&b) + norm(&sub(p, n));
        perimeter * perimeter / area
    }

    fn unlink(&mut self, slot: usize) {
        let (p, n) = (self.prev[slot], self.next[slot]);
        self.next[p] = n;
        self.prev[n] = p;
        self.count -= 1;
    }

    /// Whether the diagonal `prev(slot) - next(slot)` lies inside the remaining loop.
    ///
    /// Every other vertex is classified against the plane through the diagonal
    /// and the polygon normal. Whenever the classification flips, the boundary
    /// edge that caused it must not cross the diagonal. At least one vertex must
    /// lie on the far side, otherwise the cut would flip the loop.
    fn can_cut(&self, slot: usize) -> bool {
        if self.count <= 3 {
            return true;
        }
        let p = self.prev[slot];
        let n = self.next[slot];
        let xp = *self.x(p);
        let xn = *self.x(n);

        let mut split = cross(&sub(&xn, &xp), &self.normal);
        if normalize(&mut split) == 0.0 {
            return false;
        }
        let side = |x: &[f64; 3]| {
            let d = dot(&split, &sub(x, &xp));
            if d < -self.tol {
                -1
            } else if d > self.tol {
                1
            } else {
                0
            }
        };

        let mut probe = self.next[n];
        let mut sign = side(self.x(probe));
        let mut one_negative = sign < 0;
        probe = self.next[probe];
        while probe != p {
            let s = side(self.x(probe));
            if s != sign {
                one_negative |= s < 0;
                let edge_start = self.x(self.prev[probe]);
                if let SegmentIntersection::Intersect { .. } = segment_intersection(&xp, &xn, edge_start, self.x(probe)) {
                    return false;
                }
                sign = s;
            }
            probe = self.next[probe];
        }
        one_negative
    }
}

/// Ear-cutting triangulation of a simple planar polygon.
///
/// Returns vertex indices into `points`, three per triangle. Consecutive
/// vertices closer than `tolerance` times the bounding-box diagonal are merged
/// first. Fails when the normal is degenerate or no valid ear remains.
pub fn ear_cut(points: &[[f64; 3]], tolerance: f64) -> Result<Vec<usize>, KernelError> {
    if points.len() < 3 {
        return Err(KernelError::TooFewPoints { expected: 3, found: points.len() });
    }

    let bounds = BoundingBox::from_points(points);
    let tol = tolerance * bounds.diagonal_length();
    let tol2 = tol * tol;

    // 1. Drop consecutive near-duplicates.
    let mut ids: Vec<usize> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        if ids.last().is_none_or(|&last| distance2(&points[last], p) > tol2) {
            ids.push(i);
        }
    }
    while ids.len() > 1 && distance2(&points[ids[0]], &points[ids[ids.len() - 1]]) <= tol2 {
        ids.pop();
    }
    if ids.len() < 3 {
        return Err(KernelError::TooFewPoints { expected: 3, found: ids.len() });
    }

    let loop_points: Vec<[f64; 3]> = ids.iter().map(|&i| points[i]).collect();
    let Some(normal) = compute_normal(&loop_points) else {
        tracing::debug!(count = ids.len(), "ear cut on polygon with degenerate normal");
        return Err(KernelError::DegenerateNormal);
    };

    let count = ids.len();
    let mut ring = EarLoop {
        points,
        ids,
        prev: (0..count).map(|i| (i + count - 1) % count).collect(),
        next: (0..count).map(|i| (i + 1) % count).collect(),
        count,
        normal,
        tol,
    };

    // 2. Queue every convex vertex by ear quality.
    let mut queue = PriorityQueue::with_capacity(count);
    for slot in 0..count {
        let m = ring.measure(slot);
        if m > 0.0 {
            queue.insert(slot, m);
        }
    }

    // 3. Cut ears until a triangle remains.
    let mut triangles = Vec::with_capacity(3 * (count - 2));
    while ring.count > 2 {
        let convex = queue.len() == ring.count;
        let Some((slot, _)) = queue.pop() else {
            break;
        };
        if !convex && !ring.can_cut(slot) {
            continue;
        }

        let (p, n) = (ring.prev[slot], ring.next[slot]);
        triangles.extend_from_slice(&[ring.ids[p], ring.ids[slot], ring.ids[n]]);
        ring.unlink(slot);

        for neighbor in [p, n] {
            queue.remove(neighbor);
            let m = ring.measure(neighbor);
            if m > 0.0 {
                queue.insert(neighbor, m);
            }
        }
    }

    if ring.count > 2 {
        tracing::debug!(remaining = ring.count, total = count, "ear cut ran out of ears");
        return Err(KernelError::TriangulationFailed { remaining: ring.count });
    }
    Ok(triangles)
}

/// Triangulates a polygon that may revisit the same point.
///
/// Vertices are merged exactly; every time the walk returns to a point already
/// on the stack, the loop closed since then is split off and cut on its own.
pub fn non_degenerate_ear_cut(points: &[[f64; 3]], tolerance: f64) -> Result<Vec<usize>, KernelError> {
    let mut merge = MergePoints::new();
    let merged: Vec<usize> = points.iter().map(|p| merge.insert_unique_point(*p).0).collect();
    if merge.len() == points.len() {
        return ear_cut(points, tolerance);
    }

    let mut loops: Vec<Vec<usize>> = Vec::new();
    let mut stack: Vec<usize> = Vec::with_capacity(points.len());
    for (i, &m) in merged.iter().enumerate() {
        match stack.iter().position(|&j| merged[j] == m) {
            Some(pos) => {
                let mut closed = vec![stack[pos]];
                closed.extend(stack.drain(pos + 1..));
                loops.push(closed);
            }
            None => stack.push(i),
        }
    }
    loops.push(stack);

    let mut triangles = Vec::new();
    for sub_loop in loops.iter().filter(|l| l.len() >= 3) {
        let sub_points: Vec<[f64; 3]> = sub_loop.iter().map(|&i| points[i]).collect();
        let local = ear_cut(&sub_points, tolerance)?;
        triangles.extend(local.into_iter().map(|k| sub_loop[k]));
    }
    Ok(triangles)
}
