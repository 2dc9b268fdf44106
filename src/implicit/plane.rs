use crate::error::KernelError;
use crate::implicit::ImplicitFunction;
use crate::math::{add_scaled, dominant_axis, dot, jacobi_eigen, lerp, normalize, sub};

/// Relative tolerance deciding when a line is parallel to a plane.
pub const PLANE_TOLERANCE: f64 = 1e-14;

/// Segment/plane intersection result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LinePlane {
    /// Parallel (or lying in the plane); no unique crossing.
    Parallel,
    /// Crossing within the segment, `t` in [0, 1].
    Within { t: f64, x: [f64; 3] },
    /// The infinite line crosses outside the segment.
    Beyond { t: f64, x: [f64; 3] },
}

impl LinePlane {
    /// Crossing inside the segment, if any.
    pub fn within(self) -> Option<(f64, [f64; 3])> {
        match self {
            LinePlane::Within { t, x } => Some((t, x)),
            _ => None,
        }
    }
}

/// Signed distance-like value `n . (x - origin)`.
#[inline]
pub fn evaluate_plane(normal: &[f64; 3], origin: &[f64; 3], x: &[f64; 3]) -> f64 {
    dot(normal, &sub(x, origin))
}

/// Projects `x` onto the plane through `origin` with unit `normal`.
pub fn project_point(x: &[f64; 3], origin: &[f64; 3], normal: &[f64; 3]) -> [f64; 3] {
    add_scaled(x, normal, -evaluate_plane(normal, origin, x))
}

/// Like [`project_point`] but `normal` need not be unit length.
pub fn generalized_project_point(x: &[f64; 3], origin: &[f64; 3], normal: &[f64; 3]) -> [f64; 3] {
    let n2 = dot(normal, normal);
    if n2 == 0.0 {
        return *x;
    }
    add_scaled(x, normal, -evaluate_plane(normal, origin, x) / n2)
}

/// Intersects segment `p1-p2` with the plane through `origin` with `normal`.
pub fn intersect_line_plane(p1: &[f64; 3], p2: &[f64; 3], normal: &[f64; 3], origin: &[f64; 3]) -> LinePlane {
    let p21 = sub(p2, p1);
    let num = dot(normal, &sub(origin, p1));
    let den = dot(normal, &p21);

    // Parallel, or too close to it to divide safely.
    if den.abs() <= (num * PLANE_TOLERANCE).abs() || den == 0.0 {
        return LinePlane::Parallel;
    }

    let t = num / den;
    let x = add_scaled(p1, &p21, t);
    if (0.0..=1.0).contains(&t) {
        LinePlane::Within { t, x }
    } else {
        LinePlane::Beyond { t, x }
    }
}

/// Infinite plane `n . (x - origin) = 0`.
///
/// The normal is kept normalized internally. With `axis_aligned` the internal
/// normal snaps to the dominant coordinate axis; `offset` shifts the internal
/// origin along the internal normal. Both are recomputed on every setter.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    normal: [f64; 3],
    origin: [f64; 3],
    axis_aligned: bool,
    offset: f64,
    internal_normal: [f64; 3],
    internal_origin: [f64; 3],
}

impl Default for Plane {
    fn default() -> Self {
        Self::new([0.0; 3], [0.0, 0.0, 1.0])
    }
}

impl Plane {
    /// A zero `normal` falls back to `+z`.
    pub fn new(origin: [f64; 3], normal: [f64; 3]) -> Self {
        let mut plane = Self {
            normal,
            origin,
            axis_aligned: false,
            offset: 0.0,
            internal_normal: [0.0, 0.0, 1.0],
            internal_origin: origin,
        };
        plane.update();
        plane
    }

    fn update(&mut self) {
        let mut n = self.normal;
        if normalize(&mut n) == 0.0 {
            n = [0.0, 0.0, 1.0];
        }
        if self.axis_aligned {
            let axis = dominant_axis(&n);
            let sign = if n[axis] < 0.0 { -1.0 } else { 1.0 };
            n = [0.0; 3];
            n[axis] = sign;
        }
        self.internal_normal = n;
        self.internal_origin = add_scaled(&self.origin, &n, self.offset);
    }

    /// Normal as given by the caller.
    pub fn normal(&self) -> [f64; 3] {
        self.normal
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// Unit normal used for evaluation.
    pub fn effective_normal(&self) -> [f64; 3] {
        self.internal_normal
    }

    /// Origin used for evaluation (`origin + offset * normal`).
    pub fn effective_origin(&self) -> [f64; 3] {
        self.internal_origin
    }

    pub fn axis_aligned(&self) -> bool {
        self.axis_aligned
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_normal(&mut self, normal: [f64; 3]) {
        self.normal = normal;
        self.update();
    }

    pub fn set_origin(&mut self, origin: [f64; 3]) {
        self.origin = origin;
        self.update();
    }

    pub fn set_axis_aligned(&mut self, axis_aligned: bool) {
        self.axis_aligned = axis_aligned;
        self.update();
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
        self.update();
    }

    /// Translates the origin along the normal by `distance`.
    pub fn push(&mut self, distance: f64) {
        if distance == 0.0 {
            return;
        }
        self.origin = add_scaled(&self.origin, &self.internal_normal, distance);
        self.update();
    }

    /// Unsigned distance from `x` to the plane.
    pub fn distance(&self, x: &[f64; 3]) -> f64 {
        self.evaluate(x).abs()
    }

    pub fn project_point(&self, x: &[f64; 3]) -> [f64; 3] {
        project_point(x, &self.internal_origin, &self.internal_normal)
    }

    /// Removes the normal component of a vector.
    pub fn project_vector(&self, v: &[f64; 3]) -> [f64; 3] {
        add_scaled(v, &self.internal_normal, -dot(v, &self.internal_normal))
    }

    pub fn intersect_with_line(&self, p1: &[f64; 3], p2: &[f64; 3]) -> LinePlane {
        intersect_line_plane(p1, p2, &self.internal_normal, &self.internal_origin)
    }

    /// Intersects the plane with the finite parallelogram spanned by `origin`,
    /// `px` and `py` (corners `origin`, `px`, `px + py - origin`, `py`).
    ///
    /// Returns the end points of the intersection segment.
    pub fn intersect_with_finite_plane(
        &self,
        origin: &[f64; 3],
        px: &[f64; 3],
        py: &[f64; 3],
    ) -> Option<([f64; 3], [f64; 3])> {
        let far = add_scaled(px, &sub(py, origin), 1.0);
        let corners = [*origin, *px, far, *py];
        let values: Vec<f64> = corners.iter().map(|c| self.evaluate(c)).collect();

        let mut hits: Vec<[f64; 3]> = Vec::with_capacity(2);
        for i in 0..4 {
            let j = (i + 1) % 4;
            let (a, b) = (values[i], values[j]);
            let x = if a == 0.0 {
                corners[i]
            } else if (a < 0.0) != (b < 0.0) && b != 0.0 {
                lerp(&corners[i], &corners[j], a / (a - b))
            } else {
                continue;
            };
            if !hits.contains(&x) {
                hits.push(x);
            }
        }

        match hits.as_slice() {
            [x0, x1, ..] => Some((*x0, *x1)),
            _ => None,
        }
    }

    /// Least-squares plane through `points`: centroid origin, normal along the
    /// direction of least variance.
    pub fn fit(points: &[[f64; 3]]) -> Result<Plane, KernelError> {
        if points.len() < 3 {
            return Err(KernelError::TooFewPoints { expected: 3, found: points.len() });
        }

        let inv = 1.0 / points.len() as f64;
        let mut centroid = [0.0; 3];
        for p in points {
            centroid = add_scaled(&centroid, p, inv);
        }

        let mut cov = [[0.0; 3]; 3];
        for p in points {
            let d = sub(p, &centroid);
            for i in 0..3 {
                for j in 0..3 {
                    cov[i][j] += d[i] * d[j] * inv;
                }
            }
        }

        let (values, vectors) = jacobi_eigen(cov);
        // A vanishing middle eigenvalue means the points are colinear (or coincident).
        if values[0] <= 0.0 || values[1] <= 1e-12 * values[0] {
            tracing::debug!(count = points.len(), "degenerate best-fit plane");
            return Err(KernelError::DegeneratePlaneFit);
        }
        Ok(Plane::new(centroid, vectors[2]))
    }
}

impl ImplicitFunction for Plane {
    fn evaluate(&self, x: &[f64; 3]) -> f64 {
        evaluate_plane(&self.internal_normal, &self.internal_origin, x)
    }

    fn gradient(&self, _x: &[f64; 3]) -> [f64; 3] {
        self.internal_normal
    }
}
