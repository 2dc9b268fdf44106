use crate::implicit::plane::Plane;
use crate::implicit::ImplicitFunction;

/// Truncated pyramid with its apex at the origin, looking down `+y`.
///
/// Bounded by a near plane at `y = near_plane_distance` and four side planes
/// through the origin, tilted by the horizontal (x) and vertical (z) half-angles.
/// The function value is the maximum of the five plane values, so the interior
/// is the intersection of their negative half-spaces.
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum {
    near_plane_distance: f64,
    horizontal_angle: f64,
    vertical_angle: f64,
    near: Plane,
    right: Plane,
    left: Plane,
    top: Plane,
    bottom: Plane,
}

impl Default for Frustum {
    fn default() -> Self {
        Self::new(0.5, 30.0, 30.0)
    }
}

impl Frustum {
    pub const MIN_ANGLE: f64 = 1.0;
    pub const MAX_ANGLE: f64 = 89.0;

    /// Angles are in degrees and clamped to [1, 89]; the near distance is clamped to be non-negative.
    pub fn new(near_plane_distance: f64, horizontal_angle: f64, vertical_angle: f64) -> Self {
        let mut frustum = Self {
            near_plane_distance: near_plane_distance.max(0.0),
            horizontal_angle: horizontal_angle.clamp(Self::MIN_ANGLE, Self::MAX_ANGLE),
            vertical_angle: vertical_angle.clamp(Self::MIN_ANGLE, Self::MAX_ANGLE),
            near: Plane::default(),
            right: Plane::default(),
            left: Plane::default(),
            top: Plane::default(),
            bottom: Plane::default(),
        };
        frustum.calculate_near_plane();
        frustum.calculate_horizontal_planes();
        frustum.calculate_vertical_planes();
        frustum
    }

    fn calculate_near_plane(&mut self) {
        self.near = Plane::new([0.0, self.near_plane_distance, 0.0], [0.0, -1.0, 0.0]);
    }

    fn calculate_horizontal_planes(&mut self) {
        let (sin, cos) = self.horizontal_angle.to_radians().sin_cos();
        self.right = Plane::new([0.0; 3], [cos, -sin, 0.0]);
        self.left = Plane::new([0.0; 3], [-cos, -sin, 0.0]);
    }

    fn calculate_vertical_planes(&mut self) {
        let (sin, cos) = self.vertical_angle.to_radians().sin_cos();
        self.top = Plane::new([0.0; 3], [0.0, -sin, cos]);
        self.bottom = Plane::new([0.0; 3], [0.0, -sin, -cos]);
    }

    pub fn near_plane_distance(&self) -> f64 {
        self.near_plane_distance
    }

    pub fn horizontal_angle(&self) -> f64 {
        self.horizontal_angle
    }

    pub fn vertical_angle(&self) -> f64 {
        self.vertical_angle
    }

    pub fn set_near_plane_distance(&mut self, distance: f64) {
        self.near_plane_distance = distance.max(0.0);
        self.calculate_near_plane();
    }

    pub fn set_horizontal_angle(&mut self, degrees: f64) {
        self.horizontal_angle = degrees.clamp(Self::MIN_ANGLE, Self::MAX_ANGLE);
        self.calculate_horizontal_planes();
    }

    pub fn set_vertical_angle(&mut self, degrees: f64) {
        self.vertical_angle = degrees.clamp(Self::MIN_ANGLE, Self::MAX_ANGLE);
        self.calculate_vertical_planes();
    }

    pub fn near_plane(&self) -> &Plane {
        &self.near
    }

    pub fn right_plane(&self) -> &Plane {
        &self.right
    }

    pub fn left_plane(&self) -> &Plane {
        &self.left
    }

    pub fn top_plane(&self) -> &Plane {
        &self.top
    }

    pub fn bottom_plane(&self) -> &Plane {
        &self.bottom
    }

    /// Near, right, left, top, bottom.
    pub fn planes(&self) -> [&Plane; 5] {
        [&self.near, &self.right, &self.left, &self.top, &self.bottom]
    }

    fn dominant_plane(&self, x: &[f64; 3]) -> (&Plane, f64) {
        let mut best = (&self.near, self.near.evaluate(x));
        for plane in [&self.right, &self.left, &self.top, &self.bottom] {
            let value = plane.evaluate(x);
            if value > best.1 {
                best = (plane, value);
            }
        }
        best
    }
}

impl ImplicitFunction for Frustum {
    fn evaluate(&self, x: &[f64; 3]) -> f64 {
        self.dominant_plane(x).1
    }

    fn gradient(&self, x: &[f64; 3]) -> [f64; 3] {
        self.dominant_plane(x).0.effective_normal()
    }
}
