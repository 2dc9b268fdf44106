/// Generic axis-aligned bounding box for N-dimensional space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<const D: usize> {
    pub min: [f64; D],
    pub max: [f64; D],
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// An inverted box that any point will expand.
    pub fn empty() -> Self {
        Self {
            min: [f64::MAX; D],
            max: [f64::MIN; D],
        }
    }

    /// Tight bounds of a set of points. Returns an inverted box for an empty slice.
    pub fn from_points(points: &[[f64; D]]) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.expand(p);
        }
        bounds
    }

    pub fn expand(&mut self, point: &[f64; D]) {
        for i in 0..D {
            if point[i] < self.min[i] {
                self.min[i] = point[i];
            }
            if point[i] > self.max[i] {
                self.max[i] = point[i];
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self.min[i] <= self.max[i])
    }

    /// Side length along `axis`.
    pub fn length(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }

    pub fn diagonal_length_sq(&self) -> f64 {
        (0..D).map(|i| self.length(i) * self.length(i)).sum()
    }

    pub fn diagonal_length(&self) -> f64 {
        self.diagonal_length_sq().sqrt()
    }

    pub fn center(&self) -> [f64; D] {
        let mut c = [0.0; D];
        for i in 0..D {
            c[i] = 0.5 * (self.min[i] + self.max[i]);
        }
        c
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: &[f64; D]) -> bool {
        (0..D).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Grows the box by `delta` on every side.
    pub fn inflate(&self, delta: f64) -> Self {
        let mut out = *self;
        for i in 0..D {
            out.min[i] -= delta;
            out.max[i] += delta;
        }
        out
    }
}
