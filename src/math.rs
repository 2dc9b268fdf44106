//! Small fixed-size linear algebra used throughout the kernel.
//!
//! Everything works on plain `[f64; 3]` arrays so cells can keep their
//! coordinates as owned fields without a vector crate.

#[inline]
pub fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: &[f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// `a + s * b`
#[inline]
pub fn add_scaled(a: &[f64; 3], b: &[f64; 3], s: f64) -> [f64; 3] {
    [a[0] + s * b[0], a[1] + s * b[1], a[2] + s * b[2]]
}

#[inline]
pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Normalizes `a` in place and returns its original length. A zero vector is left untouched.
#[inline]
pub fn normalize(a: &mut [f64; 3]) -> f64 {
    let len = norm(a);
    if len != 0.0 {
        a[0] /= len;
        a[1] /= len;
        a[2] /= len;
    }
    len
}

#[inline]
pub fn distance2(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let d = sub(a, b);
    dot(&d, &d)
}

#[inline]
pub fn lerp(a: &[f64; 3], b: &[f64; 3], t: f64) -> [f64; 3] {
    [
        a[0] + t * (b[0] - a[0]),
        a[1] + t * (b[1] - a[1]),
        a[2] + t * (b[2] - a[2]),
    ]
}

/// Determinant of the 2x2 matrix with columns `c1`, `c2`.
#[inline]
pub fn determinant2x2(c1: &[f64; 2], c2: &[f64; 2]) -> f64 {
    c1[0] * c2[1] - c2[0] * c1[1]
}

/// Determinant of the 3x3 matrix with columns `c1`, `c2`, `c3`.
#[inline]
pub fn determinant3x3(c1: &[f64; 3], c2: &[f64; 3], c3: &[f64; 3]) -> f64 {
    c1[0] * c2[1] * c3[2] + c2[0] * c3[1] * c1[2] + c3[0] * c1[1] * c2[2]
        - c1[0] * c3[1] * c2[2]
        - c2[0] * c1[1] * c3[2]
        - c3[0] * c2[1] * c1[2]
}

/// Index of the component with the largest magnitude.
#[inline]
pub fn dominant_axis(v: &[f64; 3]) -> usize {
    let mut axis = 0;
    for i in 1..3 {
        if v[i].abs() > v[axis].abs() {
            axis = i;
        }
    }
    axis
}

/// Eigen-decomposition of a symmetric 3x3 matrix by cyclic Jacobi rotations.
///
/// Returns eigenvalues sorted in decreasing order together with the matching
/// unit eigenvectors (`vectors[i]` belongs to `values[i]`).
pub fn jacobi_eigen(mut a: [[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    for _ in 0..50 {
        let off = a[0][1] * a[0][1] + a[0][2] * a[0][2] + a[1][2] * a[1][2];
        let diag = a[0][0] * a[0][0] + a[1][1] * a[1][1] + a[2][2] * a[2][2];
        if off <= 1e-30 * diag.max(f64::MIN_POSITIVE) {
            break;
        }

        for (p, q) in [(0usize, 1usize), (0, 2), (1, 2)] {
            if a[p][q] == 0.0 {
                continue;
            }
            let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            for k in 0..3 {
                let akp = a[k][p];
                let akq = a[k][q];
                a[k][p] = c * akp - s * akq;
                a[k][q] = s * akp + c * akq;
            }
            for k in 0..3 {
                let apk = a[p][k];
                let aqk = a[q][k];
                a[p][k] = c * apk - s * aqk;
                a[q][k] = s * apk + c * aqk;
            }
            for row in v.iter_mut() {
                let vkp = row[p];
                let vkq = row[q];
                row[p] = c * vkp - s * vkq;
                row[q] = s * vkp + c * vkq;
            }
        }
    }

    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| a[j][j].total_cmp(&a[i][i]));

    let mut values = [0.0; 3];
    let mut vectors = [[0.0; 3]; 3];
    for (slot, &i) in order.iter().enumerate() {
        values[slot] = a[i][i];
        vectors[slot] = [v[0][i], v[1][i], v[2][i]];
    }
    (values, vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinants() {
        assert_eq!(determinant2x2(&[1.0, 0.0], &[0.0, 1.0]), 1.0);
        let d = determinant3x3(&[2.0, 0.0, 0.0], &[0.0, 3.0, 0.0], &[1.0, 1.0, 4.0]);
        assert!((d - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_jacobi_diagonalizes() {
        let m = [[4.0, 1.0, 0.5], [1.0, 3.0, 0.25], [0.5, 0.25, 1.0]];
        let (values, vectors) = jacobi_eigen(m);
        assert!(values[0] >= values[1] && values[1] >= values[2]);
        for k in 0..3 {
            let v = vectors[k];
            let mv = [dot(&m[0], &v), dot(&m[1], &v), dot(&m[2], &v)];
            for i in 0..3 {
                assert!((mv[i] - values[k] * v[i]).abs() < 1e-9, "eigenpair {} mismatch", k);
            }
            assert!((norm(&v) - 1.0).abs() < 1e-12);
        }
    }
}
