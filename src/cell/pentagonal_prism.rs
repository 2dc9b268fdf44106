use crate::cell::line::distance_to_loop;
use crate::cell::{intersect_faces, newton_3d, Cell, CellKind, LineHit, Location, NewtonSettings, PositionEval};
use crate::contour::{self, tables, CutCell};
use crate::error::KernelError;
use crate::locator::{CellArray, CutContext};
use crate::math::distance2;

/// `cos(36 deg)`: distance from the centre of the unit-circumradius pentagon to its edges.
const APOTHEM: f64 = 0.809_016_994_374_947_5;

/// Outward unit normals of the parametric pentagon's edges (edge `j` joins vertices `j` and `j + 1`),
/// at angles 108, 180, 252, 324 and 36 degrees.
const EDGE_NORMALS: [[f64; 2]; 5] = [
    [-0.309_016_994_374_947_45, 0.951_056_516_295_153_5],
    [-1.0, 0.0],
    [-0.309_016_994_374_947_34, -0.951_056_516_295_153_6],
    [0.809_016_994_374_947_3, -0.587_785_252_292_473_4],
    [0.809_016_994_374_947_5, 0.587_785_252_292_473_1],
];

/// In-plane parametric coordinates of the base vertices.
const BASE_PCOORDS: [[f64; 2]; 5] = [
    [0.654_508_497_187_473_7, 0.975_528_258_147_576_8],
    [0.095_491_502_812_526_27, 0.793_892_626_146_236_6],
    [0.095_491_502_812_526_3, 0.206_107_373_853_763_4],
    [0.654_508_497_187_473_7, 0.024_471_741_852_423_2],
    [1.0, 0.5],
];

/// Wachspress weights of the regular pentagon and their gradients, at the
/// rescaled point `(x, y)` in [-1, 1]^2.
fn wachspress(x: f64, y: f64) -> ([f64; 5], [[f64; 2]; 5]) {
    // Edge functions, positive inside.
    let l: [f64; 5] = std::array::from_fn(|j| APOTHEM - (x * EDGE_NORMALS[j][0] + y * EDGE_NORMALS[j][1]));

    // a_i is the product of the three edge functions not touching vertex i.
    let mut a = [0.0; 5];
    let mut da = [[0.0; 2]; 5];
    for i in 0..5 {
        let far = [(i + 1) % 5, (i + 2) % 5, (i + 3) % 5];
        a[i] = l[far[0]] * l[far[1]] * l[far[2]];
        for k in 0..3 {
            let (u, v) = (far[(k + 1) % 3], far[(k + 2) % 3]);
            let rest = l[u] * l[v];
            da[i][0] -= EDGE_NORMALS[far[k]][0] * rest;
            da[i][1] -= EDGE_NORMALS[far[k]][1] * rest;
        }
    }

    let b: f64 = a.iter().sum();
    let db = [da.iter().map(|d| d[0]).sum::<f64>(), da.iter().map(|d| d[1]).sum::<f64>()];

    let mut w = [0.0; 5];
    let mut dw = [[0.0; 2]; 5];
    for i in 0..5 {
        w[i] = a[i] / b;
        for c in 0..2 {
            dw[i][c] = (da[i][c] * b - a[i] * db[c]) / (b * b);
        }
    }
    (w, dw)
}

/// Ten-node prism with pentagonal bottom `0..5` and top `5..10` faces.
///
/// In-plane interpolation uses Wachspress coordinates of a regular pentagon
/// inscribed in the unit square; the third coordinate interpolates linearly
/// between bottom and top.
#[derive(Clone, Debug, PartialEq)]
pub struct PentagonalPrism {
    pub(crate) points: [[f64; 3]; 10],
    pub(crate) ids: [i64; 10],
    newton: NewtonSettings,
}

impl PentagonalPrism {
    pub const NEWTON: NewtonSettings = NewtonSettings {
        max_iterations: 10,
        converged: 1e-4,
        diverged: 1e6,
    };

    pub const INSIDE_TOLERANCE: f64 = 1e-3;

    pub fn new(points: [[f64; 3]; 10], ids: [i64; 10]) -> Self {
        Self { points, ids, newton: Self::NEWTON }
    }

    /// Prism with ids `0..10`.
    pub fn from_points(points: [[f64; 3]; 10]) -> Self {
        Self::new(points, std::array::from_fn(|i| i as i64))
    }

    pub fn with_newton(mut self, newton: NewtonSettings) -> Self {
        self.newton = newton;
        self
    }

    pub fn shape_functions(pcoords: &[f64; 3]) -> [f64; 10] {
        let (base, _) = wachspress(2.0 * (pcoords[0] - 0.5), 2.0 * (pcoords[1] - 0.5));
        let z = pcoords[2];
        std::array::from_fn(|i| if i < 5 { base[i] * (1.0 - z) } else { base[i - 5] * z })
    }

    /// d/dr for the ten vertices, then d/ds, then d/dt.
    pub fn shape_derivatives(pcoords: &[f64; 3]) -> [f64; 30] {
        let (base, grad) = wachspress(2.0 * (pcoords[0] - 0.5), 2.0 * (pcoords[1] - 0.5));
        let z = pcoords[2];
        let mut d = [0.0; 30];
        for i in 0..5 {
            // Factor 2 from the rescale to [-1, 1].
            let (dr, ds) = (2.0 * grad[i][0], 2.0 * grad[i][1]);
            d[i] = dr * (1.0 - z);
            d[i + 5] = dr * z;
            d[10 + i] = ds * (1.0 - z);
            d[10 + i + 5] = ds * z;
            d[20 + i] = -base[i];
            d[20 + i + 5] = base[i];
        }
        d
    }

    fn inside(pcoords: &[f64; 3]) -> bool {
        let tol = Self::INSIDE_TOLERANCE;
        if pcoords[2] < -tol || pcoords[2] > 1.0 + tol {
            return false;
        }
        let (base, _) = wachspress(2.0 * (pcoords[0] - 0.5), 2.0 * (pcoords[1] - 0.5));
        base.iter().all(|&w| w >= -tol)
    }

    /// Nearest parametric point of the closed prism domain.
    fn clamp_to_domain(pcoords: &[f64; 3]) -> [f64; 3] {
        let z = pcoords[2].clamp(0.0, 1.0);
        let (base, _) = wachspress(2.0 * (pcoords[0] - 0.5), 2.0 * (pcoords[1] - 0.5));
        if base.iter().all(|&w| w >= 0.0) {
            return [pcoords[0], pcoords[1], z];
        }
        let pentagon = BASE_PCOORDS.map(|[r, s]| [r, s, 0.0]);
        let edge = distance_to_loop(&[pcoords[0], pcoords[1], 0.0], &pentagon);
        [edge.closest[0], edge.closest[1], z]
    }
}

impl Cell for PentagonalPrism {
    fn kind(&self) -> CellKind {
        CellKind::PentagonalPrism
    }

    fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn point_ids(&self) -> &[i64] {
        &self.ids
    }

    fn parametric_coords(&self) -> Vec<[f64; 3]> {
        let bottom = BASE_PCOORDS.iter().map(|&[r, s]| [r, s, 0.0]);
        let top = BASE_PCOORDS.iter().map(|&[r, s]| [r, s, 1.0]);
        bottom.chain(top).collect()
    }

    fn parametric_center(&self) -> [f64; 3] {
        [0.5, 0.5, 0.5]
    }

    fn interpolation_functions(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        Self::shape_functions(pcoords).to_vec()
    }

    fn interpolation_derivs(&self, pcoords: &[f64; 3]) -> Vec<f64> {
        Self::shape_derivatives(pcoords).to_vec()
    }

    fn evaluate_position(&self, x: &[f64; 3]) -> PositionEval {
        let shape = |pc: &[f64; 3]| (Self::shape_functions(pc).to_vec(), Self::shape_derivatives(pc).to_vec());
        let Some(pcoords) = newton_3d(&self.points, x, self.parametric_center(), &self.newton, shape) else {
            return PositionEval::failed(10);
        };
        let weights = Self::shape_functions(&pcoords).to_vec();

        if Self::inside(&pcoords) {
            return PositionEval {
                location: Location::Inside,
                pcoords,
                weights,
                closest: *x,
                dist2: 0.0,
                sub_id: 0,
            };
        }

        let (closest, _) = self.evaluate_location(&Self::clamp_to_domain(&pcoords));
        PositionEval {
            location: Location::Outside,
            pcoords,
            weights,
            closest,
            dist2: distance2(&closest, x),
            sub_id: 0,
        }
    }

    fn contour(&self, value: f64, scalars: &[f64], ctx: &mut CutContext, out: &mut CellArray) {
        let cell = CutCell {
            points: &self.points,
            ids: &self.ids,
            scalars,
            edges: &tables::PENTAGONAL_PRISM_EDGES,
        };
        contour::contour_cell(&cell, &tables::PENTAGONAL_PRISM_CONTOUR, value, 2, ctx, out);
    }

    fn clip(&self, value: f64, scalars: &[f64], inside_out: bool, ctx: &mut CutContext, out: &mut CellArray) {
        match self.triangulate() {
            Ok(tets) => contour::clip_tetrahedra(&self.points, &self.ids, scalars, &tets, value, inside_out, ctx, out),
            Err(err) => tracing::debug!(%err, "skipping pentagonal prism clip"),
        }
    }

    fn intersect_with_line(&self, p1: &[f64; 3], p2: &[f64; 3], tol: f64) -> Option<LineHit> {
        let (t, x, face) = intersect_faces(&self.points, &self.ids, &tables::PENTAGONAL_PRISM_FACES, p1, p2, tol)?;
        let pcoords = self.evaluate_position(&x).pcoords;
        Some(LineHit { t, x, pcoords, sub_id: face })
    }

    /// Three wedges fanned from the `0-5` edge, each split into three tetrahedra.
    fn triangulate(&self) -> Result<Vec<usize>, KernelError> {
        let mut tets = Vec::with_capacity(36);
        for k in 1..4 {
            let wedge = [0, k, k + 1, 5, 5 + k, 6 + k];
            for tet in tables::WEDGE_TETRAS {
                tets.extend(tet.map(|i| wedge[i]));
            }
        }
        Ok(tets)
    }
}
