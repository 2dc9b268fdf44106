use crate::cell::polygon::{self, point_in_polygon, query_rng, PolygonLocation};
use crate::cell::{
    evaluate_positions, AnyCell, Cell, PentagonalPrism, Pixel, Polygon, Pyramid, Quad, Tetra, Triangle,
};
use crate::wasm::utils::{flatten_points, js_error, parse_flat_points};
use wasm_bindgen::prelude::*;

fn fixed<const N: usize>(coords: &[f64]) -> Result<[[f64; 3]; N], JsValue> {
    let points = parse_flat_points(coords)?;
    points
        .try_into()
        .map_err(|p: Vec<[f64; 3]>| js_error(&format!("Expected {} points, found {}", N, p.len())))
}

/// Ear-cut triangulation of a flat polygon; triangle vertex indices, three per triangle.
#[wasm_bindgen]
pub fn triangulate_polygon(coords: &[f64]) -> Result<Vec<u32>, JsValue> {
    let points = parse_flat_points(coords)?;
    let triangles = polygon::ear_cut(&points, polygon::triangulate::DEFAULT_TOLERANCE)
        .map_err(|e| js_error(&e.to_string()))?;
    Ok(triangles.into_iter().map(|i| i as u32).collect())
}

/// 1 inside, 0 outside, -1 for a degenerate polygon.
#[wasm_bindgen]
pub fn classify_point_in_polygon(coords: &[f64], x: f64, y: f64, z: f64, seed: u64) -> Result<i32, JsValue> {
    let points = parse_flat_points(coords)?;
    let Some(normal) = polygon::compute_normal(&points) else {
        return Ok(-1);
    };
    let bounds = crate::bounds::BoundingBox::from_points(&points);
    let query = [x, y, z];
    let mut rng = query_rng(seed, &query);
    Ok(match point_in_polygon(&query, &points, &bounds, &normal, &mut rng) {
        PolygonLocation::Inside => 1,
        PolygonLocation::Outside => 0,
        PolygonLocation::Failure => -1,
    })
}

/// WASM wrapper for any supported cell.
#[wasm_bindgen(js_name = Cell)]
pub struct CellWASM {
    inner: AnyCell,
}

#[wasm_bindgen(js_class = Cell)]
impl CellWASM {
    pub fn new_triangle(coords: &[f64]) -> Result<CellWASM, JsValue> {
        Ok(CellWASM { inner: Triangle::from_points(fixed(coords)?).into() })
    }

    pub fn new_quad(coords: &[f64]) -> Result<CellWASM, JsValue> {
        Ok(CellWASM { inner: Quad::from_points(fixed(coords)?).into() })
    }

    pub fn new_pixel(coords: &[f64]) -> Result<CellWASM, JsValue> {
        Ok(CellWASM { inner: Pixel::from_points(fixed(coords)?).into() })
    }

    pub fn new_polygon(coords: &[f64], seed: u64) -> Result<CellWASM, JsValue> {
        let polygon = Polygon::from_points(parse_flat_points(coords)?).map_err(|e| js_error(&e.to_string()))?;
        Ok(CellWASM { inner: polygon.with_seed(seed).into() })
    }

    pub fn new_tetra(coords: &[f64]) -> Result<CellWASM, JsValue> {
        Ok(CellWASM { inner: Tetra::from_points(fixed(coords)?).into() })
    }

    pub fn new_pyramid(coords: &[f64]) -> Result<CellWASM, JsValue> {
        Ok(CellWASM { inner: Pyramid::from_points(fixed(coords)?).into() })
    }

    pub fn new_pentagonal_prism(coords: &[f64]) -> Result<CellWASM, JsValue> {
        Ok(CellWASM { inner: PentagonalPrism::from_points(fixed(coords)?).into() })
    }

    #[wasm_bindgen(getter)]
    pub fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    #[wasm_bindgen(getter)]
    pub fn points(&self) -> Vec<f64> {
        flatten_points(self.inner.points())
    }

    /// `[location, r, s, t, dist2]`.
    pub fn evaluate_position(&self, x: f64, y: f64, z: f64) -> Vec<f64> {
        let eval = self.inner.evaluate_position(&[x, y, z]);
        vec![eval.location.code() as f64, eval.pcoords[0], eval.pcoords[1], eval.pcoords[2], eval.dist2]
    }

    /// Parallel inverse mapping; five values per point as in `evaluate_position`.
    pub fn evaluate_positions(&self, coords: &[f64]) -> Result<Vec<f64>, JsValue> {
        let points = parse_flat_points(coords)?;
        Ok(evaluate_positions(&self.inner, &points)
            .into_iter()
            .flat_map(|e| [e.location.code() as f64, e.pcoords[0], e.pcoords[1], e.pcoords[2], e.dist2])
            .collect())
    }

    pub fn evaluate_location(&self, r: f64, s: f64, t: f64) -> Vec<f64> {
        self.inner.evaluate_location(&[r, s, t]).0.to_vec()
    }

    pub fn interpolation_functions(&self, r: f64, s: f64, t: f64) -> Vec<f64> {
        self.inner.interpolation_functions(&[r, s, t])
    }

    /// `[t, x, y, z]` of the first hit, or `undefined`.
    pub fn intersect_with_line(&self, p1: &[f64], p2: &[f64], tol: f64) -> Option<Vec<f64>> {
        let (a, b) = (p1.get(..3)?, p2.get(..3)?);
        let hit = self.inner.intersect_with_line(&[a[0], a[1], a[2]], &[b[0], b[1], b[2]], tol)?;
        Some(vec![hit.t, hit.x[0], hit.x[1], hit.x[2]])
    }

    pub fn triangulate(&self) -> Result<Vec<u32>, JsValue> {
        let simplices = self.inner.triangulate().map_err(|e| js_error(&e.to_string()))?;
        Ok(simplices.into_iter().map(|i| i as u32).collect())
    }
}
