use crate::implicit::{Frustum, ImplicitFunction, Plane, SelectionLoop};
use crate::wasm::utils::{js_error, parse_flat_points, parse_js_point};
use wasm_bindgen::prelude::*;

// Shared evaluate/gradient/contains surface for every implicit wrapper.
macro_rules! implicit_methods {
    ($wrapper:ident, $js:ident) => {
        #[wasm_bindgen(js_class = $js)]
        impl $wrapper {
            pub fn evaluate(&self, x: f64, y: f64, z: f64) -> f64 {
                self.inner.evaluate(&[x, y, z])
            }

            pub fn gradient(&self, x: f64, y: f64, z: f64) -> Vec<f64> {
                self.inner.gradient(&[x, y, z]).to_vec()
            }

            pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
                self.inner.contains(&[x, y, z])
            }

            /// Accepts an `[x, y, z]` array.
            pub fn contains_point(&self, point: JsValue) -> Result<bool, JsValue> {
                let p = parse_js_point(&point).ok_or_else(|| js_error("Expected an [x, y, z] array"))?;
                Ok(self.inner.contains(&p))
            }

            pub fn evaluate_many(&self, coords: &[f64]) -> Result<Vec<f64>, JsValue> {
                Ok(self.inner.evaluate_many(&parse_flat_points(coords)?))
            }

            pub fn contains_many(&self, coords: &[f64]) -> Result<Vec<u8>, JsValue> {
                let inside = self.inner.contains_many(&parse_flat_points(coords)?);
                Ok(inside.into_iter().map(u8::from).collect())
            }
        }
    };
}

#[wasm_bindgen(js_name = Plane)]
pub struct PlaneWASM {
    inner: Plane,
}

#[wasm_bindgen(js_class = Plane)]
impl PlaneWASM {
    #[wasm_bindgen(constructor)]
    pub fn new(px: f64, py: f64, pz: f64, nx: f64, ny: f64, nz: f64) -> PlaneWASM {
        PlaneWASM { inner: Plane::new([px, py, pz], [nx, ny, nz]) }
    }

    pub fn fit(coords: &[f64]) -> Result<PlaneWASM, JsValue> {
        let inner = Plane::fit(&parse_flat_points(coords)?).map_err(|e| js_error(&e.to_string()))?;
        Ok(PlaneWASM { inner })
    }

    pub fn set_axis_aligned(&mut self, axis_aligned: bool) {
        self.inner.set_axis_aligned(axis_aligned);
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.inner.set_offset(offset);
    }

    pub fn push(&mut self, distance: f64) {
        self.inner.push(distance);
    }

    #[wasm_bindgen(getter)]
    pub fn normal(&self) -> Vec<f64> {
        self.inner.effective_normal().to_vec()
    }

    #[wasm_bindgen(getter)]
    pub fn origin(&self) -> Vec<f64> {
        self.inner.effective_origin().to_vec()
    }

    /// `[t, x, y, z]` when the segment crosses the plane, or `undefined`.
    pub fn intersect_with_line(&self, p1: &[f64], p2: &[f64]) -> Option<Vec<f64>> {
        let (a, b) = (p1.get(..3)?, p2.get(..3)?);
        let (t, x) = self.inner.intersect_with_line(&[a[0], a[1], a[2]], &[b[0], b[1], b[2]]).within()?;
        Some(vec![t, x[0], x[1], x[2]])
    }
}

implicit_methods!(PlaneWASM, Plane);

#[wasm_bindgen(js_name = Frustum)]
pub struct FrustumWASM {
    inner: Frustum,
}

#[wasm_bindgen(js_class = Frustum)]
impl FrustumWASM {
    /// Angles in degrees.
    #[wasm_bindgen(constructor)]
    pub fn new(near_plane_distance: f64, horizontal_angle: f64, vertical_angle: f64) -> FrustumWASM {
        FrustumWASM { inner: Frustum::new(near_plane_distance, horizontal_angle, vertical_angle) }
    }

    #[wasm_bindgen(getter)]
    pub fn near_plane_distance(&self) -> f64 {
        self.inner.near_plane_distance()
    }

    #[wasm_bindgen(getter)]
    pub fn horizontal_angle(&self) -> f64 {
        self.inner.horizontal_angle()
    }

    #[wasm_bindgen(getter)]
    pub fn vertical_angle(&self) -> f64 {
        self.inner.vertical_angle()
    }

    pub fn set_near_plane_distance(&mut self, distance: f64) {
        self.inner.set_near_plane_distance(distance);
    }

    pub fn set_horizontal_angle(&mut self, degrees: f64) {
        self.inner.set_horizontal_angle(degrees);
    }

    pub fn set_vertical_angle(&mut self, degrees: f64) {
        self.inner.set_vertical_angle(degrees);
    }
}

implicit_methods!(FrustumWASM, Frustum);

#[wasm_bindgen(js_name = SelectionLoop)]
pub struct SelectionLoopWASM {
    inner: SelectionLoop,
}

#[wasm_bindgen(js_class = SelectionLoop)]
impl SelectionLoopWASM {
    #[wasm_bindgen(constructor)]
    pub fn new(coords: &[f64], seed: u64) -> Result<SelectionLoopWASM, JsValue> {
        let inner = SelectionLoop::new(parse_flat_points(coords)?).with_seed(seed);
        inner.status().map_err(|e| js_error(&e.to_string()))?;
        Ok(SelectionLoopWASM { inner })
    }

    pub fn set_loop(&mut self, coords: &[f64]) -> Result<(), JsValue> {
        self.inner.set_loop(parse_flat_points(coords)?);
        self.inner.status().map_err(|e| js_error(&e.to_string()))
    }

    pub fn set_normal(&mut self, nx: f64, ny: f64, nz: f64) -> Result<(), JsValue> {
        self.inner.set_automatic_normal_generation(false);
        self.inner.set_normal([nx, ny, nz]);
        self.inner.status().map_err(|e| js_error(&e.to_string()))
    }
}

implicit_methods!(SelectionLoopWASM, SelectionLoop);
