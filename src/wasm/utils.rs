use js_sys::Array;
use wasm_bindgen::prelude::*;

/// Splits a flat coordinate array into points.
pub fn parse_flat_points(coords: &[f64]) -> Result<Vec<[f64; 3]>, JsValue> {
    if coords.len() % 3 != 0 {
        return Err(js_error(&format!(
            "Point coordinates must be a multiple of 3, found {}",
            coords.len()
        )));
    }
    Ok(coords.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

pub fn flatten_points(points: &[[f64; 3]]) -> Vec<f64> {
    points.iter().flatten().copied().collect()
}

/// Reads `[x, y, z]` from a JS array.
pub fn parse_js_point(val: &JsValue) -> Option<[f64; 3]> {
    let arr = val.dyn_ref::<Array>()?;
    if arr.length() < 3 {
        return None;
    }
    Some([arr.get(0).as_f64()?, arr.get(1).as_f64()?, arr.get(2).as_f64()?])
}

pub fn js_error(message: &str) -> JsValue {
    js_sys::Error::new(message).into()
}
