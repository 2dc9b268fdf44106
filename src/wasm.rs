//! JavaScript bindings.
//!
//! Points cross the boundary as flat `[x0, y0, z0, x1, y1, z1, ...]` arrays.

use wasm_bindgen::prelude::*;

pub mod cell;
pub mod implicit;
pub mod utils;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

#[wasm_bindgen(typescript_custom_section)]
const TS_CONSTANTS_LOCATION: &'static str = r#"
export const LOCATION_INSIDE = 1;
export const LOCATION_OUTSIDE = 0;
export const LOCATION_FAILED = -1;
"#;
