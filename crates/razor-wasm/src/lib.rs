//! WASM bindings for the Razor template parser.
//!
//! Exposes `parse()` and `extractAttributeExpressions()` to JavaScript via
//! wasm-bindgen. Both throw on syntax errors.

use wasm_bindgen::prelude::*;

/// Parse a template into its document tree.
///
/// Returns `{ nodes: [{ kind, begin, end, children, span }] }` where `kind`
/// is `"Html"`, `"Razor"` or `"Text"` and `end` is `null` for leaves.
#[wasm_bindgen]
pub fn parse(source: &str) -> Result<JsValue, JsError> {
    let doc = razor_parser::parse(source).map_err(|e| JsError::new(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&doc).map_err(|e| JsError::new(&e.to_string()))
}

/// The `@` expressions of one HTML tag, in source order.
#[wasm_bindgen(js_name = extractAttributeExpressions)]
pub fn extract_attribute_expressions(tag: &str) -> Result<js_sys::Array, JsError> {
    let expressions = razor_parser::extract_attribute_expressions(tag)
        .map_err(|e| JsError::new(&e.to_string()))?;

    Ok(expressions.into_iter().map(JsValue::from).collect())
}

/// Get the parser version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
