use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    /// Any JS value exposing a callable `then` member, native promise or
    /// not.
    #[wasm_bindgen(extends = js_sys::Object, typescript_type = "PromiseLike<any>")]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub type JsThenable;
}

/// Returns true iff `value` is a non-null object (or function) whose `then`
/// member is callable.
pub fn is_thenable(value: &JsValue) -> bool {
    if !value.is_object() && !value.is_function() {
        return false;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("then"))
        .map(|then| then.is_function())
        .unwrap_or(false)
}

impl JsThenable {
    /// Views `value` as a thenable when it passes [is_thenable].
    pub fn from_value(value: &JsValue) -> Option<&JsThenable> {
        is_thenable(value).then(|| value.unchecked_ref())
    }
}
