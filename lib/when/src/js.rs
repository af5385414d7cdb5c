//! Interop with JavaScript promises and thenables.

use js_sys::Promise;
use pixload_sys::JsThenable;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::pending::Pending;
use crate::thenable::Thenable;

/// Returns true iff `value` is a non-null object exposing a callable `then`.
///
/// A duck-typed check: any thenable qualifies, not only native promises.
pub fn is_promise(value: &JsValue) -> bool {
    pixload_sys::is_thenable(value)
}

impl Pending<JsValue, JsValue> {
    /// Normalises any JS value through `Promise.resolve`: thenables are
    /// followed, anything else becomes an already fulfilled result.
    pub fn from_js(value: JsValue) -> Self {
        Promise::resolve(&value).into_pending()
    }

    /// Hands the outcome back to JavaScript as a native promise.
    pub fn into_js_promise(self) -> Promise {
        future_to_promise(self)
    }
}

impl From<Promise> for Pending<JsValue, JsValue> {
    fn from(promise: Promise) -> Self {
        Pending::from_future(JsFuture::from(promise))
    }
}

impl Thenable for Promise {
    type Output = JsValue;
    type Error = JsValue;

    fn into_pending(self) -> Pending<JsValue, JsValue> {
        self.into()
    }
}

impl Thenable for JsThenable {
    type Output = JsValue;
    type Error = JsValue;

    fn into_pending(self) -> Pending<JsValue, JsValue> {
        Pending::from_js(self.into())
    }
}
