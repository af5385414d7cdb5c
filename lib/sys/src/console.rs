//! Sinks behind the `console_*!` macros.
//!
//! Outside of `wasm32` there is no JS console to talk to, so messages are
//! dropped after formatting. This keeps host-side unit tests free of
//! wasm-bindgen imports.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        use wasm_bindgen::JsValue;

        pub fn debug(message: &str) {
            web_sys::console::debug_1(&JsValue::from_str(message));
        }

        pub fn log(message: &str) {
            web_sys::console::log_1(&JsValue::from_str(message));
        }

        pub fn warn(message: &str) {
            web_sys::console::warn_1(&JsValue::from_str(message));
        }

        pub fn error(message: &str) {
            web_sys::console::error_1(&JsValue::from_str(message));
        }
    } else {
        #[inline]
        pub fn debug(_message: &str) {}

        #[inline]
        pub fn log(_message: &str) {}

        #[inline]
        pub fn warn(_message: &str) {}

        #[inline]
        pub fn error(_message: &str) {}
    }
}
