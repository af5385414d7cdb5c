#![deny(unsafe_code)]

#[doc(hidden)]
pub use js_sys;
#[doc(hidden)]
pub use wasm_bindgen;
#[doc(hidden)]
pub use web_sys;

#[doc(hidden)]
pub mod console;
pub mod document;
pub mod thenable;

pub use document::{document_base_uri, document_url};
pub use thenable::{is_thenable, JsThenable};

#[macro_export]
macro_rules! console_debug {
    ($($t:tt)*) => {
        $crate::console::debug(&format_args!($($t)*).to_string())
    };
}

#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::console::log(&format_args!($($t)*).to_string())
    };
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => {
        $crate::console::warn(&format_args!($($t)*).to_string())
    };
}

#[macro_export]
macro_rules! console_error {
    ($($t:tt)*) => {
        $crate::console::error(&format_args!($($t)*).to_string())
    };
}
