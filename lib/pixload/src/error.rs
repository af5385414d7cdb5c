use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("invalid loader options: {0}")]
    InvalidOptions(String),

    #[error("no document is available in this context")]
    NoDocument,
}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Error::InvalidOptions(e.to_string())
    }
}

impl From<Error> for JsValue {
    fn from(e: Error) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
