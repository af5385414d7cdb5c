//! Asynchronous image loading on top of the browser's native decoder.
//!
//! ```ignore
//! use pixload::prelude::*;
//!
//! let loader = ImageLoader::for_document()?;
//! let image = loader.load("some/image/url.png")?;
//! let image = image
//!     .otherwise(|event| {
//!         console_error!("image failed to load: {:?}", event);
//!         Err(event)
//!     })
//!     .await?;
//! ```
#![deny(unsafe_code)]

#[doc(hidden)]
pub use js_sys;
pub use pixload_when as when;
pub use url::Url;
#[doc(hidden)]
pub use wasm_bindgen;
#[doc(hidden)]
pub use web_sys;

pub mod backend;
pub mod error;
pub mod image;
pub mod loader;
pub mod options;
pub mod origin;
pub mod prelude;
pub mod result;

pub use backend::{HtmlImageBackend, ImageBackend};
pub use error::Error;
pub use image::HtmlImage;
pub use loader::{load_image, ImageLoader, ImageRequest};
pub use options::LoaderOptions;
pub use origin::CrossOrigin;
pub use result::Result;
