use serde::{Deserialize, Serialize};
use url::Url;
use wasm_bindgen::JsValue;

use crate::error::Error;
use crate::origin::CrossOrigin;
use crate::result::Result;

/// Settings shared by every request an [ImageLoader](crate::ImageLoader)
/// issues.
///
/// From JavaScript the same settings are passed as a plain object:
///
/// ```ignore
/// {
///     allowCrossOrigin: false,
///     baseUrl: "https://cdn.example.org/assets/",
///     documentUrl: "https://example.com/app/",
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderOptions {
    /// Whether cross-origin URLs are requested with CORS. Used by
    /// [ImageLoader::load](crate::ImageLoader::load).
    pub allow_cross_origin: bool,

    /// URL relative references resolve against, `document.baseURI` in a
    /// browser. Also stands in for `document_url` when that is missing.
    pub base_url: Option<Url>,

    /// URL of the requesting document. Its origin decides what counts as
    /// cross-origin. Falls back to `base_url`.
    pub document_url: Option<Url>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            allow_cross_origin: true,
            base_url: None,
            document_url: None,
        }
    }
}

impl LoaderOptions {
    /// Options for the document this module runs in.
    pub fn from_document() -> Result<Self> {
        let href = pixload_sys::document_url().ok_or(Error::NoDocument)?;
        let base = pixload_sys::document_base_uri().unwrap_or_else(|| href.clone());
        Self::default().with_base_url(&base)?.with_document_url(&href)
    }

    /// Reads options from a JS object, falling back to the defaults for
    /// missing fields and for `undefined`/`null`.
    pub fn from_js(value: JsValue) -> Result<Self> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_wasm_bindgen::from_value(value)?)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    pub fn with_document_url(mut self, document_url: &str) -> Result<Self> {
        self.document_url = Some(Url::parse(document_url)?);
        Ok(self)
    }

    /// The mode `url` is requested with under these options.
    pub fn cross_origin_for(&self, url: &str, allow_cross_origin: bool) -> CrossOrigin {
        CrossOrigin::for_request(
            url,
            allow_cross_origin,
            self.base_url.as_ref(),
            self.document_url.as_ref(),
        )
    }

    pub fn allow_cross_origin(mut self, allow: bool) -> Self {
        self.allow_cross_origin = allow;
        self
    }
}
