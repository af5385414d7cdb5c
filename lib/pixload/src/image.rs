use send_wrapper::SendWrapper;
use wasm_bindgen::JsValue;
use web_sys::HtmlImageElement;

/// A decoded image, owned by whoever awaited it.
#[derive(Debug, Clone)]
pub struct HtmlImage(SendWrapper<HtmlImageElement>);

impl PartialEq for HtmlImage {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl HtmlImage {
    /// Intrinsic width in pixels.
    pub fn width(&self) -> u32 {
        self.0.natural_width()
    }

    /// Intrinsic height in pixels.
    pub fn height(&self) -> u32 {
        self.0.natural_height()
    }

    /// The URL the image was loaded from, as resolved by the browser.
    pub fn src(&self) -> String {
        self.0.src()
    }

    pub fn cross_origin(&self) -> Option<String> {
        self.0.cross_origin()
    }

    pub fn into_inner(self) -> HtmlImageElement {
        self.0.take()
    }
}

impl AsRef<JsValue> for HtmlImage {
    fn as_ref(&self) -> &JsValue {
        &self.0
    }
}

impl From<HtmlImageElement> for HtmlImage {
    fn from(image: HtmlImageElement) -> Self {
        Self(SendWrapper::new(image))
    }
}

impl From<HtmlImage> for HtmlImageElement {
    fn from(image: HtmlImage) -> Self {
        image.into_inner()
    }
}

impl From<HtmlImage> for JsValue {
    fn from(image: HtmlImage) -> Self {
        JsValue::from(image.0.take())
    }
}
