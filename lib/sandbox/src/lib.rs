use js_sys::{Array, Function, Promise};
use pixload::prelude::*;
use pixload::when::{self, Pending};
use wasm_bindgen::prelude::*;

mod utils;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    console_debug!("pixload ready");
}

/// `loadImage(url, allowCrossOrigin = true)`: `url` may be a string or a
/// promise for one.
#[wasm_bindgen(js_name = loadImage)]
pub fn load_image(url: JsValue, allow_cross_origin: Option<bool>) -> Result<Promise, JsValue> {
    // Workers have no document; nothing is cross-origin there.
    let options = LoaderOptions::from_document().unwrap_or_default();
    let allow_cross_origin = allow_cross_origin.unwrap_or(options.allow_cross_origin);
    load(url, options, allow_cross_origin)
}

/// `loadImageWithOptions(url, { allowCrossOrigin, baseUrl, documentUrl })`.
/// Missing URLs are taken from the current document.
#[wasm_bindgen(js_name = loadImageWithOptions)]
pub fn load_image_with_options(url: JsValue, options: JsValue) -> Result<Promise, JsValue> {
    let mut options = LoaderOptions::from_js(options)?;
    if let Ok(document) = LoaderOptions::from_document() {
        options.base_url = options.base_url.or(document.base_url);
        options.document_url = options.document_url.or(document.document_url);
    }
    let allow_cross_origin = options.allow_cross_origin;
    load(url, options, allow_cross_origin)
}

fn load(url: JsValue, options: LoaderOptions, allow_cross_origin: bool) -> Result<Promise, JsValue> {
    let request = request_from_js(url)?;
    let loader = ImageLoader::with_options(HtmlImageBackend, options);
    let image = loader.load_with(request, allow_cross_origin)?;
    Ok(image.then(|image| Ok(JsValue::from(image))).into_js_promise())
}

fn request_from_js(url: JsValue) -> Result<ImageRequest<JsValue>, JsValue> {
    if when::is_promise(&url) {
        let url = Pending::from_js(url).then(|url| {
            url.as_string()
                .ok_or_else(|| JsValue::from(Error::InvalidArgument("url must resolve to a string.")))
        });
        return Ok(ImageRequest::Pending(url));
    }
    match url.as_string() {
        Some(url) => Ok(ImageRequest::Url(url)),
        None if url.is_undefined() || url.is_null() => Ok(ImageRequest::Url(String::new())),
        None => Err(Error::InvalidArgument("url must be a string or a promise.").into()),
    }
}

/// `when(promiseOrValue, onFulfilled?, onRejected?)`.
#[wasm_bindgen(js_name = when)]
pub fn when_js(value: JsValue, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Promise {
    let mut pending = Pending::from_js(value);
    if let Some(on_fulfilled) = on_fulfilled {
        pending = pending.then(move |value| call_handler(&on_fulfilled, &value));
    }
    if let Some(on_rejected) = on_rejected {
        pending = pending.otherwise(move |error| call_handler(&on_rejected, &error));
    }
    pending.into_js_promise()
}

/// `whenAll(values)`: fulfils with an array of every value once all of them
/// fulfil.
#[wasm_bindgen(js_name = whenAll)]
pub fn when_all(values: Array) -> Promise {
    let values = values.iter().map(Pending::from_js);
    when::all(values)
        .then(|values| Ok(JsValue::from(values.into_iter().collect::<Array>())))
        .into_js_promise()
}

#[wasm_bindgen(js_name = isPromise)]
pub fn is_promise(value: &JsValue) -> bool {
    when::is_promise(value)
}

fn call_handler(handler: &Function, argument: &JsValue) -> Pending<JsValue, JsValue> {
    match handler.call1(&JsValue::UNDEFINED, argument) {
        Ok(returned) => Pending::from_js(returned),
        Err(thrown) => when::reject(thrown),
    }
}
