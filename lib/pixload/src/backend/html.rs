use std::cell::RefCell;
use std::rc::Rc;

use pixload_sys::console_warn;
use pixload_when::{self as when, Pending};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlImageElement;

use super::ImageBackend;
use crate::image::HtmlImage;
use crate::origin::CrossOrigin;

/// Loads images through `HTMLImageElement`.
///
/// Fulfils with the element once its `load` event fires and rejects with the
/// `error` event, untouched. Whichever event fires first detaches both
/// handlers from the element and frees them.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlImageBackend;

/// Both event handlers of one element. Only one of them ever runs.
struct Listeners {
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut(JsValue)>,
}

type ListenerSlot = Rc<RefCell<Option<Listeners>>>;

fn detach(image: &HtmlImageElement, listeners: &ListenerSlot) {
    image.set_onload(None);
    image.set_onerror(None);
    // Dropping the handler that is currently running is deferred by
    // wasm-bindgen until it returns.
    drop(listeners.borrow_mut().take());
}

impl ImageBackend for HtmlImageBackend {
    type Error = JsValue;
    type Image = HtmlImage;

    fn create_image(&self, url: &str, cross_origin: CrossOrigin) -> Pending<HtmlImage, JsValue> {
        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(err) => return when::reject(err),
        };
        let (pending, resolver) = when::defer();
        let listeners = ListenerSlot::default();

        let onload = {
            let resolver = resolver.clone();
            let loaded = image.clone();
            let listeners = Rc::clone(&listeners);
            Closure::once(move || {
                detach(&loaded, &listeners);
                resolver.resolve(HtmlImage::from(loaded));
            })
        };
        let onerror = {
            let src = url.to_owned();
            let failed = image.clone();
            let listeners = Rc::clone(&listeners);
            Closure::once(move |event: JsValue| {
                detach(&failed, &listeners);
                console_warn!("failed to load image {}", crate::loader::abbreviate(&src));
                resolver.reject(event);
            })
        };
        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        *listeners.borrow_mut() = Some(Listeners {
            _onload: onload,
            _onerror: onerror,
        });

        // Must precede `src`, which starts the request.
        if let Some(mode) = cross_origin.attribute() {
            image.set_cross_origin(Some(mode));
        }
        image.set_src(url);

        pending
    }
}
