use std::mem;
use std::rc::Rc;

use pixload_sys::console_debug;
use pixload_when::{Pending, Thenable};
use wasm_bindgen::JsValue;

use crate::backend::{HtmlImageBackend, ImageBackend};
use crate::error::Error;
use crate::image::HtmlImage;
use crate::options::LoaderOptions;
use crate::origin::CrossOrigin;
use crate::result::Result;

/// What to load: a URL, or a pending result that will produce one.
pub enum ImageRequest<E> {
    Url(String),
    Pending(Pending<String, E>),
}

impl<E> ImageRequest<E>
where
    E: Clone + 'static,
{
    /// A request for whatever URL `url` eventually produces.
    pub fn pending<P>(url: P) -> Self
    where
        P: Thenable<Output = String, Error = E>, {
        ImageRequest::Pending(url.into_pending())
    }
}

impl<E> From<&str> for ImageRequest<E> {
    fn from(url: &str) -> Self {
        ImageRequest::Url(url.to_owned())
    }
}

impl<E> From<String> for ImageRequest<E> {
    fn from(url: String) -> Self {
        ImageRequest::Url(url)
    }
}

impl<E> From<Pending<String, E>> for ImageRequest<E> {
    fn from(url: Pending<String, E>) -> Self {
        ImageRequest::Pending(url)
    }
}

/// Loads images through an [ImageBackend].
///
/// Every call issues an independent request: nothing is pooled, cached or
/// deduplicated.
///
/// ```ignore
/// let loader = ImageLoader::for_document()?;
/// let images = pixload_when::all([loader.load("image1.png")?, loader.load("image2.png")?]);
/// ```
pub struct ImageLoader<B = HtmlImageBackend> {
    backend: Rc<B>,
    options: LoaderOptions,
}

impl ImageLoader<HtmlImageBackend> {
    /// A browser loader resolving URLs against the current document.
    pub fn for_document() -> Result<Self> {
        Ok(Self::with_options(HtmlImageBackend, LoaderOptions::from_document()?))
    }
}

impl Default for ImageLoader<HtmlImageBackend> {
    fn default() -> Self {
        Self::new(HtmlImageBackend)
    }
}

impl<B> ImageLoader<B>
where
    B: ImageBackend + 'static,
{
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, LoaderOptions::default())
    }

    pub fn with_options(backend: B, options: LoaderOptions) -> Self {
        Self {
            backend: Rc::new(backend),
            options,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Swaps in another backend and hands back the loader together with the
    /// previous backend. Passing that to [ImageLoader::replace_shared_backend]
    /// restores it.
    ///
    /// Loads already in flight keep using the backend they started with.
    pub fn replace_backend<N>(self, backend: N) -> (ImageLoader<N>, Rc<B>)
    where
        N: ImageBackend + 'static, {
        self.replace_shared_backend(Rc::new(backend))
    }

    /// Like [ImageLoader::replace_backend] for a backend that is already
    /// shared, such as one handed back by an earlier replacement.
    pub fn replace_shared_backend<N>(self, backend: Rc<N>) -> (ImageLoader<N>, Rc<B>)
    where
        N: ImageBackend + 'static, {
        let loader = ImageLoader {
            backend,
            options: self.options,
        };
        (loader, self.backend)
    }

    /// Replaces the options, returning the previous ones.
    pub fn set_options(&mut self, options: LoaderOptions) -> LoaderOptions {
        mem::replace(&mut self.options, options)
    }

    /// Loads an image with the configured cross-origin default.
    pub fn load(&self, request: impl Into<ImageRequest<B::Error>>) -> Result<Pending<B::Image, B::Error>> {
        self.load_with(request, self.options.allow_cross_origin)
    }

    /// Loads an image, requesting it with CORS when it is cross-origin and
    /// `allow_cross_origin` is set.
    ///
    /// An empty URL fails right away with [Error::InvalidArgument]. A direct
    /// URL is handed to the backend before this returns. A pending URL is
    /// awaited first, and only once the returned result is polled (awaited,
    /// or handed to JS as a promise); its rejection becomes the result's
    /// rejection. The loader's options are captured at call time.
    pub fn load_with(
        &self, request: impl Into<ImageRequest<B::Error>>, allow_cross_origin: bool,
    ) -> Result<Pending<B::Image, B::Error>> {
        match request.into() {
            ImageRequest::Url(url) => {
                if url.is_empty() {
                    return Err(Error::InvalidArgument("url is required."));
                }
                Ok(create_image(&*self.backend, &self.options, &url, allow_cross_origin))
            },
            ImageRequest::Pending(url) => {
                let backend = Rc::clone(&self.backend);
                let options = self.options.clone();
                Ok(url.then(move |url| {
                    create_image(&*backend, &options, &url, allow_cross_origin)
                }))
            },
        }
    }
}

fn create_image<B: ImageBackend>(
    backend: &B, options: &LoaderOptions, url: &str, allow_cross_origin: bool,
) -> Pending<B::Image, B::Error> {
    let cross_origin = options.cross_origin_for(url, allow_cross_origin);
    console_debug!("loading image {} (crossorigin: {})", abbreviate(url), cross_origin);
    backend.create_image(url, cross_origin)
}

const LOGGED_URL_LEN: usize = 64;

/// Shortens long URLs, data URIs mostly, for log output.
pub(crate) fn abbreviate(url: &str) -> String {
    match url.char_indices().nth(LOGGED_URL_LEN) {
        Some((end, _)) => format!("{}... ({} bytes)", &url[..end], url.len()),
        None => url.to_owned(),
    }
}

/// Loads `request` in the browser, resolving it against the current
/// document.
///
/// Rejects with the image's `error` event when loading fails.
pub fn load_image(
    request: impl Into<ImageRequest<JsValue>>, allow_cross_origin: bool,
) -> Result<Pending<HtmlImage, JsValue>> {
    ImageLoader::for_document()?.load_with(request, allow_cross_origin)
}
