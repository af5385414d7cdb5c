/// The URL of the document this module runs in, if there is one. Its origin
/// is the one requests are made from.
///
/// Returns `None` inside workers and other contexts without a `window`.
pub fn document_url() -> Option<String> {
    web_sys::window()?.location().href().ok()
}

/// The URL relative references resolve against: `document.baseURI`, which
/// a `<base href>` element may point away from the document itself.
pub fn document_base_uri() -> Option<String> {
    web_sys::window()?.document()?.base_uri().ok().flatten()
}
