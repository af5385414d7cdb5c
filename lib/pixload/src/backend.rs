//! Strategies that turn a URL into a decoded image.

mod html;

pub use html::HtmlImageBackend;
use pixload_when::Pending;

use crate::origin::CrossOrigin;

/// Creates one native image per call.
///
/// [ImageLoader](crate::ImageLoader) is generic over this trait so tests and
/// non-browser hosts can plug in their own decoder without touching the
/// loader itself.
pub trait ImageBackend {
    /// The decoded image handed to the caller.
    type Image: Clone + 'static;
    /// The native failure, passed to the caller unchanged.
    type Error: Clone + 'static;

    /// Starts loading `url`. The `cross_origin` mode must be applied before
    /// the load begins.
    fn create_image(&self, url: &str, cross_origin: CrossOrigin) -> Pending<Self::Image, Self::Error>;
}
