pub use pixload_sys::{console_debug, console_error, console_log, console_warn};
pub use pixload_when::{Pending, Thenable};

pub use crate::backend::{HtmlImageBackend, ImageBackend};
pub use crate::error::Error;
pub use crate::image::HtmlImage;
pub use crate::loader::{load_image, ImageLoader, ImageRequest};
pub use crate::options::LoaderOptions;
pub use crate::origin::CrossOrigin;
