//! Cross-origin policy for image requests.

use std::fmt;

use url::Url;

/// The `crossorigin` mode an image request is issued with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CrossOrigin {
    /// No `crossorigin` attribute: a plain same-origin or no-cors request.
    #[default]
    None,
    /// `crossorigin="anonymous"`: a CORS request without credentials.
    Anonymous,
}

impl CrossOrigin {
    /// Decides the mode for `url` requested by the document at `document`,
    /// with relative URLs resolved against `base`.
    ///
    /// Data URIs never use CORS, and nothing does when `allow_cross_origin`
    /// is off. Otherwise only URLs whose origin differs from the document's
    /// do.
    pub fn for_request(
        url: &str, allow_cross_origin: bool, base: Option<&Url>, document: Option<&Url>,
    ) -> Self {
        if is_data_uri(url) || !allow_cross_origin {
            CrossOrigin::None
        } else if is_cross_origin_url(url, base, document) {
            CrossOrigin::Anonymous
        } else {
            CrossOrigin::None
        }
    }

    /// The value for the element's `crossOrigin` attribute, if it is set.
    pub fn attribute(self) -> Option<&'static str> {
        match self {
            CrossOrigin::None => None,
            CrossOrigin::Anonymous => Some("anonymous"),
        }
    }

    pub fn is_anonymous(self) -> bool {
        self == CrossOrigin::Anonymous
    }
}

impl fmt::Display for CrossOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute().unwrap_or("none"))
    }
}

/// Whether `url` uses the `data:` scheme.
pub fn is_data_uri(url: &str) -> bool {
    url.get(..5)
        .map_or(false, |scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Whether `url`, resolved against `base`, targets a different origin than
/// the requesting `document`.
///
/// Either one stands in for the other when missing, so with only a base
/// relative URLs are same-origin. Without either there is no requesting
/// origin, and a URL that cannot be parsed is not considered cross-origin
/// either.
pub fn is_cross_origin_url(url: &str, base: Option<&Url>, document: Option<&Url>) -> bool {
    let Some(document) = document.or(base) else {
        return false;
    };
    match base.unwrap_or(document).join(url) {
        Ok(target) => !same_origin(document, &target),
        Err(_) => false,
    }
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}
