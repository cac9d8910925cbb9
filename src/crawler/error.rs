use thiserror::Error;

/// Failures at the HTTP layer. A non-2xx status is *not* one of these; the
/// transport hands status codes back as data and the caller decides.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid request path: {0}")]
    Url(#[from] url::ParseError),
}

/// Failures that abort a single branch of the hierarchy. The walker catches
/// these at model (or brand) level and records the branch as empty.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("endpoint returned HTTP {status}")]
    BadStatus { status: u16 },
}
