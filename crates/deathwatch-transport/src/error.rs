/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[cfg(feature = "http")]
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced a response (DNS, TLS, timeout, reset).
    #[cfg(feature = "http")]
    #[error("request for {label} failed: {source}")]
    Request {
        label: String,
        #[source]
        source: reqwest::Error,
    },

    /// The portal answered with a non-success status.
    #[error("{label} returned HTTP {status}")]
    Status { label: String, status: u16 },

    /// The response body could not be read as text.
    #[cfg(feature = "http")]
    #[error("reading body of {label} failed: {source}")]
    Body {
        label: String,
        #[source]
        source: reqwest::Error,
    },
}
