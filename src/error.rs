use thiserror::Error;

/// Errors surfaced by tracking calls.
///
/// Delivery is best-effort: every failure is also logged at `warn` level,
/// so callers that want the classic fire-and-forget behavior can ignore the
/// returned `Result` and still get a diagnostic.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be assembled (e.g. a header value that is not
    /// valid in HTTP).
    #[error("failed to build tracking request: {0}")]
    Request(#[source] reqwest::Error),

    /// The request could not be delivered (DNS failure, refused
    /// connection, TLS handshake failure, ...).
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}
