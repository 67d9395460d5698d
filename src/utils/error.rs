/// Failures that the tournament store can surface to its caller.
///
/// Only `Unauthorized` is raised locally; everything else is a backend failure and is
/// propagated unchanged. A missing document is not an error at all (see `TournamentStore::list`).
#[derive(Debug)]
pub enum StoreError {
    /// A mutating operation was attempted without a credential.
    Unauthorized,
    /// The credential string did not have exactly five colon-separated fields.
    MalformedCredential { fields: usize },
    /// The storage endpoint could not be turned into a URL.
    InvalidEndpoint(String),
    /// The request never produced a response (DNS, TLS, connection reset...).
    Transport(String),
    /// The backend answered with an error status (including 404 for a missing bucket).
    Status {
        operation: &'static str,
        status: u16,
    },
    /// The stored document is not a JSON array of tournaments.
    MalformedDocument(String),
}

impl StoreError {
    /// Whether this failure came from the backend (or from malformed input destined for it),
    /// as opposed to being rejected locally before any network call.
    pub fn is_backend_failure(&self) -> bool {
        !matches!(self, StoreError::Unauthorized)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use StoreError::*;
        match self {
            Unauthorized => write!(f, "Not authenticated."),
            MalformedCredential { fields } => write!(
                f,
                "Malformed credential: expected 5 colon-separated fields, got {}.",
                fields
            ),
            InvalidEndpoint(endpoint) => write!(f, "Invalid storage endpoint '{}'.", endpoint),
            Transport(reason) => write!(f, "Storage request failed: {}", reason),
            Status { operation, status } => {
                write!(f, "Storage {} failed with status code {}.", operation, status)
            }
            MalformedDocument(reason) => write!(f, "Malformed tournaments document: {}", reason),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::MalformedDocument(err.to_string())
    }
}
