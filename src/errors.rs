use thiserror::Error;

/// Why a remote action did not complete.
///
/// Every variant is handled at the controller boundary; none of them reach
/// the page as an unhandled fault.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("request did not complete: {0}")]
    NetworkFailure(String),
    #[error("server rejected the request with status {0}")]
    ServerRejected(u16),
    #[error("response body could not be decoded: {0}")]
    DecodeFailure(String),
    #[error("input prompt dismissed or invalid")]
    UserCancelled,
    #[error("page has no CSRF token to attach")]
    MissingCsrfToken,
    #[error("trigger is missing data needed for the request: {0}")]
    MalformedTrigger(String),
}

impl ActionError {
    /// Failures the user is told about with an error toast.
    pub fn is_reported(&self) -> bool {
        !matches!(self, ActionError::UserCancelled)
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        ActionError::DecodeFailure(err.to_string())
    }
}

/// Errors from the binary's own plumbing (config, page files).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid base url {url}: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("failed to read page snapshot {path}: {source}")]
    PageRead { path: String, source: std::io::Error },
    #[error("failed to parse page snapshot {path}: {source}")]
    PageParse { path: String, source: serde_json::Error },
    #[error("no element matches selector {0}")]
    NoSuchElement(String),
    #[error("http client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

