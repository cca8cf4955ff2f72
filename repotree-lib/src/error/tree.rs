//! Operation-level error types

use super::ApiError;

/// Errors surfaced by tree and client operations.
///
/// Only [`Error::NotAuthenticated`] gets special treatment: it triggers the
/// login redirect and is never stored as node state. Everything else is
/// logged at the operation boundary and the node is left without content.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend reported HTTP 401 on a GitHub-proxied call.
    #[error("Not authenticated, login at {login_url}")]
    NotAuthenticated {
        /// Where the user should be sent to log in.
        login_url: String,
    },

    /// Any other failed request.
    #[error("Fetch failed: {0}")]
    Fetch(#[source] ApiError),

    /// The file was fetched, but the analysis call failed.
    #[error("Analysis failed: {0}")]
    Analysis(#[source] ApiError),

    /// The tree was unmounted before the operation finished.
    #[error("Tree is unmounted")]
    Unmounted,
}

impl Error {
    /// Returns `true` if this is an authentication failure.
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, Self::NotAuthenticated { .. })
    }

    /// Returns the underlying API error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::NotAuthenticated { .. } | Self::Unmounted => None,
            Self::Fetch(e) | Self::Analysis(e) => Some(e),
        }
    }
}
