//! Backend API operations
//!
//! The tree only needs three calls from the backend; they are collected in
//! the [`RepoBackend`] trait so a tree can be driven by something other than
//! the HTTP client.

mod analyze;
mod github;

use async_trait::async_trait;

use crate::error::Error;
use crate::model::AnalysisRecord;
use crate::model::Node;
use crate::model::RepoRef;

/// The backend calls a [`RepoTree`](crate::RepoTree) is built on.
///
/// Implementations report HTTP 401 on the listing and content calls as
/// [`Error::NotAuthenticated`], other listing/content failures as
/// [`Error::Fetch`], and analysis failures as [`Error::Analysis`].
#[async_trait]
pub trait RepoBackend: Send + Sync {
    /// Lists the entries of the directory at `path` (`""` for the root).
    async fn list_files(&self, repo: &RepoRef, path: &str) -> Result<Vec<Node>, Error>;

    /// Fetches the raw text of the file at `path`.
    async fn get_file(&self, repo: &RepoRef, path: &str) -> Result<String, Error>;

    /// Submits file content to the analyzer.
    async fn analyze_file(&self, file_content: &str) -> Result<AnalysisRecord, Error>;
}
