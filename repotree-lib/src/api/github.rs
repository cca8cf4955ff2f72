//! GitHub-proxied endpoints

use async_trait::async_trait;

use super::RepoBackend;
use crate::error::ApiError;
use crate::error::Error;
use crate::model::AnalysisRecord;
use crate::model::Node;
use crate::model::RepoRef;
use crate::model::Repository;
use crate::DashboardClient;

impl DashboardClient {
    /// Lists the repositories visible to the logged-in user.
    pub async fn list_repositories(&self) -> Result<Vec<Repository>, Error> {
        let url = self.url("/api/github/repositories");
        log::debug!("GET {}", url);

        let request = self.inner.http_client.get(&url);
        let response = self.send(request).await.map_err(Error::Fetch)?;
        let response = self.check_github(response).await?;
        parse_json(response).await.map_err(Error::Fetch)
    }

    /// Lists one directory of a repository.
    ///
    /// Entries come back exactly as the backend returned them, hidden ones
    /// included.
    pub async fn list_files(&self, repo: &RepoRef, path: &str) -> Result<Vec<Node>, Error> {
        let url = self.github_url("list-files", repo, path);
        log::debug!("GET {}", url);

        let request = self.inner.http_client.get(&url);
        let response = self.send(request).await.map_err(Error::Fetch)?;
        let response = self.check_github(response).await?;
        parse_json(response).await.map_err(Error::Fetch)
    }

    /// Fetches the raw content of a file.
    pub async fn get_file(&self, repo: &RepoRef, path: &str) -> Result<String, Error> {
        let url = self.github_url("get-file", repo, path);
        log::debug!("GET {}", url);

        let request = self.inner.http_client.get(&url);
        let response = self.send(request).await.map_err(Error::Fetch)?;
        let response = self.check_github(response).await?;
        response
            .text()
            .await
            .map_err(|e| Error::Fetch(ApiError::Network(e)))
    }

    fn github_url(&self, endpoint: &str, repo: &RepoRef, path: &str) -> String {
        self.url(&format!(
            "/api/github/{}/{}/{}?path={}",
            endpoint,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.repo),
            urlencoding::encode(path)
        ))
    }
}

/// Reads a JSON body, keeping the raw text around for the error.
pub(crate) async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::parse_with_body(e.to_string(), body))
}

#[async_trait]
impl RepoBackend for DashboardClient {
    async fn list_files(&self, repo: &RepoRef, path: &str) -> Result<Vec<Node>, Error> {
        DashboardClient::list_files(self, repo, path).await
    }

    async fn get_file(&self, repo: &RepoRef, path: &str) -> Result<String, Error> {
        DashboardClient::get_file(self, repo, path).await
    }

    async fn analyze_file(&self, file_content: &str) -> Result<AnalysisRecord, Error> {
        DashboardClient::analyze_file(self, file_content).await
    }
}
