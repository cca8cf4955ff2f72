//! File analysis endpoint

use serde::Serialize;

use super::github::parse_json;
use crate::error::ApiError;
use crate::error::Error;
use crate::model::AnalysisRecord;
use crate::DashboardClient;

#[derive(Serialize)]
struct AnalyzeFileRequest<'a> {
    file_content: &'a str,
}

impl DashboardClient {
    /// Submits file content to the analyzer and returns its record.
    ///
    /// Any failure, including a non-200 status, is reported as
    /// [`Error::Analysis`]. The analyzer is not GitHub-proxied, so a 401 here
    /// does not mean the session is gone.
    pub async fn analyze_file(&self, file_content: &str) -> Result<AnalysisRecord, Error> {
        let url = self.url("/api/analyze/file");
        log::debug!("POST {} ({} bytes)", url, file_content.len());

        let request = self
            .inner
            .http_client
            .post(&url)
            .json(&AnalyzeFileRequest { file_content });
        let response = self.send(request).await.map_err(Error::Analysis)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Analysis(ApiError::http(status.as_u16(), body)));
        }

        parse_json(response).await.map_err(Error::Analysis)
    }
}
