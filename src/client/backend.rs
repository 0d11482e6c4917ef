use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use tracing::{error, info};

use crate::dto::matching_dto::{JobSearchRequest, UpstreamErrorBody};
use crate::models::cv_data::CvData;
use crate::wizard::file::SelectedFile;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-2xx response; `detail` is the backend's own message when it sent one.
    #[error("backend returned {status}")]
    Upstream { status: u16, detail: Option<String> },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// The resume-parsing and job-matching service.
#[async_trait]
pub trait MatchingBackend: Send + Sync {
    async fn summarize(&self, user_id: &str, file: &SelectedFile) -> Result<CvData, BackendError>;

    /// Computes and stores matches for the confirmed CV data.
    async fn search(&self, request: &JobSearchRequest) -> Result<(), BackendError>;
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn check(path: &str, response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<UpstreamErrorBody>(&body)
            .ok()
            .and_then(|b| b.message());
        error!(%status, path, detail = ?detail, "matching backend call failed");
        Err(BackendError::Upstream {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl MatchingBackend for BackendClient {
    async fn summarize(&self, user_id: &str, file: &SelectedFile) -> Result<CvData, BackendError> {
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("user_id", user_id.to_string());

        let response = self
            .client
            .post(format!("{}/summarize", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let response = Self::check("/summarize", response).await?;
        let cv = response.json::<CvData>().await?;
        info!(user_id, file = %file.name, "cv summarized");
        Ok(cv)
    }

    async fn search(&self, request: &JobSearchRequest) -> Result<(), BackendError> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(request)
            .send()
            .await?;
        Self::check("/search", response).await?;
        info!(user_id = %request.user_id, role = %request.role, "job search accepted");
        Ok(())
    }
}
