use std::path::Path;

use equipment_stats::{HistoryEntry, Summary, UploadResponse};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use tracing::debug;

use crate::{ClientError, Result};

/// Thin async client; every call is a single request with no retry.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: None,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{endpoint}/", self.base_url)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let req = self.http.request(method, self.url(endpoint));
        match &self.credentials {
            Some((user, pass)) => req.basic_auth(user, Some(pass)),
            None => req,
        }
    }

    pub async fn upload_file(&self, path: &Path) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        self.upload_bytes(name, bytes).await
    }

    pub async fn upload_bytes(&self, file_name: String, bytes: Vec<u8>) -> Result<UploadResponse> {
        debug!(file = %file_name, size = bytes.len(), "uploading csv");
        let part = Part::bytes(bytes).file_name(file_name).mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let resp = self.request(Method::POST, "upload").multipart(form).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn summary(&self) -> Result<Summary> {
        let resp = self.request(Method::GET, "summary").send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        let resp = self.request(Method::GET, "history").send().await?;
        Ok(check(resp).await?.json().await?)
    }

    /// Raw PDF bytes of the latest report.
    pub async fn report(&self) -> Result<Vec<u8>> {
        let resp = self.request(Method::GET, "pdf").send().await?;
        Ok(check(resp).await?.bytes().await?.to_vec())
    }
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Api { status: status.as_u16(), message: error_message(&body) })
}

/// The `error` string of a JSON error body, else the body itself.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"error": "No data available"}"#), "No data available");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"detail": "x"}"#), r#"{"detail": "x"}"#);
    }

    #[test]
    fn test_urls_have_trailing_slash() {
        let c = ApiClient::new("http://localhost:8000/");
        assert_eq!(c.url("summary"), "http://localhost:8000/api/summary/");
    }
}
