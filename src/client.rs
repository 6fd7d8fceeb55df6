// Backend request wrapper: joins paths onto the configured base, sends JSON, and maps the
// backend's fixed response shapes onto one success payload or one RequestError.

use crate::config::BackendConfig;
use crate::version;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Success value of a request: `None` for 204 (and for envelopes without a payload field).
pub type Payload = Option<Value>;

const RESULT_SUCCESS: &str = "SUCCESS";
const UNEXPECTED_RESPONSE: &str = "Unexpected response";
const INVALID_JSON: &str = "Invalid JSON response";
const GENERIC_FAILURE: &str = "Request failed";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("backend base path is not configured")]
    Configuration,
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Server(String),
    #[error("{0}")]
    Protocol(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        RequestError::Transport(err.to_string())
    }
}

pub struct RequestClient {
    http: Client,
    base_path: Option<String>,
}

impl RequestClient {
    pub fn new(base_path: Option<String>, timeout: Duration) -> Result<Self, RequestError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(version::user_agent())
            .build()?;
        let base_path = base_path.filter(|b| !b.trim().is_empty());
        Ok(Self { http, base_path })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, RequestError> {
        Self::new(
            config.base_path.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    /// Full URL for `path`; one leading slash is dropped so the base path is never overridden.
    pub fn url_for(&self, path: &str) -> Result<String, RequestError> {
        let base = self.base_path.as_deref().ok_or(RequestError::Configuration)?;
        let path = path.strip_prefix('/').unwrap_or(path);
        Ok(format!("{base}{path}"))
    }

    pub async fn send(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Payload, RequestError> {
        self.send_query(path, method, &[], body).await
    }

    pub async fn send_query(
        &self,
        path: &str,
        method: Method,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Payload, RequestError> {
        let result = self.dispatch(path, method.clone(), query, body).await;
        if let Err(e) = &result {
            match e {
                RequestError::Configuration => tracing::error!(
                    path,
                    "backend base path is not configured; set backend.base_path or BACKEND_BASE_PATH"
                ),
                _ => tracing::error!(path, %method, error = %e, "backend request failed"),
            }
        }
        result
    }

    /// GET `path` and decode the success payload as `T`.
    pub async fn get_detail<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        let payload = self
            .send(path, Method::GET, None)
            .await?
            .ok_or_else(|| RequestError::Protocol(UNEXPECTED_RESPONSE.to_string()))?;
        serde_json::from_value(payload).map_err(|e| {
            tracing::error!(path, error = %e, "backend payload has an unexpected shape");
            RequestError::Protocol(format!("{UNEXPECTED_RESPONSE}: {e}"))
        })
    }

    async fn dispatch(
        &self,
        path: &str,
        method: Method,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Payload, RequestError> {
        let url = self.url_for(path)?;
        let mut request = self.http.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        request = match body {
            Some(body) => request.json(body),
            None => request.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        tracing::debug!(%url, status = status.as_u16(), "backend responded");
        interpret_response(status, &bytes)
    }
}

/// Maps a backend response onto the success payload or a tagged failure.
pub fn interpret_response(status: StatusCode, body: &[u8]) -> Result<Payload, RequestError> {
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let json: Value = serde_json::from_slice(body)
        .map_err(|_| RequestError::Transport(INVALID_JSON.to_string()))?;

    match status {
        StatusCode::CREATED => Ok(json.get("message").cloned()),
        StatusCode::OK => match json.get("result") {
            None => Err(RequestError::Protocol(UNEXPECTED_RESPONSE.to_string())),
            Some(result) if result.as_str() == Some(RESULT_SUCCESS) => {
                Ok(json.get("detail").cloned())
            }
            Some(_) => Err(RequestError::Server(
                message_of(&json).unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            )),
        },
        _ => match message_of(&json) {
            Some(message) => Err(RequestError::Server(message)),
            None => Err(RequestError::Protocol(UNEXPECTED_RESPONSE.to_string())),
        },
    }
}

fn message_of(json: &Value) -> Option<String> {
    match json.get("message")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
