use reqwest::{Method, RequestBuilder, Response, StatusCode, Url, header, multipart};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::session::{EndReason, SessionHandle};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Credentials
///
/// Which token, if any, a request carries.
#[derive(Debug, Clone, Copy)]
pub enum Credentials<'a> {
    /// Login and registration. A 401 here means bad credentials, not an
    /// expired session.
    Anonymous,
    /// The current session's token. A 401 ends the session globally.
    Session,
    /// An explicit token that is not (yet) the session's, e.g. while a login
    /// or restore validates it. A 401 is returned to the caller as-is.
    Bearer(&'a str),
}

/// HttpTransport
///
/// The one place requests leave the process. It attaches the bearer token
/// and a request id, maps HTTP statuses onto `ApiError`, and acts as the
/// shared response interceptor: an authorization failure on a session
/// request clears the session before the error is returned.
#[derive(Clone)]
pub struct HttpTransport {
    base: String,
    client: reqwest::Client,
    session: SessionHandle,
}

impl HttpTransport {
    pub fn new(config: &AppConfig, session: SessionHandle) -> Result<Self, ApiError> {
        let base = config.api_url.trim_end_matches('/').to_string();
        Url::parse(&base).map_err(|e| ApiError::validation(format!("invalid API URL '{}': {}", base, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ApiError::from)?;

        Ok(Self {
            base,
            client,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Absolute URL for an API path such as `/events/3`.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        Url::parse(&format!("{}{}", self.base, path))
            .map_err(|e| ApiError::validation(format!("invalid path '{}': {}", path, e)))
    }

    /// A built request plus the session token it carries, if any.
    fn request(
        &self,
        method: Method,
        path: &str,
        creds: Credentials<'_>,
    ) -> Result<(RequestBuilder, Option<String>), ApiError> {
        let url = self.url(path)?;
        let request_id = Uuid::new_v4();
        tracing::debug!(%method, path, %request_id, "api request");
        let mut builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, request_id.to_string());

        let token = match creds {
            Credentials::Anonymous => None,
            Credentials::Session => self.session.bearer(),
            Credentials::Bearer(token) => Some(token.to_string()),
        };
        if let Some(token) = &token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let sent = match creds {
            Credentials::Session => token,
            _ => None,
        };
        Ok((builder, sent))
    }

    /// execute
    ///
    /// Sends the request and funnels every non-success status through
    /// `map_failure`. Transport-level errors become `NetworkFailure`.
    /// `sent` is the session token the request went out with.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        creds: Credentials<'_>,
        (builder, sent): (RequestBuilder, Option<String>),
    ) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "api request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(%method, path, %status, "api response");
            return Ok(response);
        }

        let message = failure_message(response).await;
        tracing::warn!(%method, path, %status, reason = %message, "api call rejected");
        Err(self.map_failure(status, message, creds, sent.as_deref()))
    }

    fn map_failure(
        &self,
        status: StatusCode,
        message: String,
        creds: Credentials<'_>,
        sent: Option<&str>,
    ) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => match creds {
                Credentials::Anonymous => ApiError::InvalidCredentials,
                Credentials::Bearer(_) => ApiError::Unauthorized,
                Credentials::Session => {
                    // Global invalidation, but only of the session whose
                    // token was rejected. A newer sign-in survives.
                    if let Some(token) = sent {
                        self.session.end_if_holds(token, EndReason::Expired);
                    }
                    ApiError::Unauthorized
                }
            },
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::ValidationFailure(message)
            }
            other => ApiError::Rejected {
                status: other.as_u16(),
                message,
            },
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        creds: Credentials<'_>,
        body: Option<serde_json::Value>,
    ) -> Result<Response, ApiError> {
        let (mut builder, sent) = self.request(method.clone(), path, creds)?;
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        self.execute(method, path, creds, (builder, sent)).await
    }

    // --- Typed helpers ---

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        creds: Credentials<'_>,
    ) -> Result<T, ApiError> {
        let response = self.call(Method::GET, path, creds, None).await?;
        decode(response).await
    }

    pub async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        creds: Credentials<'_>,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::validation(e.to_string()))?;
        let response = self.call(method, path, creds, Some(body)).await?;
        decode(response).await
    }

    /// Sends a JSON body and ignores whatever comes back.
    pub async fn send_json_discard<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        creds: Credentials<'_>,
        body: &B,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::validation(e.to_string()))?;
        self.call(method, path, creds, Some(body)).await?;
        Ok(())
    }

    /// Body-less call (approve, reject, delete, register) whose response is
    /// not needed.
    pub async fn send_empty(
        &self,
        method: Method,
        path: &str,
        creds: Credentials<'_>,
    ) -> Result<(), ApiError> {
        self.call(method, path, creds, None).await?;
        Ok(())
    }

    pub async fn get_bytes(&self, path: &str, creds: Credentials<'_>) -> Result<Vec<u8>, ApiError> {
        let response = self.call(Method::GET, path, creds, None).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(ApiError::from)?;
        Ok(bytes.to_vec())
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        creds: Credentials<'_>,
        form: multipart::Form,
    ) -> Result<(), ApiError> {
        let (builder, sent) = self.request(Method::POST, path, creds)?;
        self.execute(Method::POST, path, creds, (builder.multipart(form), sent))
            .await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(ApiError::from)?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

/// Pulls a human readable reason out of an error response: the JSON
/// `message` field when present, else the raw text, else the status phrase.
async fn failure_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    extract_message(&text).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    })
}

fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return value
            .get("message")
            .or_else(|| value.get("error"))
            .and_then(|m| m.as_str())
            .map(str::to_string);
    }
    Some(trimmed.to_string())
}
