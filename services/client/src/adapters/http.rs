//! services/client/src/adapters/http.rs
//!
//! The shared HTTP plumbing for every backend adapter: one `reqwest` client
//! with the common headers and timeout, and the response handling all
//! endpoints share.

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use vytal_core::ports::{PortError, PortResult, SERVER_ERROR_PREFIX};

/// How much of an unparseable body is quoted back in the error.
const BODY_EXCERPT_LEN: usize = 50;

//=========================================================================================
// The Shared Client
//=========================================================================================

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    /// Builds a client for the backend at `base_url` (without a trailing `/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        // The development backend sits behind an ngrok tunnel.
        headers.insert(
            "ngrok-skip-browser-warning",
            header::HeaderValue::from_static("true"),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.http.put(self.url(path))
    }

    /// Sends the request and returns the JSON body of a successful response.
    pub async fn send(&self, request: RequestBuilder) -> PortResult<Value> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_transport_error)?;
        debug!(status, bytes = text.len(), "Backend responded");
        interpret_body(status, &text)
    }

    /// Like `send`, then decodes the body (or one field of it) into `T`.
    pub async fn send_as<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        field: Option<&str>,
    ) -> PortResult<T> {
        let mut body = self.send(request).await?;
        let value = match field {
            Some(name) => body
                .get_mut(name)
                .map(Value::take)
                .ok_or_else(|| PortError::Unexpected(format!("Response has no '{}' field", name)))?,
            None => body,
        };
        serde_json::from_value(value)
            .map_err(|e| PortError::Unexpected(format!("Unexpected response shape: {}", e)))
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

//=========================================================================================
// Response Handling
//=========================================================================================

fn map_transport_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Timeout
    } else if e.is_connect() {
        PortError::Unavailable(e.to_string())
    } else {
        PortError::Unexpected(e.to_string())
    }
}

fn excerpt(text: &str) -> String {
    let cut: String = text.chars().take(BODY_EXCERPT_LEN).collect();
    format!("{}{}...", SERVER_ERROR_PREFIX, cut)
}

/// Picks the message out of an error body. The auth and profile endpoints use
/// `error`, the payment endpoints use `message`.
fn error_message(body: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

/// Turns a status and raw body into the parsed JSON or a `PortError`.
pub fn interpret_body(status: u16, text: &str) -> PortResult<Value> {
    let is_success = (200..300).contains(&status);
    let body: Value = match serde_json::from_str(text) {
        Ok(body) => body,
        Err(_) if is_success && text.trim().is_empty() => Value::Null,
        Err(_) if is_success => return Err(PortError::Unexpected(excerpt(text))),
        Err(_) => {
            return Err(PortError::Remote {
                status,
                message: None,
            })
        }
    };

    if !is_success {
        return Err(match status {
            401 => PortError::Unauthorized(error_message(&body)),
            _ => PortError::Remote {
                status,
                message: error_message(&body),
            },
        });
    }

    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(PortError::Remote {
            status,
            message: error_message(&body),
        });
    }

    Ok(body)
}
