//! Thin HTTP helpers for talking to a Todo API.
//!
//! Each helper sends one request and resolves once the response has been read.
//! A 2xx status settles into an [`ApiResponse`]; any other status is rejected
//! with [`ClientError::Status`], whose message is the reason phrase
//! (`Not Found`, `Bad Request`, ...).

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, ACCEPT, CONTENT_TYPE, ORIGIN},
    Method, RequestBuilder, StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const JSON: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{}", reason(.status))]
    Status { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            ClientError::Encode(_) => None,
        }
    }
}

fn reason(status: &StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

/// A settled response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body; non-JSON text is kept as a string, an empty body is `None`.
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Looks up a top-level field of a JSON object body.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.as_ref().and_then(|body| body.get(name))
    }
}

fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

#[derive(Debug, Clone)]
pub struct TodoClient {
    client: reqwest::Client,
}

impl TodoClient {
    /// Builds a client; without a timeout a hung request waits forever.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// CORS preflight carrying `origin`.
    pub async fn options(&self, url: &str, origin: &str) -> Result<ApiResponse, ClientError> {
        let request = self
            .client
            .request(Method::OPTIONS, url)
            .header(ORIGIN, origin);
        send(request).await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        data: &T,
    ) -> Result<ApiResponse, ClientError> {
        self.update(url, Method::POST, data).await
    }

    pub async fn get(&self, url: &str) -> Result<ApiResponse, ClientError> {
        let request = self.client.get(url).header(ACCEPT, JSON);
        send(request).await
    }

    pub async fn del(&self, url: &str) -> Result<ApiResponse, ClientError> {
        send(self.client.delete(url)).await
    }

    /// Sends `data` as JSON with an arbitrary method (PUT, PATCH, ...).
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        url: &str,
        method: Method,
        data: &T,
    ) -> Result<ApiResponse, ClientError> {
        let body = serde_json::to_vec(data)?;
        let request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(body);
        send(request).await
    }
}

async fn send(request: RequestBuilder) -> Result<ApiResponse, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.bytes().await?;
    debug!(%status, len = bytes.len(), "response settled");

    if !status.is_success() {
        return Err(ClientError::Status {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    Ok(ApiResponse {
        status,
        headers,
        body: decode_body(&bytes),
    })
}
