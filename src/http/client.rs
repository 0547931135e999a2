//! HTTP client abstraction and its reqwest implementation

use crate::core::CancellationToken;
use crate::http::{HttpError, HttpRequest, HttpResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use std::time::{Duration, Instant};
use tracing::debug;

/// Sends parsed requests
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(
        &self,
        request: &HttpRequest,
        timeout: Duration,
        cancellation: &CancellationToken,
    ) -> Result<HttpResponse, HttpError>;
}

/// [`HttpClient`] backed by a shared `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder, HttpError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| HttpError::InvalidRequest(format!("unknown method '{}'", request.method)))?;
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| HttpError::InvalidRequest(format!("invalid URL '{}': {}", request.url, e)))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|_| HttpError::InvalidRequest(format!("invalid header name '{}'", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidRequest(format!("invalid value for header '{}'", name)))?;
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        Ok(builder)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(
        &self,
        request: &HttpRequest,
        timeout: Duration,
        cancellation: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        let builder = self.build(request)?;
        debug!("Sending {} {}", request.method, request.url);

        let started = Instant::now();
        let exchange = async {
            let response = builder
                .send()
                .await
                .map_err(|e| HttpError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        value.to_str().unwrap_or("<binary>").to_string(),
                    )
                })
                .collect();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::Transport(format!("failed to read body: {}", e)))?;
            Ok::<_, HttpError>((status, headers, body))
        };

        let (status, headers, body) = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(HttpError::Cancelled),
            result = tokio::time::timeout(timeout, exchange) => {
                result.map_err(|_| HttpError::Timeout(timeout.as_secs()))??
            }
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
            duration_ms: started.elapsed().as_millis(),
        })
    }
}
