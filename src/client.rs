use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;

use crate::chat::ChatProvider;
use crate::error::{Error, Result};
use crate::observability::{PROVIDER_REQUEST_DURATION, PROVIDER_REQUEST_ERRORS, PROVIDER_REQUESTS};
use crate::types::{GenerateContentRequest, GenerateContentResponse};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: Option<String>,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// A missing API key is not an error here; it is reported when a session
    /// is started so the caller can show it in the conversation.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::initialization(format!("Failed to build HTTP client: {}", e)))?;

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
            base_url,
            timeout,
        })
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::initialization("API_KEY environment variable is not set."))?;
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(api_key)
                .map_err(|_| Error::initialization("API key contains invalid characters"))?,
        );
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::send(
                    format!("Failed to read error response: {}", e),
                    Some(status_code),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_status = detail.as_ref().and_then(|d| d.status.clone());
        let error_message = detail
            .and_then(|d| d.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if error_body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    error_body.clone()
                }
            });

        match error_status {
            Some(error_status) => Error::send(
                format!("[{status_code} {error_status}] {error_message}"),
                Some(status_code),
            ),
            None => Error::send(
                format!("[{status_code}] {error_message}"),
                Some(status_code),
            ),
        }
    }

    /// Send a `generateContent` request and return the parsed response.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}models/{}:generateContent", self.base_url, model);
        let headers = self.default_headers()?;

        PROVIDER_REQUESTS.click();
        let start = Instant::now();
        let result = self.post(&url, headers, request).await;
        PROVIDER_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if result.is_err() {
            PROVIDER_REQUEST_ERRORS.click();
        }
        result
    }

    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::send(
                        format!(
                            "Request timed out after {} seconds: {}",
                            self.timeout.as_secs_f64(),
                            e
                        ),
                        None,
                    )
                } else if e.is_connect() {
                    Error::send(format!("Connection error: {}", e), None)
                } else {
                    Error::send(format!("Request failed: {}", e), None)
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| Error::send(format!("Failed to parse response: {}", e), None))
    }
}

#[async_trait::async_trait]
impl ChatProvider for GeminiClient {
    fn validate(&self) -> Result<()> {
        self.default_headers().map(|_| ())
    }

    async fn generate(&self, model: &str, request: &GenerateContentRequest) -> Result<String> {
        let response = self.generate_content(model, request).await?;
        response
            .text()
            .ok_or_else(|| Error::send(response.missing_text_reason(), None))
    }
}
