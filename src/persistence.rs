//! Saving finished conversations to the persistence service.
//!
//! [`PersistenceClient::save_transcript`] posts the transcript to
//! `{base_url}/api/chat/save`, retrying server-class failures with
//! exponential backoff. Client-class failures are never retried.
//!
//! Progress is reported through a [`Notifier`]; the HTTP call and the wait
//! between attempts sit behind the [`SaveTransport`] and [`Backoff`] traits.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::notify::{Notification, Notifier, NullNotifier};
use crate::observability::{
    SAVE_ATTEMPTS, SAVE_BACKOFF, SAVE_FAILURES, SAVE_RETRIES, SAVE_SUCCESSES,
};
use crate::types::{ChatTurn, SaveRequest};

/// Path of the save endpoint, relative to the configured base URL.
pub const SAVE_PATH: &str = "/api/chat/save";

/// Total attempts per save, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Wait before the first retry; doubled for each retry after that.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1000);

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl TransportResponse {
    /// Creates a new response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Delivers one save request.
#[async_trait::async_trait]
pub trait SaveTransport: Send + Sync {
    /// Posts `request` to `url`.
    ///
    /// Any response, whatever its status, is `Ok`. `Err` is reserved for
    /// failures where no response arrived, reported as a
    /// [`Error::SaveServer`] without a status code.
    async fn post(&self, url: &str, request: &SaveRequest) -> Result<TransportResponse>;
}

/// Waits between attempts.
#[async_trait::async_trait]
pub trait Backoff: Send + Sync {
    /// Suspends the caller for `delay`.
    async fn wait(&self, delay: Duration);
}

/// [`Backoff`] backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioBackoff;

#[async_trait::async_trait]
impl Backoff for TokioBackoff {
    async fn wait(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// [`SaveTransport`] over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    /// Creates a transport with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::initialization(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl SaveTransport for HttpTransport {
    async fn post(&self, url: &str, request: &SaveRequest) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::save_server(None, format!("Request timed out: {}", e))
                } else if e.is_connect() {
                    Error::save_server(None, format!("Connection error: {}", e))
                } else {
                    Error::save_server(None, format!("Request failed: {}", e))
                }
            })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::save_server(None, format!("Failed to read response: {}", e)))?;
        Ok(TransportResponse { status, body })
    }
}

/// Client for the transcript persistence service.
#[derive(Clone)]
pub struct PersistenceClient {
    endpoint: String,
    transport: Arc<dyn SaveTransport>,
    backoff: Arc<dyn Backoff>,
    notifier: Arc<dyn Notifier>,
    max_attempts: u32,
    backoff_base: Duration,
}

impl PersistenceClient {
    /// Creates a client posting to `{base_url}/api/chat/save` over HTTP.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self::with_transport(base_url, Arc::new(HttpTransport::new()?)))
    }

    /// Creates a client with a custom transport.
    pub fn with_transport(base_url: &str, transport: Arc<dyn SaveTransport>) -> Self {
        Self {
            endpoint: endpoint_for(base_url),
            transport,
            backoff: Arc::new(TokioBackoff),
            notifier: Arc::new(NullNotifier),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    /// Sets where progress notifications go.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sets how the client waits between attempts.
    pub fn with_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the total number of attempts per save. At least one is always made.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the wait before the first retry.
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Returns the full URL saves are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the wait that follows failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }

    /// Saves a transcript, retrying server-class failures.
    ///
    /// Returns the parsed response body on success. Client-class failures stop
    /// immediately; server-class and network failures are retried until the
    /// attempt budget is spent, and the last one is returned.
    pub async fn save_transcript(&self, transcript: &[ChatTurn]) -> Result<Value> {
        let request = SaveRequest::now(transcript);
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            debug!(
                attempt,
                max_attempts = self.max_attempts,
                endpoint = %self.endpoint,
                messages = request.messages.len(),
                "saving chat history"
            );
            SAVE_ATTEMPTS.click();

            let outcome = match self.transport.post(&self.endpoint, &request).await {
                Ok(response) => classify(response),
                Err(err) => Outcome::Retry(err),
            };

            match outcome {
                Outcome::Saved(body) => {
                    SAVE_SUCCESSES.click();
                    info!(attempt, response = %body, "chat history saved");
                    self.notifier
                        .notify(Notification::success("Chat history saved successfully."));
                    return Ok(body);
                }
                Outcome::Reject(err) => {
                    SAVE_FAILURES.click();
                    error!(attempt, error = %err, "chat history rejected");
                    self.notifier.notify(Notification::error(format!(
                        "Failed to save chat history: {}",
                        err.message()
                    )));
                    return Err(err);
                }
                Outcome::Retry(err) => {
                    warn!(attempt, error = %err, "chat history save failed");
                    if attempt < self.max_attempts {
                        let delay = self.delay_for(attempt);
                        SAVE_RETRIES.click();
                        SAVE_BACKOFF.add(delay.as_secs_f64());
                        self.notifier.notify(Notification::warning(format!(
                            "Saving chat history failed ({}). Retrying in {}s (attempt {} of {}).",
                            err.message(),
                            delay.as_secs_f64(),
                            attempt + 1,
                            self.max_attempts
                        )));
                        self.backoff.wait(delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        SAVE_FAILURES.click();
        let err = last_error.unwrap_or_else(|| Error::save_server(None, "no save attempt was made"));
        error!(attempts = self.max_attempts, error = %err, "giving up on chat history save");
        self.notifier.notify(Notification::error(format!(
            "Failed to save chat history after {} attempts: {}",
            self.max_attempts,
            err.message()
        )));
        Err(err)
    }
}

fn endpoint_for(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), SAVE_PATH)
}

enum Outcome {
    Saved(Value),
    Reject(Error),
    Retry(Error),
}

fn classify(response: TransportResponse) -> Outcome {
    let status = response.status;
    match status {
        200..=299 => Outcome::Saved(parse_body(&response.body)),
        500..=599 => Outcome::Retry(Error::save_server(
            Some(status),
            error_message(status, &response.body),
        )),
        _ => Outcome::Reject(Error::save_client(
            status,
            error_message(status, &response.body),
        )),
    }
}

fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "save response was not JSON");
            Value::Null
        }
    }
}

/// Pulls `message` out of an error body, falling back to the status reason.
fn error_message(status: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(String::from)
                .unwrap_or_else(|| format!("HTTP status {status}"))
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::notify::{NotificationLevel, RecordingNotifier};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays scripted responses and records requests.
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<TransportResponse>>>,
        pub(crate) requests: Mutex<Vec<(String, SaveRequest)>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<Result<TransportResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn attempts(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl SaveTransport for ScriptedTransport {
        async fn post(&self, url: &str, request: &SaveRequest) -> Result<TransportResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), request.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(TransportResponse::new(200, "{}")))
        }
    }

    /// Backoff that records delays instead of sleeping.
    #[derive(Default)]
    pub(crate) struct RecordingBackoff {
        pub(crate) waits: Mutex<Vec<Duration>>,
    }

    #[async_trait::async_trait]
    impl Backoff for RecordingBackoff {
        async fn wait(&self, delay: Duration) {
            self.waits.lock().unwrap().push(delay);
        }
    }

    struct Harness {
        client: PersistenceClient,
        transport: Arc<ScriptedTransport>,
        backoff: Arc<RecordingBackoff>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(responses: Vec<Result<TransportResponse>>) -> Harness {
        let transport = Arc::new(ScriptedTransport::new(responses));
        let backoff = Arc::new(RecordingBackoff::default());
        let notifier = Arc::new(RecordingNotifier::new());
        let client = PersistenceClient::with_transport("http://localhost:3001", transport.clone())
            .with_backoff(backoff.clone())
            .with_notifier(notifier.clone());
        Harness {
            client,
            transport,
            backoff,
            notifier,
        }
    }

    fn transcript() -> Vec<ChatTurn> {
        vec![ChatTurn::assistant("greeting"), ChatTurn::user("hello")]
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let h = harness(vec![
            Ok(TransportResponse::new(503, "")),
            Ok(TransportResponse::new(503, "")),
            Ok(TransportResponse::new(200, r#"{"id": "abc"}"#)),
        ]);

        let body = h.client.save_transcript(&transcript()).await.unwrap();
        assert_eq!(body["id"], "abc");
        assert_eq!(h.transport.attempts(), 3);
        assert_eq!(
            *h.backoff.waits.lock().unwrap(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );

        let notifications = h.notifier.notifications();
        assert_eq!(notifications.len(), 3);
        assert_eq!(notifications[0].level, NotificationLevel::Warning);
        assert_eq!(notifications[1].level, NotificationLevel::Warning);
        assert_eq!(
            notifications.last().map(|n| n.level),
            Some(NotificationLevel::Success)
        );
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let h = harness(vec![Ok(TransportResponse::new(
            400,
            r#"{"message": "bad input"}"#,
        ))]);

        let err = h.client.save_transcript(&transcript()).await.unwrap_err();
        assert!(err.is_save_client());
        assert!(err.to_string().contains("bad input"));
        assert_eq!(h.transport.attempts(), 1);
        assert!(h.backoff.waits.lock().unwrap().is_empty());

        let notifications = h.notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, NotificationLevel::Error);
        assert!(notifications[0].message.contains("bad input"));
    }

    #[tokio::test]
    async fn client_error_without_body_uses_status_reason() {
        let h = harness(vec![Ok(TransportResponse::new(404, ""))]);
        let err = h.client.save_transcript(&transcript()).await.unwrap_err();
        assert_eq!(err.message(), "Not Found");
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn exhausted_retries_surface_last_error() {
        let h = harness(vec![
            Ok(TransportResponse::new(500, "")),
            Err(Error::save_server(None, "Connection error: refused")),
            Ok(TransportResponse::new(502, r#"{"message": "upstream down"}"#)),
        ]);

        let err = h.client.save_transcript(&transcript()).await.unwrap_err();
        assert!(err.is_save_server());
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.message(), "upstream down");
        assert_eq!(h.transport.attempts(), 3);
        assert_eq!(h.backoff.waits.lock().unwrap().len(), 2);

        let last = h.notifier.notifications().pop().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert!(last.message.contains("after 3 attempts"));
    }

    #[tokio::test]
    async fn network_failure_is_retried() {
        let h = harness(vec![
            Err(Error::save_server(None, "Connection error: refused")),
            Ok(TransportResponse::new(201, "")),
        ]);

        let body = h.client.save_transcript(&transcript()).await.unwrap();
        assert_eq!(body, Value::Null);
        assert_eq!(h.transport.attempts(), 2);
        assert_eq!(
            *h.backoff.waits.lock().unwrap(),
            vec![Duration::from_millis(1000)]
        );
    }

    #[tokio::test]
    async fn posts_transcript_to_save_endpoint() {
        let h = harness(vec![]);
        h.client.save_transcript(&transcript()).await.unwrap();
        let requests = h.transport.requests.lock().unwrap();
        assert_eq!(requests[0].0, "http://localhost:3001/api/chat/save");
        assert_eq!(requests[0].1.messages, transcript());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_backoff_sleeps_for_the_scheduled_delays() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(TransportResponse::new(503, "")),
            Ok(TransportResponse::new(503, "")),
            Ok(TransportResponse::new(200, "{}")),
        ]));
        let client = PersistenceClient::with_transport("http://localhost:3001", transport);

        let start = tokio::time::Instant::now();
        client.save_transcript(&transcript()).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed < Duration::from_millis(3100));
    }

    #[test]
    fn delays_double() {
        let client = harness(vec![]).client;
        assert_eq!(client.delay_for(1), Duration::from_millis(1000));
        assert_eq!(client.delay_for(2), Duration::from_millis(2000));
        assert_eq!(client.delay_for(3), Duration::from_millis(4000));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        assert_eq!(
            endpoint_for("https://example.com/"),
            "https://example.com/api/chat/save"
        );
        assert_eq!(
            endpoint_for("http://localhost:3001"),
            "http://localhost:3001/api/chat/save"
        );
    }

    #[test]
    fn at_least_one_attempt() {
        let client = harness(vec![]).client.with_max_attempts(0);
        assert_eq!(client.max_attempts, 1);
    }
}
