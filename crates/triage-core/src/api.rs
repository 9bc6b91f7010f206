//! Client for the classification endpoint.
//!
//! At most one request is in flight per [`ApiManager`]: starting a new one
//! cancels the previous, which then settles with [`ApiError::Cancelled`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::ClassificationResult;
use crate::form::FormData;

const UNEXPECTED_RESPONSE: &str = "Resposta inesperada do servidor.";
const INCOMPLETE_RESPONSE: &str = "Dados incompletos na resposta.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with something other than JSON.
    #[error("Resposta inválida do servidor: {body}")]
    InvalidContentType { body: String },
    #[error("Erro HTTP: {status}")]
    Http { status: u16 },
    /// The JSON body carried an `error` field.
    #[error("{0}")]
    ServerReported(String),
    #[error("{0}")]
    MalformedResponse(&'static str),
    #[error("Requisição cancelada")]
    Cancelled,
    #[error("Failed to fetch: {0}")]
    Network(#[from] reqwest::Error),
}

/// Identifies one call to [`ApiManager::process_form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct InFlight {
    id: RequestId,
    cancel: CancellationToken,
}

type Slot = Arc<Mutex<Option<InFlight>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<InFlight>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the in-flight slot when a request settles or is dropped, unless a
/// newer request has taken it over.
struct SlotGuard {
    slot: Slot,
    id: RequestId,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(|f| f.id == self.id) {
            *slot = None;
        }
    }
}

/// A classification request that has been started but not awaited.
pub struct PendingRequest {
    id: RequestId,
    future: Pin<Box<dyn Future<Output = Result<ClassificationResult, ApiError>> + Send>>,
}

impl PendingRequest {
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Future for PendingRequest {
    type Output = Result<ClassificationResult, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest").field("id", &self.id).finish()
    }
}

pub struct ApiManager {
    client: reqwest::Client,
    endpoint: String,
    timeout: Option<Duration>,
    active: Slot,
    next_id: AtomicU64,
}

impl ApiManager {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout: None,
            active: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    /// Fail requests that take longer than `timeout` with a network error.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Start posting `form`, cancelling whatever request is still in flight.
    ///
    /// The previous request is cancelled right away, before the returned
    /// future is first polled.
    pub fn process_form(&self, form: FormData) -> PendingRequest {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let cancel = CancellationToken::new();

        let previous = lock(&self.active).replace(InFlight {
            id,
            cancel: cancel.clone(),
        });
        if let Some(previous) = previous {
            tracing::debug!(superseded = %previous.id, by = %id, "cancelling in-flight request");
            previous.cancel.cancel();
        }

        let guard = SlotGuard {
            slot: Arc::clone(&self.active),
            id,
        };
        let mut request = self
            .client
            .post(&self.endpoint)
            .multipart(form.into_multipart());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let future = async move {
            let _guard = guard;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ApiError::Cancelled),
                result = send(request) => result,
            }
        };

        PendingRequest {
            id,
            future: Box::pin(future),
        }
    }

    /// Cancel the in-flight request. Returns whether there was one.
    pub fn abort(&self) -> bool {
        match lock(&self.active).take() {
            Some(in_flight) => {
                tracing::debug!(request = %in_flight.id, "aborting in-flight request");
                in_flight.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        lock(&self.active).as_ref().map(|f| f.id)
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight().is_some()
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<ClassificationResult, ApiError> {
    let response = request.send().await?;

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    if !is_json {
        let body = response.text().await?;
        return Err(ApiError::InvalidContentType { body });
    }

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await?;
    let value: Value =
        serde_json::from_slice(&body).map_err(|_| ApiError::MalformedResponse(UNEXPECTED_RESPONSE))?;
    validate_payload(value)
}

/// Check a decoded response body and turn it into a result.
///
/// An `error` field wins over missing required fields.
pub fn validate_payload(value: Value) -> Result<ClassificationResult, ApiError> {
    let Value::Object(map) = value else {
        return Err(ApiError::MalformedResponse(UNEXPECTED_RESPONSE));
    };

    if let Some(message) = reported_error(&map) {
        return Err(ApiError::ServerReported(message));
    }
    if !map.contains_key("categoria") || !map.contains_key("resposta") {
        return Err(ApiError::MalformedResponse(INCOMPLETE_RESPONSE));
    }

    serde_json::from_value(Value::Object(map))
        .map_err(|_| ApiError::MalformedResponse(UNEXPECTED_RESPONSE))
}

/// The `error` field as a message, when it is set to anything truthy.
fn reported_error(map: &Map<String, Value>) -> Option<String> {
    match map.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
