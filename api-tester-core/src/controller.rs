//! Invocation controller: turns an operation index plus call arguments into
//! one authenticated HTTP exchange and records the outcome in a per-operation
//! state store.
//!
//! The store is published through a `tokio::sync::watch` channel. Every
//! update swaps in a fresh `Arc` snapshot, so a reader holding a snapshot
//! never sees it change underneath it. Overlapping invocations of the same
//! index are neither deduplicated nor cancelled: each runs to completion and
//! whichever settles last owns the slot.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{ApiConfig, ConsoleConfig, TOKEN_ENV};
use crate::error::{ConsoleError, Result};
use crate::models::{HttpMethod, InvocationState, ParameterMap};
use crate::registry::{self, EndpointRegistry};
use crate::transport::{ApiRequest, ReqwestTransport, Transport, TransportError};

pub type StateSnapshot = Arc<Vec<InvocationState>>;

const CANCELLED_MESSAGE: &str = "invocation cancelled before completion";

struct Inner {
    registry: EndpointRegistry,
    transport: Arc<dyn Transport>,
    base_url: String,
    bearer_token: String,
    states: watch::Sender<StateSnapshot>,
}

impl Inner {
    fn publish(&self, index: usize, state: InvocationState) {
        self.states.send_modify(|snapshot| {
            let mut next = (**snapshot).clone();
            next[index] = state;
            *snapshot = Arc::new(next);
        });
    }
}

/// Owns the per-operation state and is the only writer to it. Cloning is
/// cheap and every clone drives the same store.
#[derive(Clone)]
pub struct InvocationController {
    inner: Arc<Inner>,
}

impl InvocationController {
    pub fn new(registry: EndpointRegistry, transport: Arc<dyn Transport>, api: &ApiConfig) -> Self {
        let initial: StateSnapshot = Arc::new(vec![InvocationState::idle(); registry.len()]);
        let (states, _) = watch::channel(initial);

        if api.bearer_token().is_empty() {
            warn!(
                "no API token configured (set {}); requests will carry an empty bearer credential",
                TOKEN_ENV
            );
        }

        Self {
            inner: Arc::new(Inner {
                registry,
                transport,
                base_url: api.base_url().to_string(),
                bearer_token: api.bearer_token().to_string(),
                states,
            }),
        }
    }

    /// Regulon catalog over the reqwest transport
    pub fn from_config(config: &ConsoleConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.api)
            .map_err(|e| ConsoleError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::new(
            EndpointRegistry::regulon(),
            Arc::new(transport),
            &config.api,
        ))
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.inner.registry
    }

    /// Current state of every operation, indexed by operation id
    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.states.borrow().clone()
    }

    pub fn state(&self, index: usize) -> Option<InvocationState> {
        self.inner.states.borrow().get(index).cloned()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.inner.states.subscribe()
    }

    /// Run one invocation of operation `index`.
    ///
    /// The slot goes Pending before the request is issued and always ends
    /// Succeeded or Failed, even when this future is dropped early. Transport
    /// failures are recorded in the slot, never returned; the only error is
    /// an index outside the registry, in which case no state is touched.
    pub async fn invoke(
        &self,
        index: usize,
        method: Option<HttpMethod>,
        body: Option<Value>,
        params: &ParameterMap,
    ) -> Result<()> {
        let inner = &self.inner;
        let descriptor = inner.registry.descriptor(index)?;
        let method = method.unwrap_or_default();

        let guard = PendingGuard::acquire(inner.clone(), index);

        let path = registry::resolve(&descriptor.path_template, params);
        info!(operation = index, %method, %path, "calling endpoint");

        let request = ApiRequest {
            method,
            url: format!("{}{}", inner.base_url, path),
            bearer_token: inner.bearer_token.clone(),
            body,
        };

        let outcome = match inner.transport.send(request).await {
            Ok(response) => {
                debug!(operation = index, status = response.status, "response received");
                InvocationState::succeeded(response.status, format_response_body(&response.body))
            }
            Err(e) => {
                error!(operation = index, error = %e, "endpoint call failed");
                InvocationState::failed(failure_message(&e))
            }
        };

        guard.settle(outcome);
        Ok(())
    }

    /// Run the canned invocation the catalog defines for `index`
    pub async fn invoke_sample(&self, index: usize) -> Result<()> {
        let sample = self.inner.registry.descriptor(index)?.sample.clone();
        self.invoke(index, Some(sample.method), sample.body, &sample.params)
            .await
    }

    /// Fire-and-forget variant of [`invoke`](Self::invoke) on its own task.
    /// The index is checked before spawning.
    pub fn spawn_invoke(
        &self,
        index: usize,
        method: Option<HttpMethod>,
        body: Option<Value>,
        params: ParameterMap,
    ) -> Result<JoinHandle<()>> {
        self.inner.registry.descriptor(index)?;
        let controller = self.clone();

        Ok(tokio::spawn(async move {
            if let Err(e) = controller.invoke(index, method, body, &params).await {
                warn!(operation = index, error = %e, "invocation rejected");
            }
        }))
    }

    pub fn spawn_sample(&self, index: usize) -> Result<JoinHandle<()>> {
        let sample = self.inner.registry.descriptor(index)?.sample.clone();
        self.spawn_invoke(index, Some(sample.method), sample.body, sample.params)
    }
}

/// Holds a slot in Pending for the lifetime of one invocation
struct PendingGuard {
    inner: Option<Arc<Inner>>,
    index: usize,
}

impl PendingGuard {
    fn acquire(inner: Arc<Inner>, index: usize) -> Self {
        // Read and replace under one lock so a concurrent settle cannot
        // slip between them.
        inner.states.send_modify(|snapshot| {
            let mut next = (**snapshot).clone();
            next[index] = InvocationState::pending(&snapshot[index]);
            *snapshot = Arc::new(next);
        });
        Self {
            inner: Some(inner),
            index,
        }
    }

    fn settle(mut self, outcome: InvocationState) {
        if let Some(inner) = self.inner.take() {
            inner.publish(self.index, outcome);
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            warn!(operation = self.index, "{}", CANCELLED_MESSAGE);
            inner.publish(self.index, InvocationState::failed(CANCELLED_MESSAGE));
        }
    }
}

/// Re-serialize a response body as indented JSON. Bodies that are not
/// JSON are carried as a JSON string.
pub fn format_response_body(raw: &str) -> String {
    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| raw.to_string())
}

/// Error text plus any underlying causes not already part of it
fn failure_message(error: &TransportError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    if message.trim().is_empty() {
        "transport error".to_string()
    } else {
        message
    }
}
