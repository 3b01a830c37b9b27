//! Write path: create, replace, update, delete
//!
//! A mutation runs the caller's callbacks, optionally produces a toast, and
//! when it settles invalidates the cached reads it affects. Invalidation
//! happens whatever the outcome, including a failing callback.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;

use super::client::QueryClient;
use crate::backend::{ApiError, WriteMethod};
use crate::notify::{Toast, ToastVariant};

pub type SuccessCallback = Box<dyn FnOnce(&Value) -> anyhow::Result<()> + Send>;
pub type ErrorCallback = Box<dyn FnOnce(&ApiError) + Send>;

#[derive(Debug, Clone)]
pub struct MutationOptions {
    /// Paths whose cached reads are invalidated once the mutation settles
    pub invalidate: Vec<String>,
    /// Surface a toast from the response; callers with their own success
    /// message turn this off
    pub show_toast: bool,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationOptions {
    pub fn new() -> Self {
        Self {
            invalidate: Vec::new(),
            show_toast: true,
        }
    }

    pub fn invalidate(mut self, path: impl Into<String>) -> Self {
        self.invalidate.push(path.into());
        self
    }

    pub fn quiet(mut self) -> Self {
        self.show_toast = false;
        self
    }
}

/// One write request
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub method: WriteMethod,
    pub path: String,
    pub body: Option<Value>,
}

impl MutationRequest {
    pub fn create(path: impl Into<String>, body: Value) -> Self {
        Self { method: WriteMethod::Post, path: path.into(), body: Some(body) }
    }

    pub fn replace(path: impl Into<String>, body: Value) -> Self {
        Self { method: WriteMethod::Put, path: path.into(), body: Some(body) }
    }

    pub fn update(path: impl Into<String>, body: Value) -> Self {
        Self { method: WriteMethod::Patch, path: path.into(), body: Some(body) }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: WriteMethod::Delete, path: path.into(), body: None }
    }
}

#[derive(Default)]
pub struct Callbacks {
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl Callbacks {
    pub fn on_success(mut self, f: impl FnOnce(&Value) -> anyhow::Result<()> + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&ApiError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub result: Result<Value, ApiError>,
    pub toast: Option<Toast>,
}

impl MutationOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Mutation handle; clones share the pending state
#[derive(Clone)]
pub struct Mutation {
    client: QueryClient,
    options: MutationOptions,
    pending: Arc<AtomicUsize>,
}

impl Mutation {
    pub fn new(client: QueryClient, options: MutationOptions) -> Self {
        Self {
            client,
            options,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    pub fn options(&self) -> &MutationOptions {
        &self.options
    }

    /// Start a write. Pending is raised immediately, before the returned
    /// future is first polled, so a view can disable its submit action in
    /// the same update that dispatched the request.
    pub fn mutate(
        &self,
        request: MutationRequest,
        callbacks: Callbacks,
    ) -> impl Future<Output = MutationOutcome> + Send + 'static {
        let pending = PendingGuard::enter(Arc::clone(&self.pending));
        let client = self.client.clone();
        let options = self.options.clone();

        async move {
            let _pending = pending;
            // Runs on every exit path, including a panicking callback
            let _settle = Settle {
                client: &client,
                paths: &options.invalidate,
            };
            run(&client, &options, request, callbacks).await
        }
    }
}

async fn run(
    client: &QueryClient,
    options: &MutationOptions,
    request: MutationRequest,
    callbacks: Callbacks,
) -> MutationOutcome {
    tracing::debug!("Mutation {} {}", request.method, request.path);
    let result = client
        .backend()
        .write(request.method, &request.path, request.body.as_ref())
        .await;

    let toast = match &result {
        Ok(body) => {
            if let Some(on_success) = callbacks.on_success {
                if let Err(e) = on_success(body) {
                    tracing::warn!("Success callback for {} failed: {:#}", request.path, e);
                }
            }
            options.show_toast.then(|| success_toast(body)).flatten()
        }
        Err(err) => {
            tracing::warn!("Mutation {} {} failed: {}", request.method, request.path, err);
            if let Some(on_error) = callbacks.on_error {
                on_error(err);
            }
            options.show_toast.then(|| Toast::error(err.user_message()))
        }
    };

    MutationOutcome { result, toast }
}

/// Toast for a successful response: its `message`, if any, shown as an
/// error when the body also says `success: false`
fn success_toast(body: &Value) -> Option<Toast> {
    let message = body.get("message").and_then(Value::as_str)?;
    let variant = match body.get("success").and_then(Value::as_bool) {
        Some(false) => ToastVariant::Error,
        _ => ToastVariant::Success,
    };
    Some(Toast::new(message, variant))
}

struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Settle<'a> {
    client: &'a QueryClient,
    paths: &'a [String],
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        self.client.invalidate(self.paths);
    }
}
