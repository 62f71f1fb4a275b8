//! Cancellable fetch scopes.
//!
//! Every asynchronous continuation carries the [`ScopeToken`] it was issued
//! under. A [`FetchSlot`] holds at most one live token; beginning a new fetch
//! cancels the previous token first, so only the last issued request can be
//! accepted back into view state.

use crate::api::{ApiRequest, ApiResponse, RabbitApi};
use crate::errors::FetchError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct ScopeState {
    id: u64,
    live: AtomicBool,
    cancelled: Notify,
}

#[derive(Debug, Clone)]
pub struct ScopeToken {
    state: Arc<ScopeState>,
}

impl ScopeToken {
    pub fn new() -> Self {
        Self {
            state: Arc::new(ScopeState {
                id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
                live: AtomicBool::new(true),
                cancelled: Notify::new(),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.state.id
    }

    pub fn is_live(&self) -> bool {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Marks the scope dead and wakes anything waiting on [`ScopeToken::cancelled`].
    pub fn cancel(&self) {
        if self.state.live.swap(false, Ordering::SeqCst) {
            self.state.cancelled.notify_waiters();
        }
    }

    pub async fn cancelled(&self) {
        loop {
            // Registered before the check so a concurrent cancel cannot be missed.
            let notified = self.state.cancelled.notified();
            if !self.is_live() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ScopeToken {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ScopeToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for ScopeToken {}

/// At most one outstanding request per logical scope.
#[derive(Debug, Default)]
pub struct FetchSlot {
    current: Option<ScopeToken>,
}

impl FetchSlot {
    /// Cancels whatever is outstanding and opens a fresh scope.
    pub fn begin(&mut self) -> ScopeToken {
        self.cancel();
        let token = ScopeToken::new();
        self.current = Some(token.clone());
        token
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    pub fn accepts(&self, token: &ScopeToken) -> bool {
        token.is_live() && self.current.as_ref() == Some(token)
    }

    /// Closes the slot if `token` is the outstanding scope. Returns whether it was.
    pub fn settle(&mut self, token: &ScopeToken) -> bool {
        if !self.accepts(token) {
            return false;
        }
        self.current = None;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    Request(ApiRequest),
    Delay(Duration),
}

/// Work a view hands to the scheduler, tagged with its originating scope.
#[derive(Debug, Clone)]
pub struct Task {
    pub token: ScopeToken,
    pub kind: TaskKind,
}

impl Task {
    pub fn request(token: ScopeToken, request: ApiRequest) -> Self {
        Self {
            token,
            kind: TaskKind::Request(request),
        }
    }

    pub fn delay(token: ScopeToken, delay: Duration) -> Self {
        Self {
            token,
            kind: TaskKind::Delay(delay),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    Response(Result<ApiResponse, FetchError>),
    Elapsed,
}

/// Runs a task until it finishes or its scope is cancelled.
///
/// Cancellation drops the in-flight request future, which aborts the transport.
/// `None` means the result must be discarded; that includes a result that
/// arrived after the scope died.
pub async fn perform<A: RabbitApi + ?Sized>(api: &A, task: &Task) -> Option<TaskOutput> {
    let work = async {
        match &task.kind {
            TaskKind::Request(request) => TaskOutput::Response(request.send(api).await),
            TaskKind::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                TaskOutput::Elapsed
            }
        }
    };

    let output = tokio::select! {
        biased;
        _ = task.token.cancelled() => None,
        output = work => Some(output),
    };

    if output.is_none() || !task.token.is_live() {
        debug!(scope = task.token.id(), "discarding output of cancelled scope");
        return None;
    }
    output
}
