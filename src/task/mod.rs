//! Task Subsystem
//!
//! Tasks are tool calls that outlive the request that started them: the
//! client gets back a task id immediately, polls or waits for status, and
//! the tool keeps running in the background, free to send its own
//! elicitation/sampling requests to the client meanwhile.
//!
//! Combines two patterns already used elsewhere in this crate: the
//! DashMap-backed store with TTL sweep from
//! `session::store::InMemorySessionStore`, and the pending-oneshot-map idea
//! from `transport::sampling::SamplingClient` for the client-bound requests
//! a task issues while it runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::engine::{Protocol, ProtocolError};
use crate::transport::Transport;
use crate::types::elicitation::{ElicitationRequest, ElicitationResponse};
use crate::types::error::ErrorData;
use crate::types::sampling::{SamplingRequest, SamplingResponse};

/// Status of a task, per the lifecycle a long-running tool call moves
/// through.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Still running.
    Working,
    /// Blocked on an elicitation request back to the client.
    InputRequired,
    /// Finished successfully; a result is available.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled before completion.
    Cancelled,
}

impl TaskStatus {
    /// True once no further status transition will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }
}

/// Metadata captured when a task is created.
#[derive(Debug, Clone)]
pub struct TaskMeta {
    /// The request id of the `tools/call` that spawned this task.
    pub created_from_request_id: String,
    /// Tool name.
    pub name: String,
    /// Original tool input.
    pub input: Value,
}

struct TaskState {
    meta: TaskMeta,
    created_at: Instant,
    created_at_ms: u64,
    last_seen: Instant,
    last_updated_ms: u64,
    status: TaskStatus,
    result: Option<Value>,
    error: Option<ErrorData>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Everything a wire-level `Task` representation needs, without exposing
/// `TaskStore`'s internal locking.
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    pub task_id: String,
    pub meta: TaskMeta,
    pub status: TaskStatus,
    pub created_at_ms: u64,
    pub last_updated_ms: u64,
}

/// A handle to a task's live state, shared between the store and whatever
/// background work is driving the task forward.
struct TaskEntry {
    state: Mutex<TaskState>,
    status_tx: watch::Sender<TaskStatus>,
    status_rx: watch::Receiver<TaskStatus>,
}

/// In-memory task store with TTL-based cleanup, mirroring
/// `InMemorySessionStore`'s shape.
pub struct TaskStore {
    tasks: DashMap<String, Arc<TaskEntry>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
        }
    }

    /// Create a new task in the `Working` state and return its id.
    pub fn create(&self, meta: TaskMeta) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Instant::now();
        let now_wall = now_ms();
        let (status_tx, status_rx) = watch::channel(TaskStatus::Working);

        let entry = Arc::new(TaskEntry {
            state: Mutex::new(TaskState {
                meta,
                created_at: now,
                created_at_ms: now_wall,
                last_seen: now,
                last_updated_ms: now_wall,
                status: TaskStatus::Working,
                result: None,
                error: None,
            }),
            status_tx,
            status_rx,
        });

        self.tasks.insert(id.clone(), entry);
        id
    }

    /// Current status of a task, or `None` if it doesn't exist (never
    /// created, or already swept).
    pub async fn status(&self, id: &str) -> Option<TaskStatus> {
        let entry = self.tasks.get(id)?.clone();
        let state = entry.state.lock().await;
        Some(state.status.clone())
    }

    /// Mark a task's status, optionally with a result or error attached.
    pub async fn set_status(
        &self,
        id: &str,
        status: TaskStatus,
        result: Option<Value>,
        error: Option<ErrorData>,
    ) {
        let Some(entry) = self.tasks.get(id).map(|e| e.clone()) else {
            return;
        };

        let mut state = entry.state.lock().await;
        state.status = status.clone();
        state.last_seen = Instant::now();
        state.last_updated_ms = now_ms();
        if result.is_some() {
            state.result = result;
        }
        if error.is_some() {
            state.error = error;
        }
        drop(state);

        // Registering via `watch::Receiver::changed()` before this send
        // fires is what gives `wait` race-freedom: a waiter that subscribed
        // before this point sees every transition, including ones that
        // complete between its subscribe call and its first `.await`.
        let _ = entry.status_tx.send(status);
    }

    /// Wait until the task reaches a terminal status, or the deadline
    /// passes. The returned receiver is obtained *before* the current
    /// status is read, so a task that completes between this call and the
    /// caller's next `.await` is never missed.
    pub async fn wait(&self, id: &str, timeout: Duration) -> Result<TaskStatus, TaskWaitError> {
        let entry = self.tasks.get(id).map(|e| e.clone()).ok_or(TaskWaitError::NotFound)?;
        let mut rx = entry.status_rx.clone();

        if rx.borrow().is_terminal() {
            return Ok(rx.borrow().clone());
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, rx.changed()).await {
                Ok(Ok(())) => {
                    let status = rx.borrow().clone();
                    if status.is_terminal() {
                        return Ok(status);
                    }
                }
                Ok(Err(_)) => return Err(TaskWaitError::Dropped),
                Err(_) => return Err(TaskWaitError::Timeout),
            }
        }
    }

    /// Fetch the stored result/error for a finished task.
    pub async fn result(&self, id: &str) -> Option<(Option<Value>, Option<ErrorData>)> {
        let entry = self.tasks.get(id)?.clone();
        let state = entry.state.lock().await;
        Some((state.result.clone(), state.error.clone()))
    }

    /// Describe a single task for `tasks/get`/`notifications/tasks/status`.
    pub async fn describe(&self, id: &str) -> Option<TaskDescriptor> {
        let entry = self.tasks.get(id)?.clone();
        let state = entry.state.lock().await;
        Some(TaskDescriptor {
            task_id: id.to_string(),
            meta: state.meta.clone(),
            status: state.status.clone(),
            created_at_ms: state.created_at_ms,
            last_updated_ms: state.last_updated_ms,
        })
    }

    /// Describe every task currently in the store, for `tasks/list`.
    pub async fn list(&self) -> Vec<TaskDescriptor> {
        let ids: Vec<String> = self.tasks.iter().map(|e| e.key().clone()).collect();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(descriptor) = self.describe(&id).await {
                out.push(descriptor);
            }
        }
        out
    }

    /// Remove tasks whose terminal status is older than `max_idle`, or
    /// whose non-terminal status has been idle that long (an orphaned task
    /// whose driver crashed without marking it failed).
    pub async fn cleanup(&self, max_idle: Duration) -> usize {
        let mut to_remove = Vec::new();

        for entry in self.tasks.iter() {
            let state = entry.value().state.lock().await;
            if state.last_seen.elapsed() > max_idle {
                to_remove.push(entry.key().clone());
            }
        }

        let removed = to_remove.len();
        for id in to_remove {
            self.tasks.remove(&id);
        }
        removed
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned by [`TaskStore::wait`].
#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum TaskWaitError {
    #[error("no such task")]
    NotFound,
    #[error("task wait timed out")]
    Timeout,
    #[error("task was dropped before reaching a terminal state")]
    Dropped,
}

/// Queue of client-bound requests (elicitation, sampling) a running task
/// issues while it works, generalizing `SamplingClient`'s single-purpose
/// pending map to any request a task needs to make through the engine.
pub struct TaskMessageQueue<T: Transport> {
    protocol: Arc<Protocol<T>>,
}

impl<T: Transport + 'static> TaskMessageQueue<T> {
    pub fn new(protocol: Arc<Protocol<T>>) -> Self {
        Self { protocol }
    }

    /// Ask the client a question and wait for its answer.
    pub async fn elicit(&self, request: ElicitationRequest) -> Result<ElicitationResponse, ProtocolError> {
        let params = serde_json::to_value(&request).map_err(|e| ProtocolError::Serde(e.to_string()))?;
        let result = self.protocol.request("elicitation/create", params).await?;
        serde_json::from_value(result).map_err(|e| ProtocolError::Serde(e.to_string()))
    }

    /// Ask the client's LLM for a completion.
    pub async fn create_message(&self, request: SamplingRequest) -> Result<SamplingResponse, ProtocolError> {
        let params = serde_json::to_value(&request).map_err(|e| ProtocolError::Serde(e.to_string()))?;
        let result = self.protocol.request("sampling/createMessage", params).await?;
        serde_json::from_value(result).map_err(|e| ProtocolError::Serde(e.to_string()))
    }
}

/// View of a single running task handed to the tool implementation, bundling
/// the store (for status transitions) with the message queue (for
/// client-bound requests while the task is in flight).
pub struct TaskSession<T: Transport> {
    pub id: String,
    store: Arc<TaskStore>,
    messages: TaskMessageQueue<T>,
}

impl<T: Transport + 'static> TaskSession<T> {
    pub fn new(id: String, store: Arc<TaskStore>, protocol: Arc<Protocol<T>>) -> Self {
        Self {
            id,
            store,
            messages: TaskMessageQueue::new(protocol),
        }
    }

    /// Ask the client a question, marking the task `InputRequired` for the
    /// duration of the round trip.
    pub async fn elicit(&self, request: ElicitationRequest) -> Result<ElicitationResponse, ProtocolError> {
        self.store
            .set_status(&self.id, TaskStatus::InputRequired, None, None)
            .await;
        let response = self.messages.elicit(request).await;
        self.store.set_status(&self.id, TaskStatus::Working, None, None).await;
        response
    }

    /// Ask the client's LLM for a completion without changing task status.
    pub async fn create_message(&self, request: SamplingRequest) -> Result<SamplingResponse, ProtocolError> {
        self.messages.create_message(request).await
    }
}

/// Delivers a task's terminal outcome once its driving future resolves.
/// Implemented as a thin wrapper over `TaskStore::set_status` so callers
/// don't need to construct the success/failure `Value`/`ErrorData` pair by
/// hand at every call site.
pub struct TaskResultHandler {
    store: Arc<TaskStore>,
}

impl TaskResultHandler {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    pub async fn complete(&self, id: &str, result: Value) {
        self.store
            .set_status(id, TaskStatus::Completed, Some(result), None)
            .await;
    }

    pub async fn fail(&self, id: &str, error: ErrorData) {
        self.store
            .set_status(id, TaskStatus::Failed, None, Some(error))
            .await;
    }

    pub async fn cancel(&self, id: &str) {
        self.store.set_status(id, TaskStatus::Cancelled, None, None).await;
    }
}

/// Re-exported for callers building task parameter maps without pulling in
/// `std::collections::HashMap` themselves.
pub type TaskArguments = HashMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> TaskMeta {
        TaskMeta {
            created_from_request_id: "1".into(),
            name: "long_running_tool".into(),
            input: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_create_task_starts_working() {
        let store = TaskStore::new();
        let id = store.create(meta());
        assert_eq!(store.status(&id).await, Some(TaskStatus::Working));
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_if_already_terminal() {
        let store = TaskStore::new();
        let id = store.create(meta());
        store
            .set_status(&id, TaskStatus::Completed, Some(serde_json::json!({"ok": true})), None)
            .await;

        let status = store.wait(&id, Duration::from_millis(50)).await.unwrap();
        assert_eq!(status, TaskStatus::Completed);

        let (result, error) = store.result(&id).await.unwrap();
        assert_eq!(result.unwrap()["ok"], true);
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn test_wait_observes_transition_registered_before_it_happens() {
        let store = Arc::new(TaskStore::new());
        let id = store.create(meta());

        let waiter_store = store.clone();
        let waiter_id = id.clone();
        let waiter = tokio::spawn(async move {
            waiter_store.wait(&waiter_id, Duration::from_secs(1)).await
        });

        // Give the waiter a chance to subscribe before we transition.
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.set_status(&id, TaskStatus::Completed, None, None).await;

        let status = waiter.await.unwrap().unwrap();
        assert_eq!(status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_wait_times_out_on_unresolved_task() {
        let store = TaskStore::new();
        let id = store.create(meta());

        let result = store.wait(&id, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(TaskWaitError::Timeout)));
    }

    #[tokio::test]
    async fn test_wait_unknown_task_not_found() {
        let store = TaskStore::new();
        let result = store.wait("missing", Duration::from_millis(10)).await;
        assert!(matches!(result, Err(TaskWaitError::NotFound)));
    }

    #[tokio::test]
    async fn test_cleanup_removes_idle_tasks() {
        let store = TaskStore::new();
        let _id = store.create(meta());

        let removed = store.cleanup(Duration::ZERO).await;
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_result_handler_completes_task() {
        let store = Arc::new(TaskStore::new());
        let id = store.create(meta());
        let handler = TaskResultHandler::new(store.clone());

        handler.complete(&id, serde_json::json!({"value": 42})).await;

        assert_eq!(store.status(&id).await, Some(TaskStatus::Completed));
        let (result, _) = store.result(&id).await.unwrap();
        assert_eq!(result.unwrap()["value"], 42);
    }
}
