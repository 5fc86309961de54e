//! Task Wire Types
//!
//! Request params and results for the `tasks/*` methods and the
//! `notifications/tasks/status` push, per MCP 2025-06-18's task
//! augmentation (spec.md §3/§4.5).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::task::{TaskDescriptor, TaskMeta, TaskStatus};

/// A task as seen over the wire: `tasks/create`, `tasks/get`,
/// `tasks/list`, and `notifications/tasks/status` all carry this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub status: TaskStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,

    pub created_at: u64,
    pub last_updated_at: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<TaskWireMeta>,
}

impl From<TaskDescriptor> for Task {
    fn from(d: TaskDescriptor) -> Self {
        Self {
            task_id: d.task_id,
            status: d.status,
            status_message: None,
            ttl: None,
            poll_interval: None,
            created_at: d.created_at_ms,
            last_updated_at: d.last_updated_ms,
            meta: Some(d.meta.into()),
        }
    }
}

/// Wire form of [`crate::task::TaskMeta`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWireMeta {
    pub created_from_request_id: String,
    pub name: String,
    pub input: Value,
}

impl From<TaskMeta> for TaskWireMeta {
    fn from(m: TaskMeta) -> Self {
        Self {
            created_from_request_id: m.created_from_request_id,
            name: m.name,
            input: m.input,
        }
    }
}

/// Params for `tasks/create`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskParams {
    pub name: String,

    #[serde(default)]
    pub input: Value,
}

/// Params shared by `tasks/get`, `tasks/result`, and `tasks/cancel`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdParams {
    pub task_id: String,
}

/// Result of `tasks/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksResult {
    pub tasks: Vec<Task>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl ListTasksResult {
    pub fn all(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            next_cursor: None,
        }
    }
}

/// `meta.relatedTask` attached to a `CallToolResult` produced asynchronously
/// by the task subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedTask {
    pub task_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskMeta;

    #[test]
    fn test_descriptor_converts_to_wire_task() {
        let descriptor = TaskDescriptor {
            task_id: "t1".into(),
            meta: TaskMeta {
                created_from_request_id: "5".into(),
                name: "survey".into(),
                input: serde_json::json!({}),
            },
            status: TaskStatus::Working,
            created_at_ms: 1000,
            last_updated_ms: 1500,
        };

        let task: Task = descriptor.into();
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["taskId"], "t1");
        assert_eq!(json["status"], "working");
        assert_eq!(json["meta"]["name"], "survey");
    }
}
