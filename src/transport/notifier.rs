//! Resource Notifier
//!
//! Sends resource update notifications to subscribed sessions.

use std::sync::Arc;

use axum::response::sse::Event;
use crate::session::SessionStore;
use crate::types::jsonrpc::JsonRpcMessage;
use crate::types::subscription::ResourceUpdatedNotification;

/// Notifier for sending resource updates to subscribers.
#[derive(Clone)]
pub struct ResourceNotifier {
    sessions: Arc<dyn SessionStore>,
}

impl ResourceNotifier {
    /// Create a new resource notifier.
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// Notify every subscribed session that a resource was updated.
    pub async fn notify_updated(&self, uri: &str) {
        for session_id in self.subscribed_session_ids(uri) {
            self.notify_session(&session_id, uri).await;
        }
    }

    /// Broadcast `notifications/resources/list_changed` to every initialized
    /// session; the tool/resource/prompt list is server-wide, not per-URI.
    pub async fn notify_list_changed(&self) {
        let notification = JsonRpcMessage::notification("notifications/resources/list_changed", serde_json::json!({}));
        let Ok(json) = serde_json::to_string(&notification) else {
            return;
        };

        let mut senders = Vec::new();
        self.sessions.for_each_initialized(&mut |session_id, tx| {
            senders.push((session_id.to_string(), tx.clone()));
        });

        for (session_id, tx) in senders {
            let event = Event::default().data(json.clone());
            if let Err(e) = tx.send(Ok(event)).await {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to send list_changed notification");
            }
        }
    }

    fn subscribed_session_ids(&self, uri: &str) -> Vec<String> {
        let mut ids = Vec::new();
        self.sessions.for_each_initialized(&mut |session_id, _tx| {
            if let Some(session) = self.sessions.get(session_id) {
                if session.is_subscribed(uri) {
                    ids.push(session_id.to_string());
                }
            }
        });
        ids
    }

    /// Send notification to a specific session if subscribed.
    pub async fn notify_session(&self, session_id: &str, uri: &str) {
        if let Some(session) = self.sessions.get(session_id) {
            if !session.is_subscribed(uri) {
                return;
            }

            let notification_data = ResourceUpdatedNotification {
                uri: uri.to_string(),
            };

            let notification = JsonRpcMessage::notification(
                "notifications/resources/updated",
                serde_json::to_value(&notification_data).unwrap_or_default(),
            );

            if let Ok(json) = serde_json::to_string(&notification) {
                let event = Event::default().data(json);
                if let Err(e) = session.send_event(event).await {
                    tracing::warn!(
                        session_id = %session_id,
                        uri = %uri,
                        error = %e,
                        "Failed to send resource update notification"
                    );
                }
            }
        }
    }
}
