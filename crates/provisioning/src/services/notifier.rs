//! Outbound notifications.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ProvisioningError, Result};

/// A message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Trait for delivering notifications.
///
/// `Ok(false)` is a soft failure: the provider was reached but refused the
/// message. `Err` is reserved for transport faults.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<bool>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn send(&self, notification: &Notification) -> Result<bool> {
        (**self).send(notification).await
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<Notification>,
    reject: bool,
    transport_failure: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new notifier that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent sends return `Ok(false)`.
    pub async fn set_reject(&self, reject: bool) {
        self.state.write().await.reject = reject;
    }

    /// Makes subsequent sends fail with a transport error.
    pub async fn set_transport_failure(&self, fail: bool) {
        self.state.write().await.transport_failure = fail;
    }

    /// Returns the number of accepted notifications.
    pub async fn sent_count(&self) -> usize {
        self.state.read().await.sent.len()
    }

    /// Returns the accepted notifications, in send order.
    pub async fn sent(&self) -> Vec<Notification> {
        self.state.read().await.sent.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, notification: &Notification) -> Result<bool> {
        let mut state = self.state.write().await;

        if state.transport_failure {
            return Err(ProvisioningError::NotificationTransport(
                "connection refused".to_string(),
            ));
        }
        if state.reject {
            return Ok(false);
        }

        state.sent.push(notification.clone());
        Ok(true)
    }
}

/// Notifier used when no mail transport is configured.
///
/// Nothing is delivered, so every send reports the message as not accepted
/// and callers that require delivery fail. The message body is never
/// logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<bool> {
        tracing::warn!(
            to = %notification.to,
            subject = %notification.subject,
            "Notification not delivered: no mail transport configured"
        );
        Ok(false)
    }
}
