//! Notification intent bookkeeping.
//!
//! The queue records what the system *meant* to send (one intent per
//! lead per configured channel) and tracks the delivery outcome, so a
//! lead's communication history can be reconstructed without trusting
//! transport logs. Delivery itself is an external collaborator behind
//! [`NotificationTransport`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::leads::domain::LeadId;

/// Identifier wrapper for notification intents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentId(pub String);

impl IntentId {
    fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        IntentId(format!("NI-{}", suffix[..10].to_uppercase()))
    }
}

/// Outbound channels the pipeline knows how to queue for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Whatsapp,
}

impl Channel {
    pub const fn label(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Whatsapp => "whatsapp",
        }
    }
}

/// Delivery status. `Sent` and `Failed` are terminal; once an intent
/// reaches either, further updates are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    Queued,
    Sent,
    Failed { reason: String },
}

impl IntentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, IntentStatus::Queued)
    }
}

/// One attempt to deliver one message on one channel for one lead.
/// Intents are never deleted, only status-updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub id: IntentId,
    pub lead_id: LeadId,
    pub channel: Channel,
    pub recipient: String,
    pub payload: String,
    pub status: IntentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Durable bookkeeping for outbound messages, decoupled from transport.
pub trait IntentQueue: Send + Sync {
    /// Record a new `QUEUED` intent. Does not attempt delivery.
    fn enqueue(
        &self,
        lead_id: &LeadId,
        channel: Channel,
        recipient: &str,
        payload: &str,
        now: DateTime<Utc>,
    ) -> Result<IntentId, QueueError>;

    /// Transition `QUEUED -> SENT` or `QUEUED -> FAILED`. Updates to an
    /// already-terminal intent are rejected with [`QueueError::Terminal`].
    fn update_status(
        &self,
        id: &IntentId,
        status: IntentStatus,
        now: DateTime<Utc>,
    ) -> Result<NotificationIntent, QueueError>;

    /// All intents for a lead, in enqueue order.
    fn for_lead(&self, lead_id: &LeadId) -> Result<Vec<NotificationIntent>, QueueError>;
}

/// Error enumeration for queue failures.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("intent not found")]
    NotFound,
    #[error("intent already terminal")]
    Terminal,
    #[error("an intent can only move to SENT or FAILED")]
    InvalidTarget,
    #[error("intent queue unavailable: {0}")]
    Unavailable(String),
}

/// External delivery collaborator. One attempt per intent per request;
/// retries are driven by an explicit replay, never in-process.
pub trait NotificationTransport: Send + Sync {
    fn deliver(&self, channel: Channel, recipient: &str, payload: &str)
        -> Result<(), TransportError>;
}

/// Delivery failure. A missing provider configuration is a normal,
/// handleable condition: it becomes a `FAILED` intent, never a refusal
/// to capture the lead.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport not configured")]
    NotConfigured,
    #[error("delivery failed: {0}")]
    Send(String),
}

/// In-process queue preserving insertion order.
#[derive(Default, Clone)]
pub struct InMemoryIntentQueue {
    intents: Arc<Mutex<Vec<NotificationIntent>>>,
}

impl InMemoryIntentQueue {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<NotificationIntent>>, QueueError> {
        self.intents
            .lock()
            .map_err(|_| QueueError::Unavailable("intent queue mutex poisoned".to_string()))
    }

    /// Snapshot of every intent, for console diagnostics and tests.
    pub fn all(&self) -> Result<Vec<NotificationIntent>, QueueError> {
        Ok(self.lock()?.clone())
    }
}

impl IntentQueue for InMemoryIntentQueue {
    fn enqueue(
        &self,
        lead_id: &LeadId,
        channel: Channel,
        recipient: &str,
        payload: &str,
        now: DateTime<Utc>,
    ) -> Result<IntentId, QueueError> {
        let mut guard = self.lock()?;
        let id = IntentId::generate();
        guard.push(NotificationIntent {
            id: id.clone(),
            lead_id: lead_id.clone(),
            channel,
            recipient: recipient.to_string(),
            payload: payload.to_string(),
            status: IntentStatus::Queued,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    fn update_status(
        &self,
        id: &IntentId,
        status: IntentStatus,
        now: DateTime<Utc>,
    ) -> Result<NotificationIntent, QueueError> {
        if !status.is_terminal() {
            return Err(QueueError::InvalidTarget);
        }
        let mut guard = self.lock()?;
        let intent = guard
            .iter_mut()
            .find(|intent| &intent.id == id)
            .ok_or(QueueError::NotFound)?;
        if intent.status.is_terminal() {
            return Err(QueueError::Terminal);
        }
        intent.status = status;
        intent.updated_at = now;
        Ok(intent.clone())
    }

    fn for_lead(&self, lead_id: &LeadId) -> Result<Vec<NotificationIntent>, QueueError> {
        let guard = self.lock()?;
        Ok(guard
            .iter()
            .filter(|intent| &intent.lead_id == lead_id)
            .cloned()
            .collect())
    }
}
