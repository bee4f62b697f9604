//! Append-only audit trail for lifecycle-relevant actions.
//!
//! Events are never mutated or deleted. The lead service swallows append
//! failures (logging them via `tracing`) so that auditing can never block
//! or roll back a business mutation.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::leads::domain::LeadId;

/// Closed vocabulary of auditable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    LeadCreated,
    LeadUpdated,
    NoteAdded,
    NotificationAttempted,
}

impl AuditEventKind {
    pub const fn label(self) -> &'static str {
        match self {
            AuditEventKind::LeadCreated => "lead_created",
            AuditEventKind::LeadUpdated => "lead_updated",
            AuditEventKind::NoteAdded => "note_added",
            AuditEventKind::NotificationAttempted => "notification_attempted",
        }
    }
}

/// Immutable audit record, ordered by insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub kind: AuditEventKind,
    pub lead_id: LeadId,
    pub actor: String,
    pub at: DateTime<Utc>,
    pub detail: serde_json::Value,
}

/// Filters for dashboard aggregation.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub kind: Option<AuditEventKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AuditFilter {
    fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(kind) = self.kind {
            if event.kind != kind {
                return false;
            }
        }
        if let Some(from) = self.from {
            if event.at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if event.at > to {
                return false;
            }
        }
        true
    }
}

/// Append-only event sink.
pub trait AuditLog: Send + Sync {
    fn append(&self, event: AuditEvent) -> Result<(), AuditError>;
    fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>, AuditError>;
}

/// Error enumeration for audit sink failures.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log unavailable: {0}")]
    Unavailable(String),
}

/// In-process log preserving insertion order.
#[derive(Default, Clone)]
pub struct InMemoryAuditLog {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl AuditLog for InMemoryAuditLog {
    fn append(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| AuditError::Unavailable("audit mutex poisoned".to_string()))?;
        guard.push(event);
        Ok(())
    }

    fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        let guard = self
            .events
            .lock()
            .map_err(|_| AuditError::Unavailable("audit mutex poisoned".to_string()))?;
        Ok(guard
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect())
    }
}
