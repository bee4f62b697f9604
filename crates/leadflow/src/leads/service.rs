use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::audit::{AuditError, AuditEvent, AuditEventKind, AuditFilter, AuditLog};
use crate::auth::{self, Principal};
use crate::config::NotificationConfig;
use crate::notifications::{
    IntentQueue, IntentStatus, NotificationTransport, QueueError, TransportError,
};

use super::domain::{DerivedFields, LeadId, LeadPatch, LeadRecord, LeadSubmission};
use super::routing::RoutingTable;
use super::scoring::{self, ScoreInput};
use super::store::{LeadFilter, LeadStore, StoreError};

/// Service composing the store, intent queue, transport, and audit log.
///
/// Every business mutation commits through the store's serialization
/// point first; notification and audit side effects follow and their
/// failures are recorded, never allowed to revert the committed record.
pub struct LeadService<S, Q, T, L> {
    store: Arc<S>,
    queue: Arc<Q>,
    transport: Arc<T>,
    audit: Arc<L>,
    routing: RoutingTable,
    notifications: NotificationConfig,
}

impl<S, Q, T, L> LeadService<S, Q, T, L>
where
    S: LeadStore + 'static,
    Q: IntentQueue + 'static,
    T: NotificationTransport + 'static,
    L: AuditLog + 'static,
{
    pub fn new(
        store: Arc<S>,
        queue: Arc<Q>,
        transport: Arc<T>,
        audit: Arc<L>,
        routing: RoutingTable,
        notifications: NotificationConfig,
    ) -> Self {
        Self {
            store,
            queue,
            transport,
            audit,
            routing,
            notifications,
        }
    }

    /// Capture a new lead: score it, route it, persist it, then fan out
    /// one notification intent per configured channel with a single
    /// delivery attempt each.
    pub fn submit(&self, submission: LeadSubmission) -> Result<LeadRecord, LeadServiceError> {
        let now = Utc::now();

        let score = scoring::score(ScoreInput {
            brand: &submission.brand,
            quantity: submission.quantity,
            timeline: submission.timeline.as_deref(),
            source: submission.attribution.source.as_deref(),
            category: &submission.category,
            city: submission.city.as_deref(),
        });
        let priority = scoring::priority_from_score(score);
        let requirement = match submission.plan.as_deref() {
            Some(plan) => format!("{} {}", submission.category, plan),
            None => submission.category.clone(),
        };
        let assigned_to = self
            .routing
            .resolve(&requirement, submission.attribution.source.as_deref())
            .map(str::to_string);

        let record = self.store.create(
            submission,
            DerivedFields {
                score,
                priority,
                assigned_to,
            },
            now,
        )?;

        self.record_audit(
            AuditEventKind::LeadCreated,
            &record.id,
            "system",
            json!({
                "brand": record.brand,
                "category": record.category,
                "score": record.score,
                "priority": record.priority.label(),
                "assigned_to": record.assigned_to,
            }),
        );

        for (channel, recipient) in self.notifications.configured_channels() {
            self.notify(&record, channel, &recipient);
        }

        Ok(record)
    }

    fn notify(
        &self,
        record: &LeadRecord,
        channel: crate::notifications::Channel,
        recipient: &str,
    ) {
        let now = Utc::now();
        let payload = notification_payload(record);

        let intent_id = match self
            .queue
            .enqueue(&record.id, channel, recipient, &payload, now)
        {
            Ok(id) => id,
            Err(err) => {
                warn!(lead = %record.id, channel = channel.label(), error = %err,
                    "failed to enqueue notification intent");
                return;
            }
        };

        let outcome = self.transport.deliver(channel, recipient, &payload);
        let status = match &outcome {
            Ok(()) => IntentStatus::Sent,
            Err(err) => IntentStatus::Failed {
                reason: err.to_string(),
            },
        };
        let status_label = match &status {
            IntentStatus::Sent => "SENT",
            _ => "FAILED",
        };

        if let Err(err) = self.queue.update_status(&intent_id, status, Utc::now()) {
            warn!(lead = %record.id, intent = %intent_id.0, error = %err,
                "failed to record notification outcome");
        }

        self.record_audit(
            AuditEventKind::NotificationAttempted,
            &record.id,
            "system",
            json!({
                "intent": intent_id.0,
                "channel": channel.label(),
                "status": status_label,
                "reason": outcome.err().map(|err| err.to_string()),
            }),
        );
    }

    /// Apply an operator patch to a lead within the caller's scope.
    ///
    /// The scope check runs inside the store's serialization point, so a
    /// concurrent reassignment cannot slip a patch onto a lead the
    /// caller no longer owns. Scoped sessions cannot distinguish "not
    /// mine" from "does not exist"; both surface as `NotFound`.
    pub fn update(
        &self,
        principal: &Principal,
        id: &LeadId,
        patch: LeadPatch,
    ) -> Result<LeadRecord, LeadServiceError> {
        let note = patch.note.clone();
        let updated = self.store.patch_if(id, patch, &principal.name, Utc::now(), &|record| {
            auth::can_access_lead(principal, record)
        })?;

        self.record_audit(
            AuditEventKind::LeadUpdated,
            id,
            &principal.name,
            json!({
                "status": updated.status.label(),
                "priority": updated.priority.label(),
                "assigned_to": updated.assigned_to,
            }),
        );
        if let Some(body) = note {
            if !body.trim().is_empty() {
                self.record_audit(
                    AuditEventKind::NoteAdded,
                    id,
                    &principal.name,
                    json!({ "body": body }),
                );
            }
        }

        Ok(updated)
    }

    /// Fetch a lead within the caller's scope.
    pub fn get(&self, principal: &Principal, id: &LeadId) -> Result<LeadRecord, LeadServiceError> {
        let record = self.store.get(id)?.ok_or(LeadServiceError::NotFound)?;
        if !auth::can_access_lead(principal, &record) {
            return Err(LeadServiceError::NotFound);
        }
        Ok(record)
    }

    /// Scope-filtered listing with the aggregate metadata the console
    /// renders alongside it.
    pub fn list(
        &self,
        principal: &Principal,
        filter: &LeadFilter,
    ) -> Result<LeadListing, LeadServiceError> {
        let mut leads = self.store.list(filter)?;
        leads.retain(|lead| auth::can_access_lead(principal, lead));

        let mut brands: Vec<String> = Vec::new();
        let mut cities: Vec<String> = Vec::new();
        for lead in &leads {
            if !brands.iter().any(|b| b.eq_ignore_ascii_case(&lead.brand)) {
                brands.push(lead.brand.clone());
            }
            if let Some(city) = &lead.city {
                if !cities.iter().any(|c| c.eq_ignore_ascii_case(city)) {
                    cities.push(city.clone());
                }
            }
        }

        Ok(LeadListing {
            leads,
            meta: ListingMeta {
                brands,
                cities,
                agents: self
                    .routing
                    .agents()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                permissions: PermissionView {
                    can_export: principal.can_export,
                    can_assign: principal.can_assign,
                    scope: principal.assignee.clone(),
                },
            },
        })
    }

    /// Audit trail listing for the dashboard; management only.
    pub fn audit_trail(
        &self,
        principal: &Principal,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditEvent>, LeadServiceError> {
        if !principal.role.is_management() {
            return Err(LeadServiceError::Auth);
        }
        Ok(self.audit.list(filter)?)
    }

    fn record_audit(
        &self,
        kind: AuditEventKind,
        lead_id: &LeadId,
        actor: &str,
        detail: serde_json::Value,
    ) {
        let event = AuditEvent {
            kind,
            lead_id: lead_id.clone(),
            actor: actor.to_string(),
            at: Utc::now(),
            detail,
        };
        // Audit failures are logged and swallowed; they must never block
        // or roll back the business mutation they describe.
        if let Err(err) = self.audit.append(event) {
            warn!(lead = %lead_id, kind = kind.label(), error = %err, "audit append failed");
        }
    }
}

fn notification_payload(record: &LeadRecord) -> String {
    let mut summary = format!(
        "New lead {}: {} {} x{}",
        record.id, record.brand, record.category, record.quantity
    );
    if let Some(city) = &record.city {
        summary.push_str(&format!(" in {city}"));
    }
    summary.push_str(&format!(
        " [{} / score {}]",
        record.priority.label(),
        record.score
    ));
    summary
}

/// Listing payload: visible records plus console metadata.
#[derive(Debug, Clone, Serialize)]
pub struct LeadListing {
    pub leads: Vec<LeadRecord>,
    pub meta: ListingMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingMeta {
    pub brands: Vec<String>,
    pub cities: Vec<String>,
    pub agents: Vec<String>,
    pub permissions: PermissionView,
}

/// The caller's resolved capabilities, echoed back so the console can
/// hide affordances it would be denied anyway.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionView {
    pub can_export: bool,
    pub can_assign: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Error raised by the lead service. The variants keep user-correctable
/// input distinct from infrastructure degradation so boundaries can
/// respond accordingly.
#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("lead not found")]
    NotFound,
    #[error("no session")]
    Auth,
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("notification delivery failed: {0}")]
    Transport(String),
}

impl From<StoreError> for LeadServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(message) => LeadServiceError::Validation(message),
            StoreError::NotFound => LeadServiceError::NotFound,
            StoreError::Unavailable(message) => LeadServiceError::Storage(message),
        }
    }
}

impl From<QueueError> for LeadServiceError {
    fn from(value: QueueError) -> Self {
        LeadServiceError::Storage(value.to_string())
    }
}

impl From<AuditError> for LeadServiceError {
    fn from(value: AuditError) -> Self {
        LeadServiceError::Storage(value.to_string())
    }
}

impl From<TransportError> for LeadServiceError {
    fn from(value: TransportError) -> Self {
        LeadServiceError::Transport(value.to_string())
    }
}
