use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::{AuditEventKind, AuditFilter, AuditLog};
use crate::auth::{verify_session, Principal};
use crate::notifications::{IntentQueue, NotificationTransport};

use super::domain::{
    Attribution, ContactInfo, LeadId, LeadPatch, LeadStatus, LeadSubmission,
};
use super::service::{LeadService, LeadServiceError};
use super::store::{LeadFilter, LeadStore};

/// Shared state for the lead API: the composed service plus the session
/// signing secret used to resolve operator principals.
pub struct LeadApi<S, Q, T, L> {
    pub service: Arc<LeadService<S, Q, T, L>>,
    pub session_secret: String,
}

/// Router builder exposing the lead capture and console endpoints.
pub fn lead_router<S, Q, T, L>(api: Arc<LeadApi<S, Q, T, L>>) -> Router
where
    S: LeadStore + 'static,
    Q: IntentQueue + 'static,
    T: NotificationTransport + 'static,
    L: AuditLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/leads",
            post(submit_handler::<S, Q, T, L>).get(list_handler::<S, Q, T, L>),
        )
        .route(
            "/api/v1/leads/:lead_id",
            get(detail_handler::<S, Q, T, L>).patch(update_handler::<S, Q, T, L>),
        )
        .route("/api/v1/audit", get(audit_handler::<S, Q, T, L>))
        .with_state(api)
}

/// Inbound submission body. The `website` field is a honeypot: humans
/// never see it, so a non-empty value is acknowledged and dropped.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubmitLeadRequest {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default, alias = "qty")]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, alias = "utm_campaign")]
    pub campaign: Option<String>,
    #[serde(default, alias = "utm_medium")]
    pub medium: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default, alias = "page_path")]
    pub page: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl SubmitLeadRequest {
    fn honeypot_tripped(&self) -> bool {
        self.website
            .as_deref()
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false)
    }

    fn first_invalid_field(&self) -> Option<&'static str> {
        if self.brand.trim().is_empty() {
            return Some("brand is required");
        }
        if self.category.trim().is_empty() {
            return Some("category is required");
        }
        None
    }

    fn into_submission(self) -> LeadSubmission {
        LeadSubmission {
            brand: self.brand,
            category: self.category,
            plan: self.plan,
            quantity: self.quantity.unwrap_or(1),
            city: self.city,
            timeline: self.timeline,
            notes: self.notes,
            attribution: Attribution {
                source: self.source,
                campaign: self.campaign,
                medium: self.medium,
                referrer: self.referrer,
                page_path: self.page,
            },
            contact: ContactInfo {
                name: self.name,
                company: self.company,
                email: self.email,
                phone: self.phone,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct SubmitLeadResponse {
    ok: bool,
    #[serde(rename = "leadId", skip_serializing_if = "Option::is_none")]
    lead_id: Option<String>,
    message: String,
}

const ACK_MESSAGE: &str = "Thanks! Our team will reach out shortly.";
const DEGRADED_MESSAGE: &str = "Request received; processing is delayed, we will follow up.";

pub(crate) async fn submit_handler<S, Q, T, L>(
    State(api): State<Arc<LeadApi<S, Q, T, L>>>,
    axum::Json(request): axum::Json<SubmitLeadRequest>,
) -> Response
where
    S: LeadStore + 'static,
    Q: IntentQueue + 'static,
    T: NotificationTransport + 'static,
    L: AuditLog + 'static,
{
    if request.honeypot_tripped() {
        // Bots are told everything went fine; nothing is recorded.
        let body = SubmitLeadResponse {
            ok: true,
            lead_id: None,
            message: ACK_MESSAGE.to_string(),
        };
        return (StatusCode::OK, axum::Json(body)).into_response();
    }

    if let Some(message) = request.first_invalid_field() {
        let body = SubmitLeadResponse {
            ok: false,
            lead_id: None,
            message: message.to_string(),
        };
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response();
    }

    match api.service.submit(request.into_submission()) {
        Ok(record) => {
            let body = SubmitLeadResponse {
                ok: true,
                lead_id: Some(record.id.0),
                message: ACK_MESSAGE.to_string(),
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(LeadServiceError::Validation(message)) => {
            let body = SubmitLeadResponse {
                ok: false,
                lead_id: None,
                message,
            };
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response()
        }
        Err(LeadServiceError::Storage(reason)) => {
            // Capture must acknowledge receipt even when the backing
            // store is unreachable.
            tracing::warn!(error = %reason, "lead capture degraded: storage unavailable");
            let body = SubmitLeadResponse {
                ok: true,
                lead_id: None,
                message: DEGRADED_MESSAGE.to_string(),
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

/// Console listing filters, all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLeadsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl ListLeadsQuery {
    fn into_filter(self) -> Result<LeadFilter, String> {
        let status = match self.status.as_deref() {
            None => None,
            Some(raw) => Some(
                LeadStatus::parse(raw).ok_or_else(|| format!("unknown status '{raw}'"))?,
            ),
        };
        Ok(LeadFilter {
            brand: self.brand,
            status,
            city: self.city,
            source: self.source,
            campaign: self.campaign,
            assignee: self.assignee,
            query: self.q,
            created_from: parse_day_start(self.from.as_deref())?,
            created_to: parse_day_end(self.to.as_deref())?,
        })
    }
}

pub(crate) async fn list_handler<S, Q, T, L>(
    State(api): State<Arc<LeadApi<S, Q, T, L>>>,
    headers: HeaderMap,
    Query(query): Query<ListLeadsQuery>,
) -> Response
where
    S: LeadStore + 'static,
    Q: IntentQueue + 'static,
    T: NotificationTransport + 'static,
    L: AuditLog + 'static,
{
    let Some(principal) = resolve_principal(&api, &headers) else {
        return no_session_response();
    };

    let filter = match query.into_filter() {
        Ok(filter) => filter,
        Err(message) => {
            let payload = json!({ "error": message });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    match api.service.list(&principal, &filter) {
        Ok(listing) => {
            let payload = json!({
                "leads": listing.leads,
                "meta": listing.meta,
                "storage_warning": false,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(LeadServiceError::Storage(reason)) => {
            // The console renders an empty dashboard with a warning
            // banner instead of a broken page.
            tracing::warn!(error = %reason, "lead listing degraded: storage unavailable");
            let payload = json!({
                "leads": [],
                "meta": serde_json::Value::Null,
                "storage_warning": true,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn detail_handler<S, Q, T, L>(
    State(api): State<Arc<LeadApi<S, Q, T, L>>>,
    headers: HeaderMap,
    Path(lead_id): Path<String>,
) -> Response
where
    S: LeadStore + 'static,
    Q: IntentQueue + 'static,
    T: NotificationTransport + 'static,
    L: AuditLog + 'static,
{
    let Some(principal) = resolve_principal(&api, &headers) else {
        return no_session_response();
    };

    match api.service.get(&principal, &LeadId(lead_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S, Q, T, L>(
    State(api): State<Arc<LeadApi<S, Q, T, L>>>,
    headers: HeaderMap,
    Path(lead_id): Path<String>,
    axum::Json(patch): axum::Json<LeadPatch>,
) -> Response
where
    S: LeadStore + 'static,
    Q: IntentQueue + 'static,
    T: NotificationTransport + 'static,
    L: AuditLog + 'static,
{
    let Some(principal) = resolve_principal(&api, &headers) else {
        return no_session_response();
    };

    match api.service.update(&principal, &LeadId(lead_id), patch) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

pub(crate) async fn audit_handler<S, Q, T, L>(
    State(api): State<Arc<LeadApi<S, Q, T, L>>>,
    headers: HeaderMap,
    Query(query): Query<AuditQuery>,
) -> Response
where
    S: LeadStore + 'static,
    Q: IntentQueue + 'static,
    T: NotificationTransport + 'static,
    L: AuditLog + 'static,
{
    let Some(principal) = resolve_principal(&api, &headers) else {
        return no_session_response();
    };

    let kind = match query.kind.as_deref() {
        None => None,
        Some(raw) => match parse_audit_kind(raw) {
            Some(kind) => Some(kind),
            None => {
                let payload = json!({ "error": format!("unknown audit event type '{raw}'") });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        },
    };

    let filter = match (
        parse_day_start(query.from.as_deref()),
        parse_day_end(query.to.as_deref()),
    ) {
        (Ok(from), Ok(to)) => AuditFilter { kind, from, to },
        (Err(message), _) | (_, Err(message)) => {
            let payload = json!({ "error": message });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    match api.service.audit_trail(&principal, &filter) {
        Ok(events) => (StatusCode::OK, axum::Json(json!({ "events": events }))).into_response(),
        Err(err) => error_response(err),
    }
}

fn parse_audit_kind(raw: &str) -> Option<AuditEventKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "lead_created" => Some(AuditEventKind::LeadCreated),
        "lead_updated" => Some(AuditEventKind::LeadUpdated),
        "note_added" => Some(AuditEventKind::NoteAdded),
        "notification_attempted" => Some(AuditEventKind::NotificationAttempted),
        _ => None,
    }
}

fn parse_day_start(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    parse_day(raw, false)
}

fn parse_day_end(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    parse_day(raw, true)
}

fn parse_day(raw: Option<&str>, end_of_day: bool) -> Result<Option<DateTime<Utc>>, String> {
    let Some(raw) = raw else { return Ok(None) };
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("failed to parse '{raw}' as YYYY-MM-DD"))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    // Both H:M:S values above are in range, so this cannot be None.
    Ok(time.map(|naive| naive.and_utc()))
}

fn resolve_principal<S, Q, T, L>(
    api: &LeadApi<S, Q, T, L>,
    headers: &HeaderMap,
) -> Option<Principal> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw);
    verify_session(&api.session_secret, token, Utc::now())
}

fn no_session_response() -> Response {
    let payload = json!({ "error": "no session" });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

fn error_response(err: LeadServiceError) -> Response {
    let status = match &err {
        LeadServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LeadServiceError::NotFound => StatusCode::NOT_FOUND,
        LeadServiceError::Auth => StatusCode::UNAUTHORIZED,
        LeadServiceError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        LeadServiceError::Transport(_) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
