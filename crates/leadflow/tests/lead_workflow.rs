//! Integration specifications for the lead capture and console workflow.
//!
//! Scenarios exercise the public service facade and HTTP router end to
//! end: capture with notification fan-out, honeypot handling, scoped
//! console access, concurrent mutation, and degraded-storage behavior.

mod common {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, Utc};
    use serde_json::Value;

    use leadflow::audit::InMemoryAuditLog;
    use leadflow::auth::{sign_session, Role};
    use leadflow::config::NotificationConfig;
    use leadflow::leads::{
        lead_router, DerivedFields, InMemoryLeadStore, LeadApi, LeadFilter, LeadPatch, LeadRecord,
        LeadService, LeadStore, LeadSubmission, RoutingTable, StoreError,
    };
    use leadflow::leads::LeadId;
    use leadflow::notifications::{
        Channel, InMemoryIntentQueue, NotificationTransport, TransportError,
    };

    pub(super) const SECRET: &str = "workflow-secret";

    pub(super) struct OkTransport;

    impl NotificationTransport for OkTransport {
        fn deliver(
            &self,
            _channel: Channel,
            _recipient: &str,
            _payload: &str,
        ) -> Result<(), TransportError> {
            Ok(())
        }
    }

    /// Store stub for degraded-mode scenarios.
    pub(super) struct UnavailableStore;

    impl LeadStore for UnavailableStore {
        fn create(
            &self,
            _submission: LeadSubmission,
            _derived: DerivedFields,
            _now: DateTime<Utc>,
        ) -> Result<LeadRecord, StoreError> {
            Err(StoreError::Unavailable("database offline".to_string()))
        }

        fn get(&self, _id: &LeadId) -> Result<Option<LeadRecord>, StoreError> {
            Err(StoreError::Unavailable("database offline".to_string()))
        }

        fn patch_if(
            &self,
            _id: &LeadId,
            _patch: LeadPatch,
            _actor: &str,
            _now: DateTime<Utc>,
            _guard: &(dyn Fn(&LeadRecord) -> bool + Sync),
        ) -> Result<LeadRecord, StoreError> {
            Err(StoreError::Unavailable("database offline".to_string()))
        }

        fn list(&self, _filter: &LeadFilter) -> Result<Vec<LeadRecord>, StoreError> {
            Err(StoreError::Unavailable("database offline".to_string()))
        }
    }

    pub(super) fn notifications() -> NotificationConfig {
        NotificationConfig {
            email_to: Some("sales@example.in".to_string()),
            whatsapp_to: None,
            provider_key: Some("key".to_string()),
        }
    }

    pub(super) struct Harness {
        pub router: axum::Router,
        pub store: Arc<InMemoryLeadStore>,
        pub queue: Arc<InMemoryIntentQueue>,
    }

    pub(super) fn build_harness() -> Harness {
        let store = Arc::new(InMemoryLeadStore::default());
        let queue = Arc::new(InMemoryIntentQueue::default());
        let service = Arc::new(LeadService::new(
            store.clone(),
            queue.clone(),
            Arc::new(OkTransport),
            Arc::new(InMemoryAuditLog::default()),
            RoutingTable::standard(),
            notifications(),
        ));
        let router = lead_router(Arc::new(LeadApi {
            service,
            session_secret: SECRET.to_string(),
        }));
        Harness {
            router,
            store,
            queue,
        }
    }

    pub(super) fn degraded_router() -> axum::Router {
        let service = Arc::new(LeadService::new(
            Arc::new(UnavailableStore),
            Arc::new(InMemoryIntentQueue::default()),
            Arc::new(OkTransport),
            Arc::new(InMemoryAuditLog::default()),
            RoutingTable::standard(),
            notifications(),
        ));
        lead_router(Arc::new(LeadApi {
            service,
            session_secret: SECRET.to_string(),
        }))
    }

    pub(super) fn token(name: &str, role: Role, assignee: Option<&str>) -> String {
        sign_session(SECRET, name, role, assignee, Utc::now() + Duration::hours(1))
            .expect("token signs")
    }

    pub(super) fn expired_token() -> String {
        sign_session(
            SECRET,
            "Meera Nair",
            Role::Manager,
            None,
            Utc::now() - Duration::hours(1),
        )
        .expect("token signs")
    }

    pub(super) fn submission_body() -> Value {
        serde_json::json!({
            "brand": "Microsoft",
            "category": "Microsoft 365",
            "qty": 50,
            "timeline": "Today",
            "city": "Chandigarh",
            "source": "referral",
            "name": "Asha Rao",
            "email": "a@b.com"
        })
    }

    pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }
}

mod capture {
    use super::common::*;
    use axum::http::{header, Request, StatusCode};
    use leadflow::leads::{LeadFilter, LeadStore};
    use leadflow::notifications::IntentQueue;
    use tower::ServiceExt;

    #[tokio::test]
    async fn submit_captures_scores_and_queues_notifications() {
        let harness = build_harness();

        let response = harness
            .router
            .clone()
            .oneshot(
                Request::post("/api/v1/leads")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::from(submission_body().to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["ok"], true);
        let lead_id = body["leadId"].as_str().expect("lead id present");
        assert!(lead_id.starts_with("LD-"));

        let stored = harness
            .store
            .get(&leadflow::leads::LeadId(lead_id.to_string()))
            .expect("lookup succeeds")
            .expect("record persisted");
        assert_eq!(stored.status.label(), "NEW");
        assert!(matches!(
            stored.priority,
            leadflow::leads::Priority::Hot | leadflow::leads::Priority::Warm
        ));

        // Exactly one intent per configured channel (email only here).
        let intents = harness.queue.for_lead(&stored.id).expect("queue readable");
        assert_eq!(intents.len(), 1);
    }

    #[tokio::test]
    async fn honeypot_submissions_are_acknowledged_without_side_effects() {
        let harness = build_harness();
        let mut body = submission_body();
        body["website"] = serde_json::json!("http://spam.example");

        let response = harness
            .router
            .clone()
            .oneshot(
                axum::http::Request::post("/api/v1/leads")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["ok"], true);
        assert!(payload.get("leadId").is_none());

        let listed = harness
            .store
            .list(&LeadFilter::default())
            .expect("list succeeds");
        assert!(listed.is_empty(), "honeypot must leave no trace");
    }

    #[tokio::test]
    async fn missing_contact_is_rejected_with_first_failing_field() {
        let harness = build_harness();
        let mut body = submission_body();
        body.as_object_mut().expect("object").remove("email");

        let response = harness
            .router
            .clone()
            .oneshot(
                axum::http::Request::post("/api/v1/leads")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = read_json_body(response).await;
        assert_eq!(payload["ok"], false);
        assert!(payload["message"]
            .as_str()
            .expect("message present")
            .contains("email or phone"));
    }

    #[tokio::test]
    async fn missing_brand_is_rejected() {
        let harness = build_harness();
        let mut body = submission_body();
        body["brand"] = serde_json::json!("");

        let response = harness
            .router
            .clone()
            .oneshot(
                axum::http::Request::post("/api/v1/leads")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = read_json_body(response).await;
        assert_eq!(payload["message"], "brand is required");
    }

    #[tokio::test]
    async fn capture_acknowledges_receipt_when_storage_is_down() {
        let router = degraded_router();

        let response = router
            .oneshot(
                axum::http::Request::post("/api/v1/leads")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::from(submission_body().to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["ok"], true);
        assert!(payload.get("leadId").is_none());
    }
}

mod console {
    use super::common::*;
    use axum::http::{header, Request, StatusCode};
    use leadflow::auth::Role;
    use tower::ServiceExt;

    async fn capture_lead(harness: &Harness) -> String {
        let response = harness
            .router
            .clone()
            .oneshot(
                Request::post("/api/v1/leads")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::from(submission_body().to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let body = read_json_body(response).await;
        body["leadId"].as_str().expect("lead id").to_string()
    }

    #[tokio::test]
    async fn listing_requires_a_valid_session() {
        let harness = build_harness();

        let unauthenticated = harness
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/leads")
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

        let expired = harness
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/leads")
                    .header(header::AUTHORIZATION, format!("Bearer {}", expired_token()))
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn management_sees_all_and_scoped_agents_see_their_own() {
        let harness = build_harness();
        capture_lead(&harness).await;

        let manager_view = harness
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/leads")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token("Meera Nair", Role::Manager, None)),
                    )
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(manager_view.status(), StatusCode::OK);
        let manager_body = read_json_body(manager_view).await;
        assert_eq!(manager_body["leads"].as_array().expect("array").len(), 1);
        assert_eq!(manager_body["meta"]["permissions"]["can_export"], true);

        // The captured lead routes to Priya Sharma; another agent must
        // not see it.
        let outsider_view = harness
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/leads")
                    .header(
                        header::AUTHORIZATION,
                        format!(
                            "Bearer {}",
                            token("Rohit Verma", Role::Agent, Some("Rohit Verma"))
                        ),
                    )
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let outsider_body = read_json_body(outsider_view).await;
        assert!(outsider_body["leads"].as_array().expect("array").is_empty());

        let owner_view = harness
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/leads")
                    .header(
                        header::AUTHORIZATION,
                        format!(
                            "Bearer {}",
                            token("Priya Sharma", Role::Agent, Some("Priya Sharma"))
                        ),
                    )
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let owner_body = read_json_body(owner_view).await;
        assert_eq!(owner_body["leads"].as_array().expect("array").len(), 1);
    }

    #[tokio::test]
    async fn listing_rejects_unknown_status_filters() {
        let harness = build_harness();
        capture_lead(&harness).await;

        let rejected = harness
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/leads?status=MISPLACED")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token("Meera Nair", Role::Manager, None)),
                    )
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = read_json_body(rejected).await;
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .contains("MISPLACED"));

        // Legacy vocabulary is still a valid filter value.
        let legacy = harness
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/leads?status=CONTACTED")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token("Meera Nair", Role::Manager, None)),
                    )
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(legacy.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn patch_updates_status_with_legacy_vocabulary_normalized() {
        let harness = build_harness();
        let lead_id = capture_lead(&harness).await;

        let response = harness
            .router
            .clone()
            .oneshot(
                Request::patch(format!("/api/v1/leads/{lead_id}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token("Meera Nair", Role::Manager, None)),
                    )
                    .body(axum::body::Body::from(
                        serde_json::json!({
                            "status": "CONTACTED",
                            "note": "spoke with Asha"
                        })
                        .to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["status"], "IN_PROGRESS", "legacy label normalized");
        assert_eq!(body["first_contact_by"], "Meera Nair");
        assert_eq!(body["activity"][0]["body"], "spoke with Asha");
    }

    #[tokio::test]
    async fn mark_contacted_flag_advances_new_leads() {
        let harness = build_harness();
        let lead_id = capture_lead(&harness).await;

        let response = harness
            .router
            .clone()
            .oneshot(
                Request::patch(format!("/api/v1/leads/{lead_id}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token("Meera Nair", Role::Manager, None)),
                    )
                    .body(axum::body::Body::from(
                        serde_json::json!({ "markContacted": true }).to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        let body = read_json_body(response).await;
        assert_eq!(body["status"], "IN_PROGRESS");
        assert!(!body["last_contacted_at"].is_null());
    }

    #[tokio::test]
    async fn scoped_agent_cannot_patch_foreign_leads() {
        let harness = build_harness();
        let lead_id = capture_lead(&harness).await;

        let response = harness
            .router
            .clone()
            .oneshot(
                Request::patch(format!("/api/v1/leads/{lead_id}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(
                        header::AUTHORIZATION,
                        format!(
                            "Bearer {}",
                            token("Rohit Verma", Role::Agent, Some("Rohit Verma"))
                        ),
                    )
                    .body(axum::body::Body::from(
                        serde_json::json!({ "priority": "COLD" }).to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_degrades_to_empty_with_warning_when_storage_is_down() {
        let router = degraded_router();

        let response = router
            .oneshot(
                Request::get("/api/v1/leads")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token("Meera Nair", Role::Manager, None)),
                    )
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["storage_warning"], true);
        assert!(body["leads"].as_array().expect("array").is_empty());
    }

    #[tokio::test]
    async fn audit_listing_is_management_only() {
        let harness = build_harness();
        capture_lead(&harness).await;

        let denied = harness
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/audit")
                    .header(
                        header::AUTHORIZATION,
                        format!(
                            "Bearer {}",
                            token("Priya Sharma", Role::Agent, Some("Priya Sharma"))
                        ),
                    )
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = harness
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/audit?kind=lead_created")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token("Meera Nair", Role::Manager, None)),
                    )
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(allowed.status(), StatusCode::OK);
        let body = read_json_body(allowed).await;
        assert_eq!(body["events"].as_array().expect("array").len(), 1);
    }
}
