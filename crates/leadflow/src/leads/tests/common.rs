use std::sync::Arc;

use crate::audit::InMemoryAuditLog;
use crate::auth::{Principal, Role};
use crate::config::NotificationConfig;
use crate::leads::domain::LeadSubmission;
use crate::leads::routing::RoutingTable;
use crate::leads::service::LeadService;
use crate::leads::store::InMemoryLeadStore;
use crate::notifications::{
    Channel, InMemoryIntentQueue, NotificationTransport, TransportError,
};

pub(super) type TestService =
    LeadService<InMemoryLeadStore, InMemoryIntentQueue, StubTransport, InMemoryAuditLog>;

/// Transport stub: configured delivers successfully, unconfigured mimics
/// missing provider credentials.
pub(super) struct StubTransport {
    pub configured: bool,
}

impl NotificationTransport for StubTransport {
    fn deliver(
        &self,
        _channel: Channel,
        _recipient: &str,
        _payload: &str,
    ) -> Result<(), TransportError> {
        if self.configured {
            Ok(())
        } else {
            Err(TransportError::NotConfigured)
        }
    }
}

pub(super) fn notification_config() -> NotificationConfig {
    NotificationConfig {
        email_to: Some("sales@example.in".to_string()),
        whatsapp_to: None,
        provider_key: Some("key".to_string()),
    }
}

pub(super) struct TestHarness {
    pub service: TestService,
    pub store: Arc<InMemoryLeadStore>,
    pub queue: Arc<InMemoryIntentQueue>,
    pub audit: Arc<InMemoryAuditLog>,
}

pub(super) fn build_service(transport_configured: bool) -> TestHarness {
    build_service_with_config(transport_configured, notification_config())
}

pub(super) fn build_service_with_config(
    transport_configured: bool,
    notifications: NotificationConfig,
) -> TestHarness {
    let store = Arc::new(InMemoryLeadStore::default());
    let queue = Arc::new(InMemoryIntentQueue::default());
    let audit = Arc::new(InMemoryAuditLog::default());
    let service = LeadService::new(
        store.clone(),
        queue.clone(),
        Arc::new(StubTransport {
            configured: transport_configured,
        }),
        audit.clone(),
        RoutingTable::standard(),
        notifications,
    );
    TestHarness {
        service,
        store,
        queue,
        audit,
    }
}

pub(super) fn submission() -> LeadSubmission {
    serde_json::from_value(serde_json::json!({
        "brand": "Microsoft",
        "category": "Microsoft 365",
        "plan": "Business Standard",
        "quantity": 50,
        "city": "Chandigarh",
        "timeline": "Today",
        "attribution": { "source": "referral", "campaign": "diwali-2026" },
        "contact": { "name": "Asha Rao", "company": "Rao & Co", "email": "a@b.com" }
    }))
    .expect("valid submission fixture")
}

pub(super) fn phone_only_submission() -> LeadSubmission {
    serde_json::from_value(serde_json::json!({
        "brand": "Seqrite",
        "category": "Endpoint Security",
        "quantity": 12,
        "contact": { "phone": "+911234567890" }
    }))
    .expect("valid submission fixture")
}

pub(super) fn contactless_submission() -> LeadSubmission {
    serde_json::from_value(serde_json::json!({
        "brand": "Microsoft",
        "category": "Microsoft 365",
        "contact": { "name": "No Contact" }
    }))
    .expect("valid submission fixture")
}

pub(super) fn manager() -> Principal {
    Principal {
        name: "Meera Nair".to_string(),
        role: Role::Manager,
        assignee: None,
        can_export: true,
        can_assign: true,
    }
}

pub(super) fn agent(assignee: &str) -> Principal {
    Principal {
        name: assignee.to_string(),
        role: Role::Agent,
        assignee: Some(assignee.to_string()),
        can_export: false,
        can_assign: false,
    }
}
