use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use leadflow::config::NotificationConfig;
use leadflow::notifications::{Channel, NotificationTransport, TransportError};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Transport used by the shipped binary. Without a provider key it
/// reports every attempt as unconfigured, which the pipeline records as
/// a failed intent while the lead itself is still captured. With a key
/// present it logs the would-be delivery; wiring a real email/WhatsApp
/// provider replaces this type only.
pub(crate) struct LoggingTransport {
    provider_key: Option<String>,
}

impl LoggingTransport {
    pub(crate) fn from_config(config: &NotificationConfig) -> Self {
        Self {
            provider_key: config.provider_key.clone(),
        }
    }
}

impl NotificationTransport for LoggingTransport {
    fn deliver(
        &self,
        channel: Channel,
        recipient: &str,
        payload: &str,
    ) -> Result<(), TransportError> {
        if self.provider_key.is_none() {
            return Err(TransportError::NotConfigured);
        }
        info!(channel = channel.label(), %recipient, %payload, "notification dispatched");
        Ok(())
    }
}
