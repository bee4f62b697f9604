use crate::cli::ServeArgs;
use crate::infra::{AppState, LoggingTransport};
use crate::routes::with_lead_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use leadflow::audit::InMemoryAuditLog;
use leadflow::config::AppConfig;
use leadflow::error::AppError;
use leadflow::leads::{InMemoryLeadStore, LeadApi, LeadService, RoutingTable};
use leadflow::notifications::InMemoryIntentQueue;
use leadflow::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryLeadStore::default());
    let queue = Arc::new(InMemoryIntentQueue::default());
    let transport = Arc::new(LoggingTransport::from_config(&config.notifications));
    let audit = Arc::new(InMemoryAuditLog::default());
    let service = Arc::new(LeadService::new(
        store,
        queue,
        transport,
        audit,
        RoutingTable::standard(),
        config.notifications.clone(),
    ));
    let api = Arc::new(LeadApi {
        service,
        session_secret: config.session.secret.clone(),
    });

    let app = with_lead_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead pipeline service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
