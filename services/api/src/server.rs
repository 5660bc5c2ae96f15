use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAckRepository, InMemoryFileStore, OpenAccess};
use crate::routes::with_ack_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mod_ack::activity::AckModule;
use mod_ack::config::AppConfig;
use mod_ack::error::AppError;
use mod_ack::telemetry;
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let module = Arc::new(AckModule::new(
        Arc::new(InMemoryAckRepository::default()),
        Arc::new(InMemoryFileStore::default()),
        config.module.clone(),
    ));

    let app = with_ack_routes(module, Arc::new(OpenAccess))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        maxbytes = config.module.course_maxbytes,
        "acknowledgement activity service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
