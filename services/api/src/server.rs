use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryDirectory, InMemoryKpiRepository};
use crate::routes::with_kpi_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use prabhav_kpi::config::AppConfig;
use prabhav_kpi::error::AppError;
use prabhav_kpi::kpi::KpiSubmissionService;
use prabhav_kpi::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let repository = Arc::new(InMemoryKpiRepository::default());
    let directory = Arc::new(InMemoryDirectory::from_config(&config.directory));
    if directory.is_open() {
        warn!("no APP_KNOWN_USERS or APP_KNOWN_PROJECTS configured; accepting any identifier");
    }
    let kpi_service = Arc::new(KpiSubmissionService::new(
        repository,
        directory,
        config.kpi.clone(),
    ));

    let app = with_kpi_routes(kpi_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        required_parameters = ?config.kpi.required_parameter_count,
        "kpi scoring service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
