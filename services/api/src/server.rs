use crate::cli::ServeArgs;
use crate::infra::{build_core, default_accounts, AppState, InMemoryCleanerConfigStore};
use crate::routes::with_core_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use stay_ops::config::AppConfig;
use stay_ops::error::AppError;
use stay_ops::telemetry;
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

    let cleaner_configs = Arc::new(InMemoryCleanerConfigStore::default());
    let accounts = Arc::new(default_accounts());
    let core = build_core(cleaner_configs, accounts);

    let app = with_core_routes(core)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "stay operations service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
