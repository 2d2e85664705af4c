use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_dashboard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use registro_portal::catalog::RequirementsCatalog;
use registro_portal::client::PortalClient;
use registro_portal::config::AppConfig;
use registro_portal::dashboard::DashboardService;
use registro_portal::error::AppError;
use registro_portal::telemetry;
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

    let catalog = Arc::new(RequirementsCatalog::load(
        config.portal.catalog_path.as_deref(),
    )?);
    info!(
        version = %catalog.version,
        groups = catalog.groups.len(),
        "requirements catalog loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let client = Arc::new(PortalClient::new(
        config.portal.formulation_url.clone(),
        config.portal.request_timeout(),
    )?);
    let dashboard = Arc::new(DashboardService::new(
        client,
        catalog,
        config.portal.page_size,
    ));

    let preload = dashboard.clone();
    tokio::spawn(async move {
        preload.ensure_loaded().await;
        if let Some(error) = preload.load_error().await {
            warn!(%error, "initial record load failed; the dashboard will show an empty list");
        }
    });

    let app = with_dashboard_routes(dashboard)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        formulation_url = %config.portal.formulation_url,
        "registration portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
