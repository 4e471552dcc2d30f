use crate::cli::ServeArgs;
use crate::infra::{build_pipeline, AppState, BoardOverride, PipelineHandle};
use crate::routes::router;
use axum_prometheus::PrometheusMetricLayer;
use staffing_reports::config::{AppConfig, ConfigError};
use staffing_reports::error::AppError;
use staffing_reports::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    let pipeline = match build_pipeline(&config, BoardOverride::default(), false) {
        Ok(pipeline) => PipelineHandle::Ready(Arc::new(pipeline)),
        Err(AppError::Config(ConfigError::Missing(var))) => {
            warn!(missing = var, "board not configured; report runs are disabled");
            PipelineHandle::Unconfigured(var)
        }
        Err(err) => return Err(err),
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        pipeline,
    };

    let app = router(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "staffing report service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
