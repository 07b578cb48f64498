use crate::cli::ServeArgs;
use crate::demo;
use crate::infra::AppState;
use crate::middleware::{cors_layer, rate_limit, request_logging, security_headers, RateLimits};
use crate::routes::health_routes;
use axum::{middleware, Extension};
use axum_prometheus::PrometheusMetricLayer;
use jobboard::config::AppConfig;
use jobboard::error::AppError;
use jobboard::identity::TokenIssuer;
use jobboard::store::MemoryStore;
use jobboard::telemetry;
use jobboard::JobBoard;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        environment: config.environment,
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(MemoryStore::new());
    let board = JobBoard::new(
        store,
        TokenIssuer::from_config(&config.auth),
        config.auth.secure_cookies,
    );
    if args.seed {
        demo::seed(&board)?;
    }

    let app = board
        .router()
        .merge(health_routes())
        .layer(Extension(app_state))
        .layer(middleware::from_fn_with_state(
            RateLimits::new(&config.rate_limit),
            rate_limit,
        ))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&config.server.cors_origins))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(environment = config.environment.label(), %addr, "job board api ready");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
