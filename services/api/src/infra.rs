use jobboard::config::AppEnvironment;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Process-level state shared with the health and metrics endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) environment: AppEnvironment,
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}
