//! Cross-cutting HTTP layers: rate limiting, security headers, request logs, CORS.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderName, HeaderValue, Method, Request, Response};
use axum::middleware::Next;
use axum::response::IntoResponse;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use jobboard::config::RateLimitConfig;
use jobboard::error::ApiError;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Tracked client keys before stale entries are pruned.
const MAX_TRACKED_CLIENTS: usize = 10_000;

const AUTH_LIMITED_PATHS: [&str; 2] = ["/api/auth/login", "/api/auth/register"];

/// One keyed limiter for credential endpoints and one for the rest of `/api`.
#[derive(Clone)]
pub(crate) struct RateLimits {
    api: Arc<ClientLimiter>,
    auth: Arc<ClientLimiter>,
}

pub(crate) struct ClientLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    max_requests: u32,
}

impl ClientLimiter {
    /// Allows `max_requests` back to back, refilling evenly across `window`.
    fn new(window: Duration, max_requests: u32) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = window
            .checked_div(burst.get())
            .and_then(Quota::with_period)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);
        Self {
            limiter: RateLimiter::keyed(quota),
            max_requests: burst.get(),
        }
    }

    fn check(&self, client: IpAddr) -> Result<(), Duration> {
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }
        self.limiter
            .check_key(&client)
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }
}

impl RateLimits {
    pub(crate) fn new(config: &RateLimitConfig) -> Self {
        Self {
            api: Arc::new(ClientLimiter::new(config.window, config.max_requests)),
            auth: Arc::new(ClientLimiter::new(config.window, config.auth_max_requests)),
        }
    }

    fn for_path(&self, path: &str) -> Option<&ClientLimiter> {
        if AUTH_LIMITED_PATHS.contains(&path) {
            Some(&self.auth)
        } else if path.starts_with("/api/") {
            Some(&self.api)
        } else {
            None
        }
    }
}

/// Rejects clients over their budget with 429 and a `Retry-After` hint.
pub(crate) async fn rate_limit(
    State(limits): State<RateLimits>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let Some(limiter) = limits.for_path(request.uri().path()) else {
        return next.run(request).await;
    };

    let client = client_ip(&request);
    let limit_header = HeaderValue::from(limiter.max_requests);
    if let Err(retry_after) = limiter.check(client) {
        warn!(client = %client, path = request.uri().path(), "rate limit exceeded");
        let mut response = ApiError::RateLimited { retry_after }.into_response();
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-ratelimit-limit"), limit_header);
        return response;
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(HeaderName::from_static("x-ratelimit-limit"), limit_header);
    response
}

/// Proxy headers first, then the socket peer. Unknown clients share one bucket.
fn client_ip(request: &Request<Body>) -> IpAddr {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok());
    let real_ip = || {
        request
            .headers()
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    };
    let peer = || {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip())
    };
    forwarded
        .or_else(real_ip)
        .or_else(peer)
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

const SECURITY_HEADERS: [(&str, &str); 6] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("cross-origin-resource-policy", "same-origin"),
    ("x-permitted-cross-domain-policies", "none"),
];

pub(crate) async fn security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    response
}

pub(crate) async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    if !matches!(uri.path(), "/health" | "/ready") {
        info!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = start.elapsed().as_millis() as u64,
            "request completed"
        );
    }
    response
}

/// `*` allows any origin without credentials; explicit origins may send cookies.
pub(crate) fn cors_layer(origins: &[String]) -> CorsLayer {
    use axum::http::header;

    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
            .max_age(Duration::from_secs(600));
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .allow_origin(origins)
        .max_age(Duration::from_secs(600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    fn limits(max_requests: u32, auth_max_requests: u32) -> RateLimits {
        RateLimits::new(&RateLimitConfig {
            window: Duration::from_secs(900),
            max_requests,
            auth_max_requests,
        })
    }

    fn app(limits: RateLimits) -> Router {
        Router::new()
            .route("/api/auth/login", post(|| async { "ok" }))
            .route("/api/jobs", get(|| async { "ok" }))
            .route("/health", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(limits, rate_limit))
            .layer(axum::middleware::from_fn(security_headers))
    }

    async fn send(app: &Router, method: Method, uri: &str, client: &str) -> Response<Body> {
        app.clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("x-forwarded-for", client)
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes")
    }

    #[tokio::test]
    async fn auth_routes_use_the_tighter_budget() {
        let app = app(limits(100, 2));
        for _ in 0..2 {
            let response = send(&app, Method::POST, "/api/auth/login", "10.0.0.1").await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let limited = send(&app, Method::POST, "/api/auth/login", "10.0.0.1").await;
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(limited.headers().contains_key("retry-after"));
        assert_eq!(
            limited.headers().get("x-ratelimit-limit"),
            Some(&HeaderValue::from_static("2"))
        );

        let other_route = send(&app, Method::GET, "/api/jobs", "10.0.0.1").await;
        assert_eq!(other_route.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn budgets_are_per_client() {
        let app = app(limits(1, 1));
        assert_eq!(
            send(&app, Method::GET, "/api/jobs", "10.0.0.1").await.status(),
            StatusCode::OK
        );
        assert_eq!(
            send(&app, Method::GET, "/api/jobs", "10.0.0.1").await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            send(&app, Method::GET, "/api/jobs", "10.0.0.2").await.status(),
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn health_checks_are_never_limited() {
        let app = app(limits(1, 1));
        for _ in 0..3 {
            let response = send(&app, Method::GET, "/health", "10.0.0.1").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers().get("x-frame-options"),
                Some(&HeaderValue::from_static("DENY"))
            );
        }
    }
}
