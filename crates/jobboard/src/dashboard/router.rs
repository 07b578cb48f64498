use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;

use super::insights::{
    ActivityEntry, JobAnalytics, TopJobs, UserAnalytics, DEFAULT_ACTIVITY_LIMIT,
    DEFAULT_TOP_JOBS, MAX_FEED_LIMIT,
};
use super::service::{
    ApplicationAnalytics, DashboardOverview, DashboardService, DEFAULT_ANALYTICS_DAYS,
    MAX_ANALYTICS_DAYS,
};
use crate::api::auth::Authenticator;
use crate::api::{AuthPrincipal, Envelope, QueryParams, RouteState};
use crate::applications::repository::ApplicationRepository;
use crate::error::{ApiError, ApiResult};
use crate::identity::repository::PrincipalRepository;
use crate::jobs::repository::JobRepository;

type DashboardState<P, J, A> = RouteState<DashboardService<P, J, A>>;

pub fn dashboard_router<P, J, A>(
    service: Arc<DashboardService<P, J, A>>,
    auth: Authenticator,
) -> Router
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
{
    Router::new()
        .route("/api/dashboard/stats", get(stats_handler::<P, J, A>))
        .route(
            "/api/dashboard/applications/analytics",
            get(application_analytics_handler::<P, J, A>),
        )
        .route(
            "/api/dashboard/jobs/analytics",
            get(job_analytics_handler::<P, J, A>),
        )
        .route("/api/dashboard/jobs/top", get(top_jobs_handler::<P, J, A>))
        .route(
            "/api/dashboard/users/analytics",
            get(user_analytics_handler::<P, J, A>),
        )
        .route("/api/dashboard/activity", get(activity_handler::<P, J, A>))
        .with_state(RouteState::new(service, auth))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnalyticsParams {
    #[serde(alias = "period")]
    days: Option<u32>,
}

impl AnalyticsParams {
    fn days(&self) -> Result<u32, ApiError> {
        let days = self.days.unwrap_or(DEFAULT_ANALYTICS_DAYS);
        if !(1..=MAX_ANALYTICS_DAYS).contains(&days) {
            return Err(ApiError::validation(format!(
                "Days must be between 1 and {MAX_ANALYTICS_DAYS}"
            )));
        }
        Ok(days)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FeedParams {
    limit: Option<usize>,
}

impl FeedParams {
    fn limit(&self, default: usize) -> Result<usize, ApiError> {
        let limit = self.limit.unwrap_or(default);
        if !(1..=MAX_FEED_LIMIT).contains(&limit) {
            return Err(ApiError::validation(format!(
                "Limit must be between 1 and {MAX_FEED_LIMIT}"
            )));
        }
        Ok(limit)
    }
}

pub(crate) async fn stats_handler<P, J, A>(
    State(state): State<DashboardState<P, J, A>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Envelope<DashboardOverview>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let overview = state.service.overview(&principal)?;
    Ok(Json(Envelope::new(overview)))
}

pub(crate) async fn application_analytics_handler<P, J, A>(
    State(state): State<DashboardState<P, J, A>>,
    AuthPrincipal(_principal): AuthPrincipal,
    QueryParams(params): QueryParams<AnalyticsParams>,
) -> ApiResult<Json<Envelope<ApplicationAnalytics>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let analytics = state.service.application_analytics(params.days()?)?;
    Ok(Json(Envelope::new(analytics)))
}

pub(crate) async fn job_analytics_handler<P, J, A>(
    State(state): State<DashboardState<P, J, A>>,
    AuthPrincipal(_principal): AuthPrincipal,
    QueryParams(params): QueryParams<AnalyticsParams>,
) -> ApiResult<Json<Envelope<JobAnalytics>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let analytics = state.service.job_analytics(params.days()?)?;
    Ok(Json(Envelope::new(analytics)))
}

pub(crate) async fn top_jobs_handler<P, J, A>(
    State(state): State<DashboardState<P, J, A>>,
    AuthPrincipal(_principal): AuthPrincipal,
    QueryParams(params): QueryParams<FeedParams>,
) -> ApiResult<Json<Envelope<TopJobs>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let top = state.service.top_jobs(params.limit(DEFAULT_TOP_JOBS)?)?;
    Ok(Json(Envelope::new(top)))
}

pub(crate) async fn user_analytics_handler<P, J, A>(
    State(state): State<DashboardState<P, J, A>>,
    AuthPrincipal(principal): AuthPrincipal,
    QueryParams(params): QueryParams<AnalyticsParams>,
) -> ApiResult<Json<Envelope<UserAnalytics>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let analytics = state.service.user_analytics(&principal, params.days()?)?;
    Ok(Json(Envelope::new(analytics)))
}

pub(crate) async fn activity_handler<P, J, A>(
    State(state): State<DashboardState<P, J, A>>,
    AuthPrincipal(principal): AuthPrincipal,
    QueryParams(params): QueryParams<FeedParams>,
) -> ApiResult<Json<Envelope<Vec<ActivityEntry>>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let feed = state
        .service
        .activity(&principal, params.limit(DEFAULT_ACTIVITY_LIMIT)?)?;
    Ok(Json(Envelope::new(feed)))
}
