use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{ApplicationId, ApplicationStatus, ApplicationView, ApplyRequest, StatusUpdate};
use super::repository::ApplicationRepository;
use super::service::ApplicationService;
use crate::api::auth::Authenticator;
use crate::api::{page_request, AuthPrincipal, Envelope, QueryParams, RouteState, ValidatedJson};
use crate::error::{ApiError, ApiResult};
use crate::identity::domain::Role;
use crate::jobs::domain::JobId;
use crate::jobs::repository::JobRepository;
use crate::policy;

type ApplicationState<A, J> = RouteState<ApplicationService<A, J>>;

/// Apply, review, withdraw, and list applications under `/api/applications`.
pub fn application_router<A, J>(
    service: Arc<ApplicationService<A, J>>,
    auth: Authenticator,
) -> Router
where
    A: ApplicationRepository + 'static,
    J: JobRepository + 'static,
{
    Router::new()
        .route("/api/applications/apply", post(apply_handler::<A, J>))
        .route(
            "/api/applications/employee",
            get(employee_applications_handler::<A, J>),
        )
        .route(
            "/api/applications/employer",
            get(employer_applications_handler::<A, J>),
        )
        .route(
            "/api/applications/:application_id",
            get(view_handler::<A, J>),
        )
        .route(
            "/api/applications/:application_id/status",
            put(status_handler::<A, J>),
        )
        .route(
            "/api/applications/:application_id/withdraw",
            put(withdraw_handler::<A, J>),
        )
        .with_state(RouteState::new(service, auth))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListParams {
    status: Option<String>,
    job_id: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl ListParams {
    fn status(&self) -> Result<Option<ApplicationStatus>, ApiError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => ApplicationStatus::parse(raw).map(Some).ok_or_else(|| {
                ApiError::validation(format!(
                    "Status must be one of: {}",
                    ApplicationStatus::allowed_labels()
                ))
            }),
        }
    }

    fn job_id(&self) -> Option<JobId> {
        self.job_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| JobId(id.to_string()))
    }
}

pub(crate) async fn apply_handler<A, J>(
    State(state): State<ApplicationState<A, J>>,
    AuthPrincipal(principal): AuthPrincipal,
    body: Result<ValidatedJson<ApplyRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<Envelope<ApplicationView>>)>
where
    A: ApplicationRepository + 'static,
    J: JobRepository + 'static,
{
    policy::require_role(&principal, &[Role::Employee])?;
    let ValidatedJson(request) = body?;
    let application = state.service.apply(&principal, request)?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(application).with_message("Application submitted successfully")),
    ))
}

pub(crate) async fn employee_applications_handler<A, J>(
    State(state): State<ApplicationState<A, J>>,
    AuthPrincipal(principal): AuthPrincipal,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<Envelope<Vec<ApplicationView>>>>
where
    A: ApplicationRepository + 'static,
    J: JobRepository + 'static,
{
    let status = params.status()?;
    let page = page_request(params.page, params.limit)?;
    let applications = state
        .service
        .list_for_employee(&principal, status, page)?;
    Ok(Json(Envelope::page(applications)))
}

pub(crate) async fn employer_applications_handler<A, J>(
    State(state): State<ApplicationState<A, J>>,
    AuthPrincipal(principal): AuthPrincipal,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<Envelope<Vec<ApplicationView>>>>
where
    A: ApplicationRepository + 'static,
    J: JobRepository + 'static,
{
    let status = params.status()?;
    let page = page_request(params.page, params.limit)?;
    let applications =
        state
            .service
            .list_for_employer(&principal, status, params.job_id(), page)?;
    Ok(Json(Envelope::page(applications)))
}

pub(crate) async fn view_handler<A, J>(
    State(state): State<ApplicationState<A, J>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(application_id): Path<String>,
) -> ApiResult<Json<Envelope<ApplicationView>>>
where
    A: ApplicationRepository + 'static,
    J: JobRepository + 'static,
{
    let application = state
        .service
        .get(&principal, &ApplicationId(application_id))?;
    Ok(Json(Envelope::new(application)))
}

pub(crate) async fn status_handler<A, J>(
    State(state): State<ApplicationState<A, J>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(application_id): Path<String>,
    body: Result<ValidatedJson<StatusUpdate>, ApiError>,
) -> ApiResult<Json<Envelope<ApplicationView>>>
where
    A: ApplicationRepository + 'static,
    J: JobRepository + 'static,
{
    policy::require_role(&principal, &[Role::Employer, Role::Admin])?;
    let ValidatedJson(update) = body?;
    let application =
        state
            .service
            .transition_status(&principal, &ApplicationId(application_id), update)?;
    Ok(Json(
        Envelope::new(application).with_message("Application status updated successfully"),
    ))
}

pub(crate) async fn withdraw_handler<A, J>(
    State(state): State<ApplicationState<A, J>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(application_id): Path<String>,
) -> ApiResult<Json<Envelope<ApplicationView>>>
where
    A: ApplicationRepository + 'static,
    J: JobRepository + 'static,
{
    let application = state
        .service
        .withdraw(&principal, &ApplicationId(application_id))?;
    Ok(Json(
        Envelope::new(application).with_message("Application withdrawn successfully"),
    ))
}
