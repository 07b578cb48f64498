use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::domain::{
    Education, ExperienceLevel, Job, JobDraft, JobId, JobPatch, JobQuery, JobSort, JobStatus,
    JobType,
};
use super::repository::JobRepository;
use super::service::{EmployerJobStats, JobService};
use crate::api::auth::Authenticator;
use crate::api::{page_request, AuthPrincipal, Envelope, QueryParams, RouteState, ValidatedJson};
use crate::error::{ApiError, ApiResult};
use crate::identity::domain::Role;
use crate::policy;

type JobState<J> = RouteState<JobService<J>>;

/// Public search plus employer posting management under `/api/jobs`.
/// `/api/search/jobs` is an alias of the public search.
pub fn job_router<J>(service: Arc<JobService<J>>, auth: Authenticator) -> Router
where
    J: JobRepository + 'static,
{
    Router::new()
        .route(
            "/api/jobs",
            get(search_handler::<J>).post(create_handler::<J>),
        )
        .route("/api/search/jobs", get(search_handler::<J>))
        .route("/api/jobs/employer/jobs", get(employer_jobs_handler::<J>))
        .route("/api/jobs/employer/stats", get(employer_stats_handler::<J>))
        .route(
            "/api/jobs/:job_id",
            get(view_handler::<J>)
                .put(update_handler::<J>)
                .delete(delete_handler::<J>),
        )
        .with_state(RouteState::new(service, auth))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchParams {
    query: Option<String>,
    location: Option<String>,
    #[serde(rename = "type")]
    job_type: Option<JobType>,
    experience: Option<ExperienceLevel>,
    education: Option<Education>,
    min_salary: Option<f64>,
    max_salary: Option<f64>,
    is_remote: Option<bool>,
    /// Comma-separated; a posting matches when it lists any of them.
    skills: Option<String>,
    sort: Option<JobSort>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl SearchParams {
    fn into_query(self) -> JobQuery {
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        JobQuery {
            text: non_empty(self.query),
            location: non_empty(self.location),
            job_type: self.job_type,
            experience: self.experience,
            education: self.education,
            remote: self.is_remote,
            skills: self
                .skills
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|skill| !skill.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            min_salary: self.min_salary,
            max_salary: self.max_salary,
            ..JobQuery::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EmployerJobsParams {
    status: Option<JobStatus>,
    page: Option<u32>,
    limit: Option<u32>,
}

pub(crate) async fn search_handler<J>(
    State(state): State<JobState<J>>,
    QueryParams(params): QueryParams<SearchParams>,
) -> ApiResult<Json<Envelope<Vec<Job>>>>
where
    J: JobRepository + 'static,
{
    let page = page_request(params.page, params.limit)?;
    let sort = params.sort.unwrap_or_default();
    let jobs = state.service.search(params.into_query(), sort, page)?;
    Ok(Json(Envelope::page(jobs)))
}

pub(crate) async fn create_handler<J>(
    State(state): State<JobState<J>>,
    AuthPrincipal(principal): AuthPrincipal,
    body: Result<ValidatedJson<JobDraft>, ApiError>,
) -> ApiResult<(StatusCode, Json<Envelope<Job>>)>
where
    J: JobRepository + 'static,
{
    policy::require_role(&principal, &[Role::Employer, Role::Admin])?;
    let ValidatedJson(draft) = body?;
    let job = state.service.create(&principal, draft)?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(job).with_message("Job created successfully")),
    ))
}

pub(crate) async fn view_handler<J>(
    State(state): State<JobState<J>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Envelope<Job>>>
where
    J: JobRepository + 'static,
{
    let job = state.service.view(&JobId(job_id))?;
    Ok(Json(Envelope::new(job)))
}

pub(crate) async fn update_handler<J>(
    State(state): State<JobState<J>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(job_id): Path<String>,
    ValidatedJson(patch): ValidatedJson<JobPatch>,
) -> ApiResult<Json<Envelope<Job>>>
where
    J: JobRepository + 'static,
{
    let job = state.service.update(&principal, &JobId(job_id), patch)?;
    Ok(Json(
        Envelope::new(job).with_message("Job updated successfully"),
    ))
}

pub(crate) async fn delete_handler<J>(
    State(state): State<JobState<J>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Envelope<()>>>
where
    J: JobRepository + 'static,
{
    state.service.delete(&principal, &JobId(job_id))?;
    Ok(Json(Envelope::message("Job deleted successfully")))
}

pub(crate) async fn employer_jobs_handler<J>(
    State(state): State<JobState<J>>,
    AuthPrincipal(principal): AuthPrincipal,
    QueryParams(params): QueryParams<EmployerJobsParams>,
) -> ApiResult<Json<Envelope<Vec<Job>>>>
where
    J: JobRepository + 'static,
{
    let page = page_request(params.page, params.limit)?;
    let jobs = state
        .service
        .list_for_employer(&principal, params.status, page)?;
    Ok(Json(Envelope::page(jobs)))
}

pub(crate) async fn employer_stats_handler<J>(
    State(state): State<JobState<J>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Envelope<EmployerJobStats>>>
where
    J: JobRepository + 'static,
{
    let stats = state.service.employer_stats(&principal)?;
    Ok(Json(Envelope::new(stats)))
}
