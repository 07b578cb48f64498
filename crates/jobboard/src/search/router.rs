use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;

use super::service::{CandidateQuery, CategoryCount, EmployerQuery, SearchService, SkillCount};
use crate::api::auth::Authenticator;
use crate::api::{page_request, AuthPrincipal, Envelope, QueryParams, RouteState};
use crate::error::{ApiError, ApiResult};
use crate::identity::domain::{CareerLevel, EducationalStatus, PrincipalView};
use crate::identity::repository::PrincipalRepository;
use crate::jobs::domain::Job;
use crate::jobs::repository::JobRepository;

type SearchState<P, J> = RouteState<SearchService<P, J>>;

/// Discovery endpoints under `/api/search`. Job search itself lives on the job router.
pub fn search_router<P, J>(service: Arc<SearchService<P, J>>, auth: Authenticator) -> Router
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
{
    Router::new()
        .route(
            "/api/search/jobs/suggestions",
            get(job_suggestions_handler::<P, J>),
        )
        .route("/api/search/candidates", get(candidates_handler::<P, J>))
        .route(
            "/api/search/candidates/suggestions",
            get(candidate_suggestions_handler::<P, J>),
        )
        .route("/api/search/employers", get(employers_handler::<P, J>))
        .route("/api/search/skills/popular", get(popular_skills_handler::<P, J>))
        .route("/api/search/categories", get(categories_handler::<P, J>))
        .route("/api/search/locations", get(locations_handler::<P, J>))
        .with_state(RouteState::new(service, auth))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CandidateParams {
    query: Option<String>,
    /// Comma-separated.
    skills: Option<String>,
    experience_level: Option<CareerLevel>,
    educational_status: Option<EducationalStatus>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl CandidateParams {
    fn to_query(&self) -> CandidateQuery {
        CandidateQuery {
            text: non_empty(self.query.clone()),
            skills: self
                .skills
                .as_deref()
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|skill| !skill.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            experience: self.experience_level,
            education: self.educational_status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SuggestionParams {
    job_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EmployerParams {
    query: Option<String>,
    industry: Option<String>,
    location: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LocationParams {
    query: Option<String>,
}

async fn job_suggestions_handler<P, J>(
    State(state): State<SearchState<P, J>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Envelope<Vec<Job>>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
{
    let jobs = state.service.job_suggestions(&principal)?;
    Ok(Json(Envelope::new(jobs)))
}

async fn candidates_handler<P, J>(
    State(state): State<SearchState<P, J>>,
    AuthPrincipal(principal): AuthPrincipal,
    QueryParams(params): QueryParams<CandidateParams>,
) -> ApiResult<Json<Envelope<Vec<PrincipalView>>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
{
    let page = page_request(params.page, params.limit)?;
    let found = state
        .service
        .candidates(&principal, &params.to_query(), page)?;
    let views = found.try_map(|candidate| Ok::<_, ApiError>(candidate.view()))?;
    Ok(Json(Envelope::page(views)))
}

async fn candidate_suggestions_handler<P, J>(
    State(state): State<SearchState<P, J>>,
    AuthPrincipal(principal): AuthPrincipal,
    QueryParams(params): QueryParams<SuggestionParams>,
) -> ApiResult<Json<Envelope<Vec<PrincipalView>>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
{
    let candidates = state
        .service
        .candidate_suggestions(&principal, params.job_id.as_deref())?;
    Ok(Json(Envelope::new(
        candidates.iter().map(|candidate| candidate.view()).collect(),
    )))
}

async fn employers_handler<P, J>(
    State(state): State<SearchState<P, J>>,
    QueryParams(params): QueryParams<EmployerParams>,
) -> ApiResult<Json<Envelope<Vec<PrincipalView>>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
{
    let page = page_request(params.page, params.limit)?;
    let query = EmployerQuery {
        text: non_empty(params.query),
        industry: non_empty(params.industry),
        location: non_empty(params.location),
    };
    let found = state.service.employers(&query, page)?;
    let views = found.try_map(|employer| Ok::<_, ApiError>(employer.view()))?;
    Ok(Json(Envelope::page(views)))
}

async fn popular_skills_handler<P, J>(
    State(state): State<SearchState<P, J>>,
) -> ApiResult<Json<Envelope<Vec<SkillCount>>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
{
    Ok(Json(Envelope::new(state.service.popular_skills()?)))
}

async fn categories_handler<P, J>(
    State(state): State<SearchState<P, J>>,
) -> ApiResult<Json<Envelope<Vec<CategoryCount>>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
{
    Ok(Json(Envelope::new(state.service.categories()?)))
}

async fn locations_handler<P, J>(
    State(state): State<SearchState<P, J>>,
    QueryParams(params): QueryParams<LocationParams>,
) -> ApiResult<Json<Envelope<Vec<String>>>>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
{
    let locations = state.service.locations(params.query.as_deref())?;
    Ok(Json(Envelope::new(locations)))
}
