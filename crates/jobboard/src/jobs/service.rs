use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Job, JobDraft, JobId, JobPatch, JobQuery, JobSort, JobStatus};
use super::repository::{JobCounter, JobRepository};
use crate::error::ApiError;
use crate::identity::domain::{Principal, Role};
use crate::policy::{self, Denied};
use crate::store::{tally, Bucket, Page, PageRequest, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    #[error("Job not found")]
    NotFound,
    #[error(transparent)]
    Forbidden(#[from] Denied),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<JobServiceError> for ApiError {
    fn from(value: JobServiceError) -> Self {
        match value {
            JobServiceError::NotFound => ApiError::not_found(value.to_string()),
            JobServiceError::Forbidden(denied) => ApiError::forbidden(denied.reason()),
            JobServiceError::Repository(err) => err.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOverview {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub inactive_jobs: usize,
    pub total_views: u64,
    pub total_applications: u64,
    pub avg_views: f64,
    pub avg_applications: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerJobStats {
    pub overview: JobOverview,
    pub by_type: Vec<Bucket>,
    pub by_experience: Vec<Bucket>,
}

/// Posting lifecycle for employers plus public search.
pub struct JobService<J> {
    jobs: Arc<J>,
}

impl<J> JobService<J>
where
    J: JobRepository + 'static,
{
    pub fn new(jobs: Arc<J>) -> Self {
        Self { jobs }
    }

    pub fn create(&self, principal: &Principal, draft: JobDraft) -> Result<Job, JobServiceError> {
        policy::require_role(principal, &[Role::Employer, Role::Admin])?;
        let job = self
            .jobs
            .insert(Job::from_draft(principal.id.clone(), draft))?;
        info!(job_id = %job.id, employer_id = %job.employer_id, "job posted");
        Ok(job)
    }

    /// Public search only ever sees active postings.
    pub fn search(
        &self,
        query: JobQuery,
        sort: JobSort,
        page: PageRequest,
    ) -> Result<Page<Job>, JobServiceError> {
        let query = JobQuery {
            status: Some(JobStatus::Active),
            ..query
        };
        Ok(self.jobs.find(&query, sort, page)?)
    }

    /// Counts the view before reading; a failed count never fails the read.
    pub fn view(&self, id: &JobId) -> Result<Job, JobServiceError> {
        match self.jobs.increment(id, JobCounter::Views) {
            Ok(()) | Err(RepositoryError::NotFound) => {}
            Err(err) => warn!(job_id = %id, error = %err, "failed to record job view"),
        }
        self.jobs.fetch(id)?.ok_or(JobServiceError::NotFound)
    }

    pub fn update(
        &self,
        principal: &Principal,
        id: &JobId,
        patch: JobPatch,
    ) -> Result<Job, JobServiceError> {
        let mut job = self.owned_job(principal, id)?;
        patch.apply_to(&mut job);
        let job = self.jobs.update(job)?;
        info!(job_id = %job.id, status = job.status.label(), "job updated");
        Ok(job)
    }

    pub fn delete(&self, principal: &Principal, id: &JobId) -> Result<Job, JobServiceError> {
        self.owned_job(principal, id)?;
        let removed = self.jobs.delete(id)?.ok_or(JobServiceError::NotFound)?;
        info!(job_id = %removed.id, "job deleted");
        Ok(removed)
    }

    pub fn list_for_employer(
        &self,
        principal: &Principal,
        status: Option<JobStatus>,
        page: PageRequest,
    ) -> Result<Page<Job>, JobServiceError> {
        policy::require_role(principal, &[Role::Employer])?;
        let query = JobQuery {
            status,
            ..JobQuery::for_employer(principal.id.clone())
        };
        Ok(self.jobs.find(&query, JobSort::Recent, page)?)
    }

    pub fn employer_stats(&self, principal: &Principal) -> Result<EmployerJobStats, JobServiceError> {
        policy::require_role(principal, &[Role::Employer])?;
        let jobs = self
            .jobs
            .list(&JobQuery::for_employer(principal.id.clone()))?;

        let total_jobs = jobs.len();
        let active_jobs = jobs
            .iter()
            .filter(|job| job.status == JobStatus::Active)
            .count();
        let total_views: u64 = jobs.iter().map(|job| job.views_count).sum();
        let total_applications: u64 = jobs.iter().map(|job| job.applications_count).sum();
        let average = |total: u64| {
            if total_jobs == 0 {
                0.0
            } else {
                total as f64 / total_jobs as f64
            }
        };

        Ok(EmployerJobStats {
            overview: JobOverview {
                total_jobs,
                active_jobs,
                inactive_jobs: total_jobs - active_jobs,
                total_views,
                total_applications,
                avg_views: average(total_views),
                avg_applications: average(total_applications),
            },
            by_type: tally(jobs.iter().map(|job| job.job_type.label())),
            by_experience: tally(jobs.iter().map(|job| job.experience.label())),
        })
    }

    fn owned_job(&self, principal: &Principal, id: &JobId) -> Result<Job, JobServiceError> {
        let job = self.jobs.fetch(id)?.ok_or(JobServiceError::NotFound)?;
        policy::can_mutate_job(principal, &job)?;
        Ok(job)
    }
}
