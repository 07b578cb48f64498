use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, ApplicationView,
    ApplyRequest, StatusUpdate, WithdrawalError,
};
use super::repository::ApplicationRepository;
use crate::error::ApiError;
use crate::identity::domain::{Principal, Role};
use crate::jobs::domain::{Job, JobId, JobQuery, JobSummary};
use crate::jobs::repository::{JobCounter, JobRepository};
use crate::policy::{self, Denied};
use crate::store::{Page, PageRequest, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("Application not found")]
    ApplicationNotFound,
    #[error("Job not found")]
    JobNotFound,
    #[error("This job is no longer accepting applications")]
    JobNotAccepting,
    #[error("You have already applied to this job")]
    AlreadyApplied,
    #[error("Invalid status. Must be one of: {}", ApplicationStatus::allowed_labels())]
    InvalidStatus(String),
    #[error(transparent)]
    Withdrawal(#[from] WithdrawalError),
    #[error(transparent)]
    Forbidden(#[from] Denied),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ApplicationServiceError> for ApiError {
    fn from(value: ApplicationServiceError) -> Self {
        match value {
            ApplicationServiceError::ApplicationNotFound | ApplicationServiceError::JobNotFound => {
                ApiError::not_found(value.to_string())
            }
            ApplicationServiceError::JobNotAccepting
            | ApplicationServiceError::AlreadyApplied
            | ApplicationServiceError::Withdrawal(_) => ApiError::conflict(value.to_string()),
            ApplicationServiceError::InvalidStatus(_) => ApiError::bad_request(value.to_string()),
            ApplicationServiceError::Forbidden(denied) => ApiError::forbidden(denied.reason()),
            ApplicationServiceError::Repository(err) => err.into(),
        }
    }
}

/// Application lifecycle: apply, review, withdraw, and the listings around them.
pub struct ApplicationService<A, J> {
    applications: Arc<A>,
    jobs: Arc<J>,
}

impl<A, J> ApplicationService<A, J>
where
    A: ApplicationRepository + 'static,
    J: JobRepository + 'static,
{
    pub fn new(applications: Arc<A>, jobs: Arc<J>) -> Self {
        Self { applications, jobs }
    }

    /// The store's conditional insert decides duplicates, so racing applies
    /// for one (employee, job) pair leave exactly one active application.
    pub fn apply(
        &self,
        principal: &Principal,
        request: ApplyRequest,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        policy::require_role(principal, &[Role::Employee])?;

        let job_id = JobId(request.job_id.trim().to_string());
        let job = self
            .jobs
            .fetch(&job_id)?
            .ok_or(ApplicationServiceError::JobNotFound)?;
        if !job.is_accepting_applications() {
            return Err(ApplicationServiceError::JobNotAccepting);
        }

        let application =
            Application::submit(principal.id.clone(), job.id.clone(), request, Utc::now());
        let stored = match self.applications.insert(application) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => return Err(ApplicationServiceError::AlreadyApplied),
            Err(err) => return Err(err.into()),
        };

        if let Err(err) = self.jobs.increment(&job.id, JobCounter::Applications) {
            warn!(job_id = %job.id, error = %err, "failed to bump application counter");
        }

        info!(
            application_id = %stored.id,
            job_id = %job.id,
            employee_id = %stored.employee_id,
            "application submitted"
        );
        Ok(ApplicationView {
            application: stored,
            job: Some(job.summary()),
        })
    }

    /// Ownership is settled before the write; the status change itself is a
    /// single conditional mutation so it cannot clobber a concurrent withdrawal.
    pub fn transition_status(
        &self,
        principal: &Principal,
        id: &ApplicationId,
        update: StatusUpdate,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        policy::require_role(principal, &[Role::Employer, Role::Admin])?;

        let application = self.load(id)?;
        let status = ApplicationStatus::parse(update.status.trim())
            .ok_or_else(|| ApplicationServiceError::InvalidStatus(update.status.clone()))?;
        let job = self.jobs.fetch(&application.job_id)?;
        policy::can_transition(principal, job.as_ref().map(|job| &job.employer_id))?;

        let mut previous = application.status;
        let stored = self
            .applications
            .modify(id, |current| -> Result<(), ApplicationServiceError> {
                previous = current.status;
                current.transition(status, update.employer_notes, Utc::now());
                Ok(())
            })?
            .ok_or(ApplicationServiceError::ApplicationNotFound)?;

        info!(
            application_id = %stored.id,
            from = previous.label(),
            to = stored.status.label(),
            reviewed_by = %principal.id,
            "application status changed"
        );
        Ok(ApplicationView {
            application: stored,
            job: job.map(|job| job.summary()),
        })
    }

    /// Ownership and the withdrawal rules are checked against the stored
    /// record inside the same mutation that flips it, so of two racing
    /// withdrawals exactly one wins.
    pub fn withdraw(
        &self,
        principal: &Principal,
        id: &ApplicationId,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        policy::require_role(principal, &[Role::Employee, Role::Admin])?;

        let stored = self
            .applications
            .modify(id, |application| -> Result<(), ApplicationServiceError> {
                policy::can_withdraw(principal, application)?;
                application.withdraw(Utc::now())?;
                Ok(())
            })?
            .ok_or(ApplicationServiceError::ApplicationNotFound)?;

        info!(application_id = %stored.id, "application withdrawn");
        let job = self.jobs.fetch(&stored.job_id)?;
        Ok(ApplicationView {
            application: stored,
            job: job.map(|job| job.summary()),
        })
    }

    pub fn get(
        &self,
        principal: &Principal,
        id: &ApplicationId,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let application = self.load(id)?;
        let job = self.jobs.fetch(&application.job_id)?;
        policy::can_read_application(
            principal,
            &application,
            job.as_ref().map(|job| &job.employer_id),
        )?;
        Ok(ApplicationView {
            application,
            job: job.map(|job| job.summary()),
        })
    }

    pub fn list_for_employee(
        &self,
        principal: &Principal,
        status: Option<ApplicationStatus>,
        page: PageRequest,
    ) -> Result<Page<ApplicationView>, ApplicationServiceError> {
        policy::require_role(principal, &[Role::Employee])?;
        let filter = ApplicationFilter {
            status,
            ..ApplicationFilter::for_employee(principal.id.clone())
        };
        let applications = self.applications.find(&filter, page)?;
        self.with_jobs(applications, HashMap::new())
    }

    /// Only ever spans the caller's own jobs; naming someone else's job yields an empty page.
    pub fn list_for_employer(
        &self,
        principal: &Principal,
        status: Option<ApplicationStatus>,
        job_id: Option<JobId>,
        page: PageRequest,
    ) -> Result<Page<ApplicationView>, ApplicationServiceError> {
        policy::require_role(principal, &[Role::Employer])?;

        let owned: HashMap<JobId, Job> = self
            .jobs
            .list(&JobQuery::for_employer(principal.id.clone()))?
            .into_iter()
            .map(|job| (job.id.clone(), job))
            .collect();

        let job_ids = match job_id {
            Some(job_id) if owned.contains_key(&job_id) => vec![job_id],
            Some(_) => return Ok(Page::empty(page)),
            None => owned.keys().cloned().collect(),
        };

        let filter = ApplicationFilter {
            status,
            ..ApplicationFilter::for_jobs(job_ids)
        };
        let applications = self.applications.find(&filter, page)?;
        self.with_jobs(applications, owned)
    }

    fn load(&self, id: &ApplicationId) -> Result<Application, ApplicationServiceError> {
        self.applications
            .fetch(id)?
            .ok_or(ApplicationServiceError::ApplicationNotFound)
    }

    fn with_jobs(
        &self,
        applications: Page<Application>,
        mut known: HashMap<JobId, Job>,
    ) -> Result<Page<ApplicationView>, ApplicationServiceError> {
        let mut summaries: HashMap<JobId, Option<JobSummary>> = HashMap::new();
        applications.try_map(|application| -> Result<ApplicationView, ApplicationServiceError> {
            let job = match summaries.get(&application.job_id) {
                Some(summary) => summary.clone(),
                None => {
                    let job = match known.remove(&application.job_id) {
                        Some(job) => Some(job),
                        None => self.jobs.fetch(&application.job_id)?,
                    };
                    let summary = job.map(|job| job.summary());
                    summaries.insert(application.job_id.clone(), summary.clone());
                    summary
                }
            };
            Ok(ApplicationView { application, job })
        })
    }
}
