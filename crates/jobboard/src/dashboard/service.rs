use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::applications::domain::{Application, ApplicationFilter, ApplicationStatus};
use crate::applications::repository::ApplicationRepository;
use crate::error::ApiError;
use crate::identity::domain::{Principal, Role};
use crate::identity::repository::{PrincipalFilter, PrincipalRepository};
use crate::jobs::domain::{Job, JobId, JobQuery, JobStatus};
use crate::jobs::repository::JobRepository;
use crate::policy::{self, Denied};
use crate::store::{percentage, tally, Bucket, RepositoryError};

pub(super) const RECENT_DAYS: i64 = 7;
const TOP_JOBS: usize = 10;
pub const DEFAULT_ANALYTICS_DAYS: u32 = 30;
pub const MAX_ANALYTICS_DAYS: u32 = 365;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Forbidden(#[from] Denied),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<DashboardError> for ApiError {
    fn from(value: DashboardError) -> Self {
        match value {
            DashboardError::Forbidden(denied) => ApiError::forbidden(denied.reason()),
            DashboardError::Repository(err) => err.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub total_applications: usize,
    pub total_employees: usize,
    pub total_employers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub new_jobs: usize,
    pub new_applications: usize,
    pub new_employees: usize,
    pub new_employers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Growth {
    pub jobs_growth: u64,
    pub applications_growth: u64,
    pub employees_growth: u64,
    pub employers_growth: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub overview: Totals,
    pub recent_activity: RecentActivity,
    pub application_status: Vec<Bucket>,
    pub growth: Growth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationTotals {
    pub total_applications: usize,
    pub pending_applications: usize,
    pub accepted_applications: usize,
    pub rejected_applications: usize,
    pub acceptance_rate: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicationCount {
    pub job_id: JobId,
    pub job_title: String,
    pub application_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationAnalytics {
    pub period_days: u32,
    pub overview: ApplicationTotals,
    pub by_status: Vec<Bucket>,
    pub recent_applications: usize,
    pub top_jobs: Vec<JobApplicationCount>,
}

/// Read-only rollups across principals, jobs, and applications.
///
/// Withdrawn applications still count here; they are part of the history.
pub struct DashboardService<P, J, A> {
    pub(super) principals: Arc<P>,
    pub(super) jobs: Arc<J>,
    pub(super) applications: Arc<A>,
}

impl<P, J, A> DashboardService<P, J, A>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
{
    pub fn new(principals: Arc<P>, jobs: Arc<J>, applications: Arc<A>) -> Self {
        Self {
            principals,
            jobs,
            applications,
        }
    }

    pub fn overview(&self, principal: &Principal) -> Result<DashboardOverview, DashboardError> {
        policy::require_role(principal, &[Role::Admin])?;
        let since = Utc::now() - Duration::days(RECENT_DAYS);

        let all_jobs = JobQuery::default();
        let recent_jobs = JobQuery {
            created_since: Some(since),
            ..JobQuery::default()
        };
        let active_jobs = JobQuery {
            status: Some(JobStatus::Active),
            ..JobQuery::default()
        };

        let applications = self.applications.list(&every_application())?;
        let overview = Totals {
            total_jobs: self.jobs.count(&all_jobs)?,
            active_jobs: self.jobs.count(&active_jobs)?,
            total_applications: applications.len(),
            total_employees: self
                .principals
                .count(&PrincipalFilter::role(Role::Employee))?,
            total_employers: self
                .principals
                .count(&PrincipalFilter::role(Role::Employer))?,
        };
        let recent_activity = RecentActivity {
            new_jobs: self.jobs.count(&recent_jobs)?,
            new_applications: applied_since(&applications, since),
            new_employees: self
                .principals
                .count(&PrincipalFilter::role(Role::Employee).since(since))?,
            new_employers: self
                .principals
                .count(&PrincipalFilter::role(Role::Employer).since(since))?,
        };
        let growth = Growth {
            jobs_growth: percentage(recent_activity.new_jobs, overview.total_jobs),
            applications_growth: percentage(
                recent_activity.new_applications,
                overview.total_applications,
            ),
            employees_growth: percentage(recent_activity.new_employees, overview.total_employees),
            employers_growth: percentage(recent_activity.new_employers, overview.total_employers),
        };

        Ok(DashboardOverview {
            overview,
            recent_activity,
            application_status: tally(applications.iter().map(|app| app.status.label())),
            growth,
        })
    }

    /// Open to every authenticated principal; the figures are platform-wide.
    pub fn application_analytics(&self, days: u32) -> Result<ApplicationAnalytics, DashboardError> {
        let since = Utc::now() - Duration::days(i64::from(days));

        let applications = self.applications.list(&every_application())?;
        let with_status = |status: ApplicationStatus| {
            applications
                .iter()
                .filter(|app| app.status == status)
                .count()
        };
        let total = applications.len();
        let accepted = with_status(ApplicationStatus::Accepted);

        Ok(ApplicationAnalytics {
            period_days: days,
            overview: ApplicationTotals {
                total_applications: total,
                pending_applications: with_status(ApplicationStatus::Pending),
                accepted_applications: accepted,
                rejected_applications: with_status(ApplicationStatus::Rejected),
                acceptance_rate: percentage(accepted, total),
            },
            by_status: tally(applications.iter().map(|app| app.status.label())),
            recent_applications: applied_since(&applications, since),
            top_jobs: self
                .ranked_by_applications(&applications, TOP_JOBS)?
                .into_iter()
                .map(|(job, count)| JobApplicationCount {
                    job_id: job.id,
                    job_title: job.title,
                    application_count: count,
                })
                .collect(),
        })
    }

    /// Jobs with the most applications; applications to deleted jobs are skipped.
    pub(super) fn ranked_by_applications(
        &self,
        applications: &[Application],
        limit: usize,
    ) -> Result<Vec<(Job, usize)>, DashboardError> {
        let mut per_job: HashMap<&JobId, usize> = HashMap::new();
        for application in applications {
            *per_job.entry(&application.job_id).or_default() += 1;
        }

        let mut ranked = Vec::with_capacity(per_job.len());
        for (job_id, count) in per_job {
            if let Some(job) = self.jobs.fetch(job_id)? {
                ranked.push((job, count));
            }
        }
        ranked.sort_by(|(a, a_count), (b, b_count)| {
            b_count.cmp(a_count).then_with(|| a.title.cmp(&b.title))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }
}

pub(super) fn every_application() -> ApplicationFilter {
    ApplicationFilter {
        include_withdrawn: true,
        ..ApplicationFilter::default()
    }
}

fn applied_since(applications: &[Application], since: DateTime<Utc>) -> usize {
    applications
        .iter()
        .filter(|app| app.applied_at >= since)
        .count()
}
