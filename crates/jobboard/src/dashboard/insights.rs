//! Posting, registration, and activity rollups layered on [`DashboardService`].

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::service::{every_application, DashboardError, DashboardService, RECENT_DAYS};
use crate::applications::domain::ApplicationFilter;
use crate::applications::repository::ApplicationRepository;
use crate::identity::domain::{Principal, PrincipalId, Role};
use crate::identity::repository::{PrincipalFilter, PrincipalRepository};
use crate::jobs::domain::{Job, JobId, JobQuery, JobStatus, SalaryRange};
use crate::jobs::repository::JobRepository;
use crate::policy;
use crate::store::{percentage, tally, Bucket};

const RECENT_JOBS: usize = 10;
const TOP_SKILLS: usize = 10;
pub const DEFAULT_TOP_JOBS: usize = 10;
pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;
/// Upper bound for the `limit` of top jobs and activity feeds.
pub const MAX_FEED_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTotals {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub inactive_jobs: usize,
    pub active_rate: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryStats {
    pub avg_min_salary: f64,
    pub avg_max_salary: f64,
    pub min_salary: f64,
    pub max_salary: f64,
}

impl SalaryStats {
    fn over(jobs: &[Job]) -> Option<Self> {
        if jobs.is_empty() {
            return None;
        }
        let count = jobs.len() as f64;
        let mins = jobs.iter().map(|job| job.salary.min);
        let maxes = jobs.iter().map(|job| job.salary.max);
        Some(Self {
            avg_min_salary: mins.clone().sum::<f64>() / count,
            avg_max_salary: maxes.clone().sum::<f64>() / count,
            min_salary: mins.fold(f64::INFINITY, f64::min),
            max_salary: maxes.fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAnalytics {
    pub period_days: u32,
    pub overview: JobTotals,
    pub by_type: Vec<Bucket>,
    pub by_experience: Vec<Bucket>,
    /// Newest postings inside the period.
    pub recent_jobs: Vec<Job>,
    /// Absent while there are no postings.
    pub salary_stats: Option<SalaryStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopJob {
    pub job_id: JobId,
    pub title: String,
    pub employer_id: PrincipalId,
    pub location: Option<String>,
    pub application_count: usize,
    pub salary: SalaryRange,
    pub status: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopJobs {
    pub by_applications: Vec<TopJob>,
    pub by_views: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTotals {
    pub total_employees: usize,
    pub total_employers: usize,
    pub total_users: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistrations {
    pub new_employees: usize,
    pub new_employers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    pub period_days: u32,
    pub overview: UserTotals,
    pub recent_activity: NewRegistrations,
    pub employees_by_experience: Vec<Bucket>,
    pub employees_by_education: Vec<Bucket>,
    pub top_skills: Vec<Bucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    JobCreated,
    ApplicationSubmitted,
    EmployeeRegistered,
    EmployerRegistered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    /// Id of the posting, application, or principal the entry is about.
    pub subject_id: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl<P, J, A> DashboardService<P, J, A>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
{
    pub fn job_analytics(&self, days: u32) -> Result<JobAnalytics, DashboardError> {
        let since = Utc::now() - Duration::days(i64::from(days));
        let jobs = self.jobs.list(&JobQuery::default())?;

        let total_jobs = jobs.len();
        let active_jobs = jobs
            .iter()
            .filter(|job| job.status == JobStatus::Active)
            .count();

        Ok(JobAnalytics {
            period_days: days,
            overview: JobTotals {
                total_jobs,
                active_jobs,
                inactive_jobs: total_jobs - active_jobs,
                active_rate: percentage(active_jobs, total_jobs),
            },
            by_type: tally(jobs.iter().map(|job| job.job_type.label())),
            by_experience: tally(jobs.iter().map(|job| job.experience.label())),
            recent_jobs: jobs
                .iter()
                .filter(|job| job.created_at >= since)
                .take(RECENT_JOBS)
                .cloned()
                .collect(),
            salary_stats: SalaryStats::over(&jobs),
        })
    }

    pub fn top_jobs(&self, limit: usize) -> Result<TopJobs, DashboardError> {
        let applications = self.applications.list(&every_application())?;
        let by_applications = self
            .ranked_by_applications(&applications, limit)?
            .into_iter()
            .map(|(job, count)| TopJob {
                job_id: job.id,
                title: job.title,
                employer_id: job.employer_id,
                location: job.location,
                application_count: count,
                salary: job.salary,
                status: job.status,
            })
            .collect();

        let mut by_views = self.jobs.list(&JobQuery::default())?;
        // `list` is newest first and the sort is stable, so ties stay newest first.
        by_views.sort_by(|a, b| b.views_count.cmp(&a.views_count));
        by_views.truncate(limit);

        Ok(TopJobs {
            by_applications,
            by_views,
        })
    }

    pub fn user_analytics(
        &self,
        principal: &Principal,
        days: u32,
    ) -> Result<UserAnalytics, DashboardError> {
        policy::require_role(principal, &[Role::Admin])?;
        let since = Utc::now() - Duration::days(i64::from(days));

        let employees = self.principals.list(&PrincipalFilter::role(Role::Employee))?;
        let employers = self.principals.list(&PrincipalFilter::role(Role::Employer))?;
        let profiles: Vec<_> = employees
            .iter()
            .filter_map(Principal::employee_profile)
            .collect();
        let mut top_skills = tally(
            profiles
                .iter()
                .flat_map(|profile| profile.job_info.skills.iter().cloned()),
        );
        top_skills.truncate(TOP_SKILLS);

        Ok(UserAnalytics {
            period_days: days,
            overview: UserTotals {
                total_employees: employees.len(),
                total_employers: employers.len(),
                total_users: employees.len() + employers.len(),
            },
            recent_activity: NewRegistrations {
                new_employees: registered_since(&employees, since),
                new_employers: registered_since(&employers, since),
            },
            employees_by_experience: tally(
                profiles
                    .iter()
                    .map(|profile| profile.job_info.experience_level.label()),
            ),
            employees_by_education: tally(
                profiles
                    .iter()
                    .map(|profile| profile.job_info.educational_status.label()),
            ),
            top_skills,
        })
    }

    /// Last week's postings, applications, and registrations, newest first.
    pub fn activity(
        &self,
        principal: &Principal,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, DashboardError> {
        policy::require_role(principal, &[Role::Admin])?;
        let since = Utc::now() - Duration::days(RECENT_DAYS);
        let mut entries = Vec::new();

        let jobs = self.jobs.list(&JobQuery {
            created_since: Some(since),
            ..JobQuery::default()
        })?;
        entries.extend(jobs.into_iter().take(limit).map(|job| ActivityEntry {
            kind: ActivityKind::JobCreated,
            subject_id: job.id.0,
            summary: job.title,
            timestamp: job.created_at,
        }));

        let applications = self.applications.list(&ApplicationFilter {
            applied_since: Some(since),
            ..every_application()
        })?;
        for application in applications.into_iter().take(limit) {
            let applicant = self
                .principals
                .fetch(&application.employee_id)?
                .map_or_else(|| "An employee".to_string(), |p| p.profile.display_name());
            let title = self
                .jobs
                .fetch(&application.job_id)?
                .map_or_else(|| "a removed job".to_string(), |job| job.title);
            entries.push(ActivityEntry {
                kind: ActivityKind::ApplicationSubmitted,
                subject_id: application.id.to_string(),
                summary: format!("{applicant} applied to {title}"),
                timestamp: application.applied_at,
            });
        }

        for (role, kind) in [
            (Role::Employee, ActivityKind::EmployeeRegistered),
            (Role::Employer, ActivityKind::EmployerRegistered),
        ] {
            let joined = self.principals.list(&PrincipalFilter::role(role).since(since))?;
            entries.extend(joined.into_iter().take(limit).map(|principal| ActivityEntry {
                kind,
                subject_id: principal.id.0.clone(),
                summary: principal.profile.display_name(),
                timestamp: principal.created_at,
            }));
        }

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }
}

fn registered_since(principals: &[Principal], since: DateTime<Utc>) -> usize {
    principals
        .iter()
        .filter(|principal| principal.created_at >= since)
        .count()
}
