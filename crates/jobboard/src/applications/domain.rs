use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::identity::domain::PrincipalId;
use crate::jobs::domain::{JobId, JobSummary};

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Review status. Any status may move to any other; withdrawal is tracked separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Shortlisted,
    Interviewed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Reviewed => "Reviewed",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Interviewed => "Interviewed",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Terminal statuses block withdrawal, not further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected
        )
    }

    /// Exact, case-sensitive match on the label.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == value)
    }

    pub fn allowed_labels() -> String {
        Self::ALL
            .iter()
            .map(|status| status.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WithdrawalError {
    #[error("Application has already been withdrawn")]
    AlreadyWithdrawn,
    #[error("Cannot withdraw application that has been accepted or rejected")]
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub employee_id: PrincipalId,
    pub job_id: JobId,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub resume: Option<String>,
    pub expected_salary: Option<f64>,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub employer_notes: Option<String>,
    pub employee_notes: Option<String>,
    pub is_withdrawn: bool,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn submit(
        employee_id: PrincipalId,
        job_id: JobId,
        request: ApplyRequest,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApplicationId::generate(),
            employee_id,
            job_id,
            status: ApplicationStatus::Pending,
            cover_letter: non_blank(request.cover_letter),
            resume: non_blank(request.resume),
            expected_salary: request.expected_salary,
            applied_at: now,
            reviewed_at: None,
            employer_notes: None,
            employee_notes: non_blank(request.employee_notes),
            is_withdrawn: false,
            withdrawn_at: None,
            updated_at: now,
        }
    }

    /// Withdrawn applications no longer block a new one for the same job.
    pub fn is_active(&self) -> bool {
        !self.is_withdrawn
    }

    /// Sets the status and review time. Absent notes keep the previous notes.
    pub fn transition(
        &mut self,
        status: ApplicationStatus,
        employer_notes: Option<String>,
        now: DateTime<Utc>,
    ) {
        let reviewed_at = now.max(self.applied_at);
        self.status = status;
        self.reviewed_at = Some(reviewed_at);
        if let Some(notes) = employer_notes {
            self.employer_notes = Some(notes);
        }
        self.updated_at = reviewed_at;
    }

    /// One-way: an application withdraws at most once and never after a final decision.
    pub fn withdraw(&mut self, now: DateTime<Utc>) -> Result<(), WithdrawalError> {
        if self.is_withdrawn {
            return Err(WithdrawalError::AlreadyWithdrawn);
        }
        if self.status.is_terminal() {
            return Err(WithdrawalError::Finalized);
        }
        let withdrawn_at = now.max(self.applied_at);
        self.is_withdrawn = true;
        self.withdrawn_at = Some(withdrawn_at);
        self.updated_at = withdrawn_at;
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Application joined with the job it targets; the job is absent once deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<JobSummary>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[validate(length(min = 1, message = "Job ID is required"))]
    #[serde(default)]
    pub job_id: String,
    #[validate(length(max = 2000, message = "Cover letter cannot exceed 2000 characters"))]
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[validate(range(min = 0.0, message = "Expected salary must be a positive number"))]
    #[serde(default)]
    pub expected_salary: Option<f64>,
    #[serde(default)]
    pub resume: Option<String>,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    #[serde(default)]
    pub employee_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: String,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    #[serde(default)]
    pub employer_notes: Option<String>,
}

/// Selects applications for listing and counting.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub employee: Option<PrincipalId>,
    /// Restricts to these jobs; an empty list matches nothing.
    pub jobs: Option<Vec<JobId>>,
    pub status: Option<ApplicationStatus>,
    pub include_withdrawn: bool,
    pub applied_since: Option<DateTime<Utc>>,
}

impl ApplicationFilter {
    pub fn for_employee(employee: PrincipalId) -> Self {
        Self {
            employee: Some(employee),
            ..Self::default()
        }
    }

    pub fn for_jobs(jobs: Vec<JobId>) -> Self {
        Self {
            jobs: Some(jobs),
            ..Self::default()
        }
    }

    pub fn matches(&self, application: &Application) -> bool {
        (self.include_withdrawn || application.is_active())
            && self
                .employee
                .as_ref()
                .map_or(true, |id| &application.employee_id == id)
            && self
                .jobs
                .as_ref()
                .map_or(true, |jobs| jobs.contains(&application.job_id))
            && self
                .status
                .map_or(true, |status| application.status == status)
            && self
                .applied_since
                .map_or(true, |since| application.applied_at >= since)
    }
}
