use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::identity::domain::{blank, PrincipalId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Only `Active` postings accept applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Active,
    Inactive,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Active => "Active",
            JobStatus::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    Internship,
    #[serde(rename = "Part Time")]
    PartTime,
    Hybrid,
    #[serde(rename = "Full time")]
    FullTime,
    Freelance,
}

impl JobType {
    pub const fn label(self) -> &'static str {
        match self {
            JobType::Internship => "Internship",
            JobType::PartTime => "Part Time",
            JobType::Hybrid => "Hybrid",
            JobType::FullTime => "Full time",
            JobType::Freelance => "Freelance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub const fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Education {
    HighSchool,
    Bachelor,
    #[serde(rename = "Bachelor Student")]
    BachelorStudent,
    Master,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl SalaryRange {
    fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if self.min < 0.0 || self.max < 0.0 {
            problems.push("Salary values cannot be negative");
        }
        if self.min > self.max {
            problems.push("Minimum salary cannot be greater than maximum salary");
        }
        problems
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub employer_id: PrincipalId,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub salary: SalaryRange,
    pub experience: ExperienceLevel,
    pub education: Education,
    pub skills: Vec<String>,
    pub status: JobStatus,
    pub hours_of_work: Option<String>,
    pub location: Option<String>,
    pub is_remote: bool,
    pub applications_count: u64,
    pub views_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn from_draft(employer_id: PrincipalId, draft: JobDraft) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::generate(),
            employer_id,
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            requirements: draft.requirements,
            responsibilities: draft.responsibilities,
            job_type: draft.job_type,
            salary: draft.salary,
            experience: draft.experience,
            education: draft.education,
            skills: draft.skills,
            status: draft.status.unwrap_or_default(),
            hours_of_work: draft.hours_of_work,
            location: draft.location,
            is_remote: draft.is_remote,
            applications_count: 0,
            views_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_accepting_applications(&self) -> bool {
        self.status == JobStatus::Active
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            employer_id: self.employer_id.clone(),
            job_type: self.job_type,
            location: self.location.clone(),
            is_remote: self.is_remote,
            salary: self.salary.clone(),
            status: self.status,
        }
    }
}

/// Job fields embedded next to applications.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub employer_id: PrincipalId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub location: Option<String>,
    pub is_remote: bool,
    pub salary: SalaryRange,
    pub status: JobStatus,
}

/// Payload for a new posting. Every descriptive field is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub salary: SalaryRange,
    pub experience: ExperienceLevel,
    pub education: Education,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub hours_of_work: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_remote: bool,
}

impl Validate for JobDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", blank("Job title is required"));
        }
        if self.description.trim().is_empty() {
            errors.add("description", blank("Job description is required"));
        }
        if self.requirements.iter().all(|item| item.trim().is_empty()) {
            errors.add("requirements", blank("At least one requirement is required"));
        }
        if self.responsibilities.iter().all(|item| item.trim().is_empty()) {
            errors.add(
                "responsibilities",
                blank("At least one responsibility is required"),
            );
        }
        if self.skills.iter().all(|item| item.trim().is_empty()) {
            errors.add("skills", blank("At least one skill is required"));
        }
        if self
            .hours_of_work
            .as_deref()
            .map_or(true, |hours| hours.trim().is_empty())
        {
            errors.add("hoursOfWork", blank("Hours of work is required"));
        }
        for problem in self.salary.problems() {
            errors.add("salary", blank(problem));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub responsibilities: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub job_type: Option<JobType>,
    pub salary: Option<SalaryRange>,
    pub experience: Option<ExperienceLevel>,
    pub education: Option<Education>,
    pub skills: Option<Vec<String>>,
    pub status: Option<JobStatus>,
    pub hours_of_work: Option<String>,
    pub location: Option<String>,
    pub is_remote: Option<bool>,
}

impl Validate for JobPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.title.as_deref().is_some_and(|v| v.trim().is_empty()) {
            errors.add("title", blank("Job title cannot be empty"));
        }
        if self
            .description
            .as_deref()
            .is_some_and(|v| v.trim().is_empty())
        {
            errors.add("description", blank("Job description cannot be empty"));
        }
        if let Some(salary) = &self.salary {
            for problem in salary.problems() {
                errors.add("salary", blank(problem));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl JobPatch {
    pub fn apply_to(self, job: &mut Job) {
        if let Some(title) = self.title {
            job.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            job.description = description.trim().to_string();
        }
        if let Some(requirements) = self.requirements {
            job.requirements = requirements;
        }
        if let Some(responsibilities) = self.responsibilities {
            job.responsibilities = responsibilities;
        }
        if let Some(job_type) = self.job_type {
            job.job_type = job_type;
        }
        if let Some(salary) = self.salary {
            job.salary = salary;
        }
        if let Some(experience) = self.experience {
            job.experience = experience;
        }
        if let Some(education) = self.education {
            job.education = education;
        }
        if let Some(skills) = self.skills {
            job.skills = skills;
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(hours) = self.hours_of_work {
            job.hours_of_work = Some(hours);
        }
        if let Some(location) = self.location {
            job.location = Some(location);
        }
        if let Some(is_remote) = self.is_remote {
            job.is_remote = is_remote;
        }
        job.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSort {
    #[default]
    Recent,
    Salary,
}

/// Filters shared by public search, employer listings, and statistics.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub employer: Option<PrincipalId>,
    pub status: Option<JobStatus>,
    /// Case-insensitive match against title, description, and skills.
    pub text: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub experience: Option<ExperienceLevel>,
    pub education: Option<Education>,
    pub remote: Option<bool>,
    pub skills: Vec<String>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub created_since: Option<DateTime<Utc>>,
}

impl JobQuery {
    pub fn for_employer(employer: PrincipalId) -> Self {
        Self {
            employer: Some(employer),
            ..Self::default()
        }
    }

    pub fn matches(&self, job: &Job) -> bool {
        if self.employer.as_ref().is_some_and(|id| &job.employer_id != id) {
            return false;
        }
        if self.status.is_some_and(|status| job.status != status) {
            return false;
        }
        if let Some(text) = self.text.as_deref().map(str::to_lowercase) {
            let hit = job.title.to_lowercase().contains(&text)
                || job.description.to_lowercase().contains(&text)
                || job
                    .skills
                    .iter()
                    .any(|skill| skill.to_lowercase().contains(&text));
            if !hit {
                return false;
            }
        }
        if let Some(location) = self.location.as_deref().map(str::to_lowercase) {
            let hit = job
                .location
                .as_deref()
                .is_some_and(|value| value.to_lowercase().contains(&location));
            if !hit {
                return false;
            }
        }
        if self.job_type.is_some_and(|kind| job.job_type != kind)
            || self.experience.is_some_and(|level| job.experience != level)
            || self.education.is_some_and(|level| job.education != level)
            || self.remote.is_some_and(|remote| job.is_remote != remote)
        {
            return false;
        }
        if !self.skills.is_empty() {
            let has_any = self.skills.iter().any(|wanted| {
                job.skills
                    .iter()
                    .any(|skill| skill.eq_ignore_ascii_case(wanted.trim()))
            });
            if !has_any {
                return false;
            }
        }
        if self.min_salary.is_some_and(|min| job.salary.min < min)
            || self.max_salary.is_some_and(|max| job.salary.max > max)
        {
            return false;
        }
        self.created_since
            .map_or(true, |since| job.created_at >= since)
    }
}
