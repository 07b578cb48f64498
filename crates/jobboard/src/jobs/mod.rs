//! Job postings: employer-owned, publicly searchable while active.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    Education, ExperienceLevel, Job, JobDraft, JobId, JobPatch, JobQuery, JobSort, JobStatus,
    JobSummary, JobType, SalaryRange,
};
pub use repository::{JobCounter, JobRepository};
pub use router::job_router;
pub use service::{EmployerJobStats, JobOverview, JobService, JobServiceError};
