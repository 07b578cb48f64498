//! Applications: one employee's candidacy for one job, from submission through
//! review to withdrawal.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, ApplicationView,
    ApplyRequest, StatusUpdate, WithdrawalError,
};
pub use repository::ApplicationRepository;
pub use router::application_router;
pub use service::{ApplicationService, ApplicationServiceError};
