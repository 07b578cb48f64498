//! Aggregate counts for the admin dashboard: overview, analytics, rankings, and activity.

pub mod insights;
pub mod router;
pub mod service;

pub use insights::{
    ActivityEntry, ActivityKind, JobAnalytics, JobTotals, NewRegistrations, SalaryStats, TopJob,
    TopJobs, UserAnalytics, UserTotals,
};
pub use router::dashboard_router;
pub use service::{
    ApplicationAnalytics, DashboardError, DashboardOverview, DashboardService, JobApplicationCount,
    DEFAULT_ANALYTICS_DAYS, MAX_ANALYTICS_DAYS,
};
