pub mod api;
pub mod app;
pub mod applications;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod identity;
pub mod jobs;
pub mod policy;
pub mod search;
pub mod store;
pub mod telemetry;

pub use app::JobBoard;
