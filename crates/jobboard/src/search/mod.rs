//! Suggestions and directory search across postings and profiles.

pub mod router;
pub mod service;

pub use router::search_router;
pub use service::{
    CandidateQuery, CategoryCount, EmployerQuery, SearchError, SearchService, SkillCount,
};
