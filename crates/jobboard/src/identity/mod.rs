//! Principals (employees, employers, admins), credentials, and session tokens.

pub mod directory;
pub mod domain;
pub mod password;
pub mod repository;
pub mod router;
pub mod service;
pub mod token;

pub use directory::{UserDistribution, UserStats};
pub use domain::{
    CareerLevel, EducationalStatus, EmployeeProfile, EmployerDetails, EmployerProfile, JobInfo,
    LoginRequest, PasswordChange, Principal, PrincipalId, PrincipalProfile, PrincipalView,
    ProfileUpdate, RegisterRequest, Role,
};
pub use repository::{PrincipalFilter, PrincipalRepository};
pub use router::{identity_router, user_router};
pub use service::{IdentityError, IdentityService, Session};
pub use token::{Claims, TokenIssuer};
