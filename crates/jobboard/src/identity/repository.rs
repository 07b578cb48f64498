use super::domain::{Principal, PrincipalId, Role};
use crate::store::RepositoryError;
use chrono::{DateTime, Utc};

/// Selects principals for counting and listing.
#[derive(Debug, Clone, Default)]
pub struct PrincipalFilter {
    pub role: Option<Role>,
    pub created_since: Option<DateTime<Utc>>,
    /// See [`Principal::mentions`].
    pub text: Option<String>,
}

impl PrincipalFilter {
    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn since(mut self, instant: DateTime<Utc>) -> Self {
        self.created_since = Some(instant);
        self
    }

    pub fn mentioning(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn matches(&self, principal: &Principal) -> bool {
        self.role.map_or(true, |role| principal.role() == role)
            && self
                .created_since
                .map_or(true, |since| principal.created_at >= since)
            && self
                .text
                .as_deref()
                .map_or(true, |text| principal.mentions(text))
    }
}

/// Emails are unique across all roles; `insert` and `modify` report duplicates as `Conflict`.
///
/// `modify` applies `change` to the stored principal and persists it in one
/// step; nothing is written when `change` fails, and `Ok(None)` means the id
/// is unknown. `change` must not call back into the repository.
pub trait PrincipalRepository: Send + Sync {
    fn insert(&self, principal: Principal) -> Result<Principal, RepositoryError>;
    fn modify<F, E>(&self, id: &PrincipalId, change: F) -> Result<Option<Principal>, E>
    where
        F: FnOnce(&mut Principal) -> Result<(), E>,
        E: From<RepositoryError>;
    fn fetch(&self, id: &PrincipalId) -> Result<Option<Principal>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<Principal>, RepositoryError>;
    fn delete(&self, id: &PrincipalId) -> Result<Option<Principal>, RepositoryError>;
    /// Every match, newest registration first.
    fn list(&self, filter: &PrincipalFilter) -> Result<Vec<Principal>, RepositoryError>;
    fn count(&self, filter: &PrincipalFilter) -> Result<usize, RepositoryError>;
}
