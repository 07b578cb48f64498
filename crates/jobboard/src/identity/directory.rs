//! Account administration on top of [`IdentityService`]: listing, lookup,
//! password changes, and registration statistics.

use super::domain::{PasswordChange, Principal, PrincipalId, ProfileUpdate, Role};
use super::password;
use super::repository::{PrincipalFilter, PrincipalRepository};
use super::service::{IdentityError, IdentityService};
use crate::policy;
use crate::store::{percentage, Page, PageRequest};
use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::info;

const RECENT_REGISTRATION_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDistribution {
    pub employees: u64,
    pub employers: u64,
    pub admins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: usize,
    pub employee_count: usize,
    pub employer_count: usize,
    pub admin_count: usize,
    /// Registrations over the last 30 days.
    pub recent_registrations: usize,
    pub user_distribution: UserDistribution,
}

impl<P> IdentityService<P>
where
    P: PrincipalRepository + 'static,
{
    pub fn list_users(
        &self,
        requested_by: &Principal,
        filter: &PrincipalFilter,
        page: PageRequest,
    ) -> Result<Page<Principal>, IdentityError> {
        policy::require_role(requested_by, &[Role::Admin])?;
        Ok(page.slice(self.principals.list(filter)?))
    }

    /// Unpaginated; a blank query is refused.
    pub fn search_users(
        &self,
        requested_by: &Principal,
        text: &str,
        role: Option<Role>,
    ) -> Result<Vec<Principal>, IdentityError> {
        policy::require_role(requested_by, &[Role::Admin])?;
        if text.trim().is_empty() {
            return Err(IdentityError::MissingQuery);
        }
        let filter = PrincipalFilter {
            role,
            ..PrincipalFilter::default().mentioning(text.trim())
        };
        Ok(self.principals.list(&filter)?)
    }

    pub fn user(&self, requested_by: &Principal, id: &PrincipalId) -> Result<Principal, IdentityError> {
        policy::can_manage_user(requested_by, id)?;
        self.principals.fetch(id)?.ok_or(IdentityError::NotFound)
    }

    pub fn update_user(
        &self,
        requested_by: &Principal,
        id: &PrincipalId,
        update: ProfileUpdate,
    ) -> Result<Principal, IdentityError> {
        policy::can_manage_user(requested_by, id)?;
        let updated = self.apply_profile_update(id, update)?;
        info!(principal_id = %updated.id, updated_by = %requested_by.id, "profile updated");
        Ok(updated)
    }

    /// Verifies and hashes outside the store lock, then swaps the hash only if
    /// it is still the one that was verified.
    pub fn change_password(
        &self,
        requested_by: &Principal,
        id: &PrincipalId,
        change: PasswordChange,
    ) -> Result<(), IdentityError> {
        policy::can_change_password(requested_by, id)?;
        let current = self.principals.fetch(id)?.ok_or(IdentityError::NotFound)?;
        if !password::verify(&change.current_password, &current.password_hash) {
            return Err(IdentityError::IncorrectPassword);
        }

        let replacement = password::hash(&change.new_password)?;
        self.principals
            .modify(id, |stored| -> Result<(), IdentityError> {
                if stored.password_hash != current.password_hash {
                    return Err(IdentityError::IncorrectPassword);
                }
                stored.password_hash = replacement;
                stored.updated_at = Utc::now();
                Ok(())
            })?
            .ok_or(IdentityError::NotFound)?;

        info!(principal_id = %id, "password changed");
        Ok(())
    }

    pub fn user_stats(&self, requested_by: &Principal) -> Result<UserStats, IdentityError> {
        policy::require_role(requested_by, &[Role::Admin])?;
        let since = Utc::now() - Duration::days(RECENT_REGISTRATION_DAYS);

        let employee_count = self.principals.count(&PrincipalFilter::role(Role::Employee))?;
        let employer_count = self.principals.count(&PrincipalFilter::role(Role::Employer))?;
        let admin_count = self.principals.count(&PrincipalFilter::role(Role::Admin))?;
        let total_users = employee_count + employer_count + admin_count;

        Ok(UserStats {
            total_users,
            employee_count,
            employer_count,
            admin_count,
            recent_registrations: self
                .principals
                .count(&PrincipalFilter::default().since(since))?,
            user_distribution: UserDistribution {
                employees: percentage(employee_count, total_users),
                employers: percentage(employer_count, total_users),
                admins: percentage(admin_count, total_users),
            },
        })
    }
}
