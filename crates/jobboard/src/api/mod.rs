//! HTTP plumbing shared by every resource router.

pub mod auth;
pub mod extract;

use crate::error::{ApiError, ApiResult};
use crate::store::Page;
use auth::Authenticator;
use axum::extract::FromRef;
use serde::Serialize;
use std::sync::Arc;

pub use auth::{AuthPrincipal, TOKEN_COOKIE};
pub use extract::{page_request, QueryParams, ValidatedJson};

/// Router state: the resource service plus the authenticator used by `AuthPrincipal`.
pub struct RouteState<T> {
    pub service: Arc<T>,
    pub auth: Authenticator,
}

impl<T> RouteState<T> {
    pub fn new(service: Arc<T>, auth: Authenticator) -> Self {
        Self { service, auth }
    }
}

impl<T> Clone for RouteState<T> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            auth: self.auth.clone(),
        }
    }
}

impl<T> FromRef<RouteState<T>> for Authenticator {
    fn from_ref(state: &RouteState<T>) -> Self {
        state.auth.clone()
    }
}

/// Runs CPU-bound work such as Argon2 hashing on tokio's blocking pool so it
/// never stalls the async workers.
pub async fn offload<T, E, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::internal(format!("blocking task join error: {err}")))?
        .map_err(Into::into)
}

/// Success envelope: `{ success: true, message?, data, pagination? }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
            pagination: None,
            total: None,
        }
    }

    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl Envelope<()> {
    pub fn message(message: &'static str) -> Self {
        Self::new(()).with_message(message)
    }
}

impl<T> Envelope<Vec<T>> {
    pub fn page(page: Page<T>) -> Self {
        let pagination = PaginationMeta::from_page(&page);
        Self {
            success: true,
            message: None,
            data: page.items,
            pagination: Some(pagination),
            total: None,
        }
    }

    /// Unpaginated result set together with its size.
    pub fn listing(items: Vec<T>) -> Self {
        let total = items.len();
        Self {
            total: Some(total),
            ..Self::new(items)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: usize,
    pub total: usize,
    pub limit: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PaginationMeta {
    pub fn from_page<T>(page: &Page<T>) -> Self {
        Self {
            current_page: page.page,
            total_pages: page.total_pages(),
            total: page.total,
            limit: page.limit,
            has_next_page: page.has_next_page(),
            has_prev_page: page.has_prev_page(),
        }
    }
}
