use crate::error::ApiError;
use crate::store::PageRequest;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has been deserialized and validated; both failures become 400 envelopes.
///
/// Role-gated handlers take `Result<ValidatedJson<T>, ApiError>` and unwrap it
/// after the gate, so a caller with the wrong role hears 403 whatever the body.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string parameters with rejections rendered in the API error envelope.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Defaults to page 1 of 10; rejects page 0 and limits outside 1..=100.
pub fn page_request(page: Option<u32>, limit: Option<u32>) -> Result<PageRequest, ApiError> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(PageRequest::DEFAULT_LIMIT);

    let mut errors = Vec::new();
    if page < 1 {
        errors.push("Page must be a positive number".to_string());
    }
    if !(1..=PageRequest::MAX_LIMIT).contains(&limit) {
        errors.push(format!(
            "Limit must be between 1 and {}",
            PageRequest::MAX_LIMIT
        ));
    }

    if errors.is_empty() {
        Ok(PageRequest::new(page, limit))
    } else {
        Err(ApiError::Validation(errors))
    }
}
