// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request extractors that turn rejections into [`AppError`] responses.

use crate::error::AppError;
use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

/// JSON body that has been deserialized and validated.
///
/// Malformed bodies and validation failures are both `invalid_payload`,
/// reported before the handler (and so before any database call) runs.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string whose rejection is a JSON `invalid_query` error.
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(value))
    }
}

/// Validate a document ID from the path. IDs are UUIDs.
pub fn parse_id(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| AppError::bad_id())
}

/// Generate a fresh document ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = new_id();
        assert_eq!(parse_id(&id).unwrap(), id);
        assert_eq!(parse_id(&id.to_uppercase()).unwrap(), id);
        assert_eq!(parse_id("68f932097630f767845262a2").unwrap_err().code(), "bad_id");
    }
}
