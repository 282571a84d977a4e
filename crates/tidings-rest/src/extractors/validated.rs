//! Validated query-string extractor.
//!
//! `ValidatedQuery<T>` deserializes the query string and validates it with the
//! `validator` crate. Failures are answered with 400 and the standard error
//! envelope, including field-level details.

use crate::responses::ApiResponse;
use axum::{
    async_trait,
    extract::{rejection::QueryRejection, FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use tidings_core::{ErrorResponse, FieldError};
use validator::{Validate, ValidationErrors};

/// Query extractor that validates the deserialized value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T> std::ops::Deref for ValidatedQuery<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rejection type for validated query extraction.
pub enum ValidatedQueryRejection {
    /// Query string could not be deserialized.
    Malformed(QueryRejection),
    /// Deserialized value failed validation.
    Invalid(ValidationErrors),
}

impl IntoResponse for ValidatedQueryRejection {
    fn into_response(self) -> Response {
        let error = match self {
            Self::Malformed(rejection) => ErrorResponse {
                code: "INVALID_QUERY".to_string(),
                message: format!("Invalid query string: {}", rejection.body_text()),
                retryable: false,
                details: None,
            },
            Self::Invalid(errors) => ErrorResponse {
                code: "VALIDATION_ERROR".to_string(),
                message: "Request validation failed".to_string(),
                retryable: false,
                details: Some(convert_validation_errors(&errors)),
            },
        };
        (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error))).into_response()
    }
}

/// Flattens validator errors into field errors, sorted by field name.
fn convert_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| FieldError {
                field: field.to_string(),
                message: err
                    .message
                    .as_ref()
                    .map_or_else(|| format!("Invalid value for '{}'", field), ToString::to_string),
                code: err.code.to_string(),
            })
        })
        .collect();

    field_errors.sort_by(|a, b| a.field.cmp(&b.field));
    field_errors
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedQueryRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidatedQueryRejection::Malformed)?;

        value.validate().map_err(ValidatedQueryRejection::Invalid)?;

        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidings_service::{NewsQuery, NewsSearchQuery};

    #[test]
    fn test_page_size_out_of_range() {
        let query = NewsQuery {
            page_size: Some(500),
            ..Default::default()
        };

        let errors = query.validate().unwrap_err();
        let field_errors = convert_validation_errors(&errors);

        assert_eq!(field_errors.len(), 1);
        assert_eq!(field_errors[0].field, "page_size");
        assert_eq!(field_errors[0].message, "Page size must be 1-100");
    }

    #[test]
    fn test_multiple_fields_are_reported() {
        let query = NewsQuery {
            page: Some(0),
            language: Some("english".to_string()),
            ..Default::default()
        };

        let field_errors = convert_validation_errors(&query.validate().unwrap_err());
        let fields: Vec<&str> = field_errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["language", "page"]);
    }

    #[test]
    fn test_empty_search_is_rejected() {
        let query = NewsSearchQuery {
            q: String::new(),
            page: None,
            page_size: None,
        };
        assert!(query.validate().is_err());
    }
}
