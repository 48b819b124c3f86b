//! HTTP error responses.
//!
//! Every failure is rendered as
//! `{ "errorIdentification": "<resource>.<key>", "errorDescription": "..." }`
//! where `<resource>` is the resource that handled the request.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use syllabus_core::error::{DomainError, EntityKind, StorageError};
use syllabus_core::metrics::record_domain_error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_identification: String,
    pub error_description: String,
}

/// An error response: status plus identification body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, resource: EntityKind, key: &str, description: String) -> Self {
        Self {
            status,
            body: ErrorBody {
                error_identification: format!("{}.{key}", resource.as_str()),
                error_description: description,
            },
        }
    }

    /// 400 for a malformed request parameter or body field.
    pub fn bad_request(resource: EntityKind, key: &str, description: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, resource, key, description.into())
    }

    /// 400 for a body that is not the expected JSON.
    pub fn invalid_body(resource: EntityKind, rejection: JsonRejection) -> Self {
        warn!(resource = resource.as_str(), error = %rejection, "Invalid request body");
        Self::bad_request(resource, "body", rejection.body_text())
    }

    /// Map a service error raised while serving `resource`.
    pub fn from_domain(resource: EntityKind, err: DomainError) -> Self {
        record_domain_error(err.kind_label());

        match err {
            DomainError::FieldInvalid { field, message } => {
                Self::new(StatusCode::BAD_REQUEST, resource, &field, message)
            }
            DomainError::NotFound(kind) if kind == resource => Self::new(
                StatusCode::NOT_FOUND,
                resource,
                "notfound",
                format!("{kind} not found"),
            ),
            DomainError::NotFound(dependency) => Self::new(
                StatusCode::NOT_FOUND,
                resource,
                dependency.as_str(),
                "Not found".to_string(),
            ),
            DomainError::Storage(StorageError::InvalidQuery(message)) => {
                Self::new(StatusCode::BAD_REQUEST, resource, "query", message)
            }
            DomainError::Storage(StorageError::ConstraintViolation(message)) => {
                warn!(resource = resource.as_str(), %message, "Constraint violation");
                Self::new(
                    StatusCode::CONFLICT,
                    resource,
                    "conflict",
                    "Conflicts with existing data".to_string(),
                )
            }
            other => {
                error!(resource = resource.as_str(), error = %other, "❌ Request failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    resource,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Attach the handling resource to a service result.
pub trait ResourceResult<T> {
    fn for_resource(self, resource: EntityKind) -> Result<T, ApiError>;
}

impl<T> ResourceResult<T> for Result<T, DomainError> {
    fn for_resource(self, resource: EntityKind) -> Result<T, ApiError> {
        self.map_err(|err| ApiError::from_domain(resource, err))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn identify(resource: EntityKind, err: DomainError) -> (StatusCode, String) {
        let api = ApiError::from_domain(resource, err);
        (api.status(), api.body().error_identification.clone())
    }

    #[test]
    fn test_field_invalid_names_the_field() {
        let (status, id) = identify(
            EntityKind::Course,
            DomainError::field_invalid("url", "must match a URL"),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(id, "course.url");
    }

    // Test critique: l'absence d'une dépendance se distingue de l'absence de la ressource
    #[test]
    fn test_not_found_distinguishes_dependency() {
        let own = ApiError::from_domain(EntityKind::Review, DomainError::NotFound(EntityKind::Review));
        assert_eq!(own.status(), StatusCode::NOT_FOUND);
        assert_eq!(own.body().error_identification, "review.notfound");
        assert_eq!(own.body().error_description, "Review not found");

        let dependency =
            ApiError::from_domain(EntityKind::Review, DomainError::NotFound(EntityKind::Course));
        assert_eq!(dependency.status(), StatusCode::NOT_FOUND);
        assert_eq!(dependency.body().error_identification, "review.course");
        assert_eq!(dependency.body().error_description, "Not found");
    }

    #[test]
    fn test_storage_errors_map_to_status() {
        let cases = [
            (StorageError::InvalidQuery("unknown field".into()), StatusCode::BAD_REQUEST),
            (StorageError::ConstraintViolation("dup".into()), StatusCode::CONFLICT),
            (StorageError::QueryError("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (StorageError::ConnectionError("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let (status, _) = identify(EntityKind::Category, DomainError::Storage(err));
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_body_uses_camel_case_keys() {
        let api = ApiError::bad_request(EntityKind::User, "page", "not a number");
        let json = serde_json::to_value(api.body()).unwrap();
        assert_eq!(json["errorIdentification"], "user.page");
        assert_eq!(json["errorDescription"], "not a number");
    }
}
