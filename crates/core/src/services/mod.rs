//! Entity services: validation, reference resolution and existence checks
//! in front of the repositories.

mod category;
mod course;
mod review;
mod user;

pub use category::CategoryService;
pub use course::CourseService;
pub use review::ReviewService;
pub use user::UserService;

use crate::error::{DomainError, DomainResult, EntityKind, StorageError};

/// Take a field that validation already required.
fn required<T: Clone>(value: &Option<T>, field: &'static str) -> DomainResult<T> {
    value
        .clone()
        .ok_or_else(|| DomainError::field_invalid(field, "may not be null"))
}

/// Map a storage `NotFound` to the domain `NotFound` of `kind`.
fn not_found_as(kind: EntityKind) -> impl FnOnce(StorageError) -> DomainError {
    move |err| match err {
        StorageError::NotFound(_) => DomainError::NotFound(kind),
        other => DomainError::Storage(other),
    }
}
