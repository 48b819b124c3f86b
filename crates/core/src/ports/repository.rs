//! Port traits for data repositories.
//!
//! These traits define the storage interface used by the domain layer.
//! Implementations live in the infrastructure layer (`syllabus-storage`).

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{
    Category, Course, EntityId, NewCategory, NewCourse, NewReview, NewUser, Review, User,
};

use super::filter::{CategoryFilter, CourseFilter, ReviewFilter, UserFilter};
use super::pagination::PagedResult;

// =============================================================================
// Generic Repository
// =============================================================================

/// CRUD and paged lookup over one entity type.
///
/// `E` is the loaded entity, `N` the validated record written on add and
/// update, `F` the filter accepted by [`Repository::find_by_filter`].
#[async_trait]
pub trait Repository<E, N, F>: Send + Sync
where
    E: Send + 'static,
    N: Sync + 'static,
    F: Sync + 'static,
{
    /// Persist a new entity and return it with its generated id.
    async fn add(&self, new: &N) -> StorageResult<E>;

    /// Get entity by id. Absence is not an error.
    async fn find_by_id(&self, id: EntityId) -> StorageResult<Option<E>>;

    /// Overwrite the full state of an entity.
    ///
    /// Fails with `StorageError::NotFound` if no row has this id.
    async fn update(&self, id: EntityId, new: &N) -> StorageResult<()>;

    /// Remove an entity.
    ///
    /// Fails with `StorageError::NotFound` if no row has this id.
    async fn delete(&self, id: EntityId) -> StorageResult<()>;

    /// Every entity, ordered by id ascending.
    async fn find_all(&self) -> StorageResult<Vec<E>>;

    /// Whether an entity with this id exists, without loading it.
    async fn id_exists(&self, id: EntityId) -> StorageResult<bool>;

    /// Filtered, sorted, paginated lookup with the total matching count.
    async fn find_by_filter(&self, filter: &F) -> StorageResult<PagedResult<E>>;
}

// =============================================================================
// Entity Repositories
// =============================================================================

/// Repository for categories.
pub trait CategoryRepository: Repository<Category, NewCategory, CategoryFilter> {}

/// Repository for courses.
pub trait CourseRepository: Repository<Course, NewCourse, CourseFilter> {}

/// Repository for reviews.
#[async_trait]
pub trait ReviewRepository: Repository<Review, NewReview, ReviewFilter> {
    /// Delete every review of a course, returning how many were removed.
    async fn delete_by_course_id(&self, course_id: EntityId) -> StorageResult<u64>;
}

/// Repository for users.
#[async_trait]
pub trait UserRepository: Repository<User, NewUser, UserFilter> {
    /// Get user by email (exact match).
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>>;
}

// =============================================================================
// Composite Repository
// =============================================================================

/// Combined repository access for the services.
///
/// This trait provides access to all individual repositories and
/// atomic operations that span multiple tables.
#[async_trait]
pub trait Repositories: Send + Sync {
    /// Access the category repository.
    fn categories(&self) -> &dyn CategoryRepository;

    /// Access the course repository.
    fn courses(&self) -> &dyn CourseRepository;

    /// Access the review repository.
    fn reviews(&self) -> &dyn ReviewRepository;

    /// Access the user repository.
    fn users(&self) -> &dyn UserRepository;

    /// Delete a course and all of its reviews in a single transaction.
    ///
    /// Returns the number of reviews removed. If any statement fails,
    /// nothing is deleted.
    async fn delete_course_cascade(&self, course_id: EntityId) -> StorageResult<u64>;
}
