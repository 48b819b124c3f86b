//! In-memory storage adapter.
//!
//! Implements the same repository traits as the PostgreSQL adapter over
//! normalized tables behind a single lock. Uniqueness and reference
//! constraints are enforced like the SQL schema does, so services behave
//! identically on both adapters. Used by the test suites and for running
//! the API without a database.

mod engine;
mod repos;

pub use engine::{FieldValue, MemoryEntity, Queryable};
pub use repos::{
    MemoryCategoryRepository, MemoryCourseRepository, MemoryReviewRepository,
    MemoryUserRepository,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use syllabus_core::error::{StorageError, StorageResult};
use syllabus_core::models::{
    Category, Course, EntityId, NewCategory, NewCourse, NewReview, NewUser, Review, ReviewAuthor,
    ReviewedCourse, User,
};
use syllabus_core::ports::{
    CategoryRepository, CourseRepository, Repositories, ReviewRepository, UserRepository,
};

/// A step of a multi-statement write that can be made to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Fail while deleting the reviews of a course.
    ReviewDelete,
    /// Fail while deleting the course itself, after its reviews.
    CourseDelete,
}

// =============================================================================
// Tables
// =============================================================================

/// Rows keyed by id, with a sequence that never reuses ids.
#[derive(Debug, Clone)]
pub(crate) struct Table<R> {
    rows: BTreeMap<EntityId, R>,
    last_id: EntityId,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<R> Table<R> {
    pub(crate) fn insert(&mut self, row: R) -> EntityId {
        self.last_id += 1;
        self.rows.insert(self.last_id, row);
        self.last_id
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&R> {
        self.rows.get(&id)
    }

    pub(crate) fn contains(&self, id: EntityId) -> bool {
        self.rows.contains_key(&id)
    }

    /// Replace an existing row.
    pub(crate) fn replace(&mut self, id: EntityId, row: R, table: &str) -> StorageResult<()> {
        match self.rows.get_mut(&id) {
            Some(slot) => {
                *slot = row;
                Ok(())
            }
            None => Err(not_found(table, id)),
        }
    }

    pub(crate) fn remove(&mut self, id: EntityId, table: &str) -> StorageResult<R> {
        self.rows.remove(&id).ok_or_else(|| not_found(table, id))
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.rows.keys().copied()
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = (EntityId, &R)> + '_ {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&R) -> bool) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|_, row| keep(row));
        (before - self.rows.len()) as u64
    }
}

pub(crate) fn not_found(table: &str, id: EntityId) -> StorageError {
    StorageError::NotFound(format!("{table} id={id}"))
}

/// The whole store. Cloned to stage multi-step writes.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub(crate) categories: Table<NewCategory>,
    pub(crate) courses: Table<NewCourse>,
    pub(crate) reviews: Table<NewReview>,
    pub(crate) users: Table<NewUser>,
    fail_point: Option<FailPoint>,
}

impl Tables {
    pub(crate) fn category(&self, id: EntityId) -> Option<Category> {
        self.categories.get(id).map(|row| Category {
            id,
            name: row.name.clone(),
        })
    }

    pub(crate) fn course(&self, id: EntityId) -> Option<Course> {
        let row = self.courses.get(id)?;
        Some(Course {
            id,
            name: row.name.clone(),
            url: row.url.clone(),
            description: row.description.clone(),
            category: self.category(row.category_id)?,
        })
    }

    pub(crate) fn review(&self, id: EntityId) -> Option<Review> {
        let row = self.reviews.get(id)?;
        let user = self.users.get(row.user_id)?;
        let course = self.courses.get(row.course_id)?;
        Some(Review {
            id,
            rating: row.rating,
            comment: row.comment.clone(),
            created_at: row.created_at,
            user: ReviewAuthor {
                id: row.user_id,
                name: user.name.clone(),
                email: user.email.clone(),
            },
            course: ReviewedCourse {
                id: row.course_id,
                name: course.name.clone(),
            },
        })
    }

    pub(crate) fn user(&self, id: EntityId) -> Option<User> {
        self.users.get(id).map(|row| {
            let mut roles = row.roles.clone();
            roles.sort_by_key(|role| role.as_str());
            User {
                id,
                name: row.name.clone(),
                email: row.email.clone(),
                password: row.password_hash.clone(),
                created_at: row.created_at,
                roles,
            }
        })
    }

    /// Trip the armed fail point if it is `point`.
    fn trip(&mut self, point: FailPoint) -> StorageResult<()> {
        if self.fail_point == Some(point) {
            self.fail_point = None;
            return Err(StorageError::QueryError(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

pub(crate) type SharedTables = Arc<Mutex<Tables>>;

// =============================================================================
// Composite Repository
// =============================================================================

/// In-memory repositories sharing one store.
pub struct MemoryRepositories {
    tables: SharedTables,
    categories: MemoryCategoryRepository,
    courses: MemoryCourseRepository,
    reviews: MemoryReviewRepository,
    users: MemoryUserRepository,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        let tables = SharedTables::default();
        Self {
            categories: MemoryCategoryRepository::new(Arc::clone(&tables)),
            courses: MemoryCourseRepository::new(Arc::clone(&tables)),
            reviews: MemoryReviewRepository::new(Arc::clone(&tables)),
            users: MemoryUserRepository::new(Arc::clone(&tables)),
            tables,
        }
    }

    /// Make the next multi-statement write fail at `point`.
    pub fn fail_next(&self, point: FailPoint) {
        self.tables.lock().fail_point = Some(point);
    }
}

impl Default for MemoryRepositories {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repositories for MemoryRepositories {
    fn categories(&self) -> &dyn CategoryRepository {
        &self.categories
    }

    fn courses(&self) -> &dyn CourseRepository {
        &self.courses
    }

    fn reviews(&self) -> &dyn ReviewRepository {
        &self.reviews
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    async fn delete_course_cascade(&self, course_id: EntityId) -> StorageResult<u64> {
        let mut tables = self.tables.lock();
        let mut staged = tables.clone();
        tables.fail_point = None;

        // Delete reviews first (child data)
        staged.trip(FailPoint::ReviewDelete)?;
        let reviews = staged.reviews.retain(|review| review.course_id != course_id);

        staged.trip(FailPoint::CourseDelete)?;
        staged.courses.remove(course_id, "courses")?;

        staged.fail_point = None;
        *tables = staged;

        debug!(reviews, "Course cascade committed");
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_never_reused() {
        let mut table = Table::<NewCategory>::default();
        let first = table.insert(NewCategory { name: "A".into() });
        table.remove(first, "categories").unwrap();
        let second = table.insert(NewCategory { name: "B".into() });
        assert_eq!((first, second), (1, 2));
    }

    #[test]
    fn test_fail_point_trips_once() {
        let mut tables = Tables {
            fail_point: Some(FailPoint::CourseDelete),
            ..Default::default()
        };
        assert!(tables.trip(FailPoint::ReviewDelete).is_ok());
        assert!(tables.trip(FailPoint::CourseDelete).is_err());
        assert!(tables.trip(FailPoint::CourseDelete).is_ok());
    }
}
