//! In-memory entity repositories.
//!
//! Every method takes the store lock once and never awaits while holding it.

use async_trait::async_trait;

use syllabus_core::error::{StorageError, StorageResult};
use syllabus_core::models::{
    Category, Course, EntityId, NewCategory, NewCourse, NewReview, NewUser, Review, User,
};
use syllabus_core::ports::{
    CategoryFilter, CategoryRepository, CourseFilter, CourseRepository, PagedResult, Repository,
    ReviewFilter, ReviewRepository, UserFilter, UserRepository,
};

use super::engine::{CATEGORY, COURSE, REVIEW, USER};
use super::{SharedTables, Tables, not_found};

fn unique_violation(constraint: &str) -> StorageError {
    StorageError::ConstraintViolation(format!(
        "duplicate key value violates unique constraint \"{constraint}\""
    ))
}

fn foreign_key_violation(table: &str, referenced: &str) -> StorageError {
    StorageError::ConstraintViolation(format!(
        "{table} references a missing or still referenced {referenced} row"
    ))
}

/// Load every row of a table through `load`, in id order.
fn load_all<T>(
    tables: &Tables,
    ids: impl Iterator<Item = EntityId>,
    load: impl Fn(&Tables, EntityId) -> Option<T>,
) -> Vec<T> {
    ids.filter_map(|id| load(tables, id)).collect()
}

// =============================================================================
// Categories
// =============================================================================

pub struct MemoryCategoryRepository {
    tables: SharedTables,
}

impl MemoryCategoryRepository {
    pub(crate) fn new(tables: SharedTables) -> Self {
        Self { tables }
    }
}

fn check_category(tables: &Tables, id: Option<EntityId>, new: &NewCategory) -> StorageResult<()> {
    let taken = tables
        .categories
        .values()
        .any(|(other, row)| Some(other) != id && row.name == new.name);
    if taken {
        return Err(unique_violation("categories_name_key"));
    }
    Ok(())
}

#[async_trait]
impl Repository<Category, NewCategory, CategoryFilter> for MemoryCategoryRepository {
    async fn add(&self, new: &NewCategory) -> StorageResult<Category> {
        let mut tables = self.tables.lock();
        check_category(&tables, None, new)?;
        let id = tables.categories.insert(new.clone());
        tables.category(id).ok_or_else(|| not_found("categories", id))
    }

    async fn find_by_id(&self, id: EntityId) -> StorageResult<Option<Category>> {
        Ok(self.tables.lock().category(id))
    }

    async fn update(&self, id: EntityId, new: &NewCategory) -> StorageResult<()> {
        let mut tables = self.tables.lock();
        check_category(&tables, Some(id), new)?;
        tables.categories.replace(id, new.clone(), "categories")
    }

    async fn delete(&self, id: EntityId) -> StorageResult<()> {
        let mut tables = self.tables.lock();
        if tables.courses.values().any(|(_, course)| course.category_id == id) {
            return Err(foreign_key_violation("courses", "categories"));
        }
        tables.categories.remove(id, "categories").map(|_| ())
    }

    async fn find_all(&self) -> StorageResult<Vec<Category>> {
        let tables = self.tables.lock();
        Ok(load_all(&tables, tables.categories.ids(), Tables::category))
    }

    async fn id_exists(&self, id: EntityId) -> StorageResult<bool> {
        Ok(self.tables.lock().categories.contains(id))
    }

    async fn find_by_filter(&self, filter: &CategoryFilter) -> StorageResult<PagedResult<Category>> {
        let tables = self.tables.lock();
        let rows = load_all(&tables, tables.categories.ids(), Tables::category);
        CATEGORY.find_paged(rows, filter)
    }
}

impl CategoryRepository for MemoryCategoryRepository {}

// =============================================================================
// Courses
// =============================================================================

pub struct MemoryCourseRepository {
    tables: SharedTables,
}

impl MemoryCourseRepository {
    pub(crate) fn new(tables: SharedTables) -> Self {
        Self { tables }
    }
}

fn check_course(tables: &Tables, id: Option<EntityId>, new: &NewCourse) -> StorageResult<()> {
    if !tables.categories.contains(new.category_id) {
        return Err(foreign_key_violation("courses", "categories"));
    }
    let taken = tables
        .courses
        .values()
        .any(|(other, row)| Some(other) != id && row.name == new.name);
    if taken {
        return Err(unique_violation("courses_name_key"));
    }
    Ok(())
}

#[async_trait]
impl Repository<Course, NewCourse, CourseFilter> for MemoryCourseRepository {
    async fn add(&self, new: &NewCourse) -> StorageResult<Course> {
        let mut tables = self.tables.lock();
        check_course(&tables, None, new)?;
        let id = tables.courses.insert(new.clone());
        tables.course(id).ok_or_else(|| not_found("courses", id))
    }

    async fn find_by_id(&self, id: EntityId) -> StorageResult<Option<Course>> {
        Ok(self.tables.lock().course(id))
    }

    async fn update(&self, id: EntityId, new: &NewCourse) -> StorageResult<()> {
        let mut tables = self.tables.lock();
        if !tables.courses.contains(id) {
            return Err(not_found("courses", id));
        }
        check_course(&tables, Some(id), new)?;
        tables.courses.replace(id, new.clone(), "courses")
    }

    async fn delete(&self, id: EntityId) -> StorageResult<()> {
        let mut tables = self.tables.lock();
        if tables.reviews.values().any(|(_, review)| review.course_id == id) {
            return Err(foreign_key_violation("reviews", "courses"));
        }
        tables.courses.remove(id, "courses").map(|_| ())
    }

    async fn find_all(&self) -> StorageResult<Vec<Course>> {
        let tables = self.tables.lock();
        Ok(load_all(&tables, tables.courses.ids(), Tables::course))
    }

    async fn id_exists(&self, id: EntityId) -> StorageResult<bool> {
        Ok(self.tables.lock().courses.contains(id))
    }

    async fn find_by_filter(&self, filter: &CourseFilter) -> StorageResult<PagedResult<Course>> {
        let tables = self.tables.lock();
        let rows = load_all(&tables, tables.courses.ids(), Tables::course);
        COURSE.find_paged(rows, filter)
    }
}

impl CourseRepository for MemoryCourseRepository {}

// =============================================================================
// Reviews
// =============================================================================

pub struct MemoryReviewRepository {
    tables: SharedTables,
}

impl MemoryReviewRepository {
    pub(crate) fn new(tables: SharedTables) -> Self {
        Self { tables }
    }
}

fn check_review(tables: &Tables, new: &NewReview) -> StorageResult<()> {
    if !tables.users.contains(new.user_id) {
        return Err(foreign_key_violation("reviews", "users"));
    }
    if !tables.courses.contains(new.course_id) {
        return Err(foreign_key_violation("reviews", "courses"));
    }
    Ok(())
}

#[async_trait]
impl Repository<Review, NewReview, ReviewFilter> for MemoryReviewRepository {
    async fn add(&self, new: &NewReview) -> StorageResult<Review> {
        let mut tables = self.tables.lock();
        check_review(&tables, new)?;
        let id = tables.reviews.insert(new.clone());
        tables.review(id).ok_or_else(|| not_found("reviews", id))
    }

    async fn find_by_id(&self, id: EntityId) -> StorageResult<Option<Review>> {
        Ok(self.tables.lock().review(id))
    }

    async fn update(&self, id: EntityId, new: &NewReview) -> StorageResult<()> {
        let mut tables = self.tables.lock();
        let created_at = tables
            .reviews
            .get(id)
            .map(|existing| existing.created_at)
            .ok_or_else(|| not_found("reviews", id))?;
        check_review(&tables, new)?;

        let row = NewReview {
            created_at,
            ..new.clone()
        };
        tables.reviews.replace(id, row, "reviews")
    }

    async fn delete(&self, id: EntityId) -> StorageResult<()> {
        self.tables.lock().reviews.remove(id, "reviews").map(|_| ())
    }

    async fn find_all(&self) -> StorageResult<Vec<Review>> {
        let tables = self.tables.lock();
        Ok(load_all(&tables, tables.reviews.ids(), Tables::review))
    }

    async fn id_exists(&self, id: EntityId) -> StorageResult<bool> {
        Ok(self.tables.lock().reviews.contains(id))
    }

    async fn find_by_filter(&self, filter: &ReviewFilter) -> StorageResult<PagedResult<Review>> {
        let tables = self.tables.lock();
        let rows = load_all(&tables, tables.reviews.ids(), Tables::review);
        REVIEW.find_paged(rows, filter)
    }
}

#[async_trait]
impl ReviewRepository for MemoryReviewRepository {
    async fn delete_by_course_id(&self, course_id: EntityId) -> StorageResult<u64> {
        let mut tables = self.tables.lock();
        Ok(tables.reviews.retain(|review| review.course_id != course_id))
    }
}

// =============================================================================
// Users
// =============================================================================

pub struct MemoryUserRepository {
    tables: SharedTables,
}

impl MemoryUserRepository {
    pub(crate) fn new(tables: SharedTables) -> Self {
        Self { tables }
    }
}

fn check_user(tables: &Tables, id: Option<EntityId>, new: &NewUser) -> StorageResult<()> {
    let taken = tables
        .users
        .values()
        .any(|(other, row)| Some(other) != id && row.email == new.email);
    if taken {
        return Err(unique_violation("users_email_key"));
    }
    Ok(())
}

#[async_trait]
impl Repository<User, NewUser, UserFilter> for MemoryUserRepository {
    async fn add(&self, new: &NewUser) -> StorageResult<User> {
        let mut tables = self.tables.lock();
        check_user(&tables, None, new)?;
        let id = tables.users.insert(new.clone());
        tables.user(id).ok_or_else(|| not_found("users", id))
    }

    async fn find_by_id(&self, id: EntityId) -> StorageResult<Option<User>> {
        Ok(self.tables.lock().user(id))
    }

    /// `created_at` is left untouched.
    async fn update(&self, id: EntityId, new: &NewUser) -> StorageResult<()> {
        let mut tables = self.tables.lock();
        let created_at = tables
            .users
            .get(id)
            .map(|existing| existing.created_at)
            .ok_or_else(|| not_found("users", id))?;
        check_user(&tables, Some(id), new)?;

        let row = NewUser {
            created_at,
            ..new.clone()
        };
        tables.users.replace(id, row, "users")
    }

    async fn delete(&self, id: EntityId) -> StorageResult<()> {
        let mut tables = self.tables.lock();
        if tables.reviews.values().any(|(_, review)| review.user_id == id) {
            return Err(foreign_key_violation("reviews", "users"));
        }
        tables.users.remove(id, "users").map(|_| ())
    }

    async fn find_all(&self) -> StorageResult<Vec<User>> {
        let tables = self.tables.lock();
        Ok(load_all(&tables, tables.users.ids(), Tables::user))
    }

    async fn id_exists(&self, id: EntityId) -> StorageResult<bool> {
        Ok(self.tables.lock().users.contains(id))
    }

    async fn find_by_filter(&self, filter: &UserFilter) -> StorageResult<PagedResult<User>> {
        let tables = self.tables.lock();
        let rows = load_all(&tables, tables.users.ids(), Tables::user);
        USER.find_paged(rows, filter)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.lock();
        let id = tables
            .users
            .values()
            .find(|(_, row)| row.email == email)
            .map(|(id, _)| id);
        Ok(id.and_then(|id| tables.user(id)))
    }
}
