//! PostgreSQL storage adapter.
//!
//! This module implements the repository traits defined in `syllabus-core`
//! using PostgreSQL as the backing store.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool and migrations
//! - [`QueryEngine`] / [`PgEntity`] - Paged, filtered queries shared by all repos
//! - [`PgRepositories`] - Composite repository implementing `Repositories` trait
//! - Individual repos: `PgCategoryRepository`, `PgCourseRepository`, etc.
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_api(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let repositories = PgRepositories::new(Arc::new(db));
//! ```

mod category_repo;
mod course_repo;
mod database;
mod helpers;
mod query_engine;
mod review_repo;
mod user_repo;

pub use category_repo::PgCategoryRepository;
pub use course_repo::PgCourseRepository;
pub use database::{Database, DatabaseConfig};
pub use query_engine::{PgEntity, QueryEngine};
pub use review_repo::PgReviewRepository;
pub use user_repo::PgUserRepository;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use syllabus_core::error::StorageResult;
use syllabus_core::models::EntityId;
use syllabus_core::ports::{
    CategoryRepository, CourseRepository, Repositories, ReviewRepository, UserRepository,
};

use helpers::{expect_affected, map_sqlx_error, map_tx_error};

// =============================================================================
// Composite Repository
// =============================================================================

/// Aggregated PostgreSQL repositories implementing the `Repositories` trait.
///
/// This provides a single entry point for all storage operations and
/// implements atomic transactions that span multiple tables.
pub struct PgRepositories {
    db: Arc<Database>,
    categories: PgCategoryRepository,
    courses: PgCourseRepository,
    reviews: PgReviewRepository,
    users: PgUserRepository,
}

impl PgRepositories {
    /// Create a new repository aggregate from a database connection.
    pub fn new(db: Arc<Database>) -> Self {
        let pool = db.pool().clone();
        Self {
            categories: PgCategoryRepository::new(pool.clone()),
            courses: PgCourseRepository::new(pool.clone()),
            reviews: PgReviewRepository::new(pool.clone()),
            users: PgUserRepository::new(pool),
            db,
        }
    }
}

#[async_trait]
impl Repositories for PgRepositories {
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

    #[instrument(skip(self))]
    async fn delete_course_cascade(&self, course_id: EntityId) -> StorageResult<u64> {
        let mut tx = self.db.pool().begin().await.map_err(map_tx_error)?;

        // Delete reviews first (child data)
        let reviews = sqlx::query("DELETE FROM reviews WHERE course_id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        // Delete course; no row means nothing is committed
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected(), "courses", course_id)?;

        tx.commit().await.map_err(map_tx_error)?;

        debug!(reviews, "Course cascade committed");
        Ok(reviews)
    }
}
