//! Review repository implementation for PostgreSQL.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::debug;

use syllabus_core::error::{StorageError, StorageResult};
use syllabus_core::models::{EntityId, NewReview, Review, ReviewAuthor, ReviewedCourse};
use syllabus_core::ports::{PagedResult, Repository, ReviewFilter, ReviewRepository};

use super::helpers::{expect_affected, map_sqlx_error};
use super::query_engine::{PgEntity, QueryEngine};

pub(super) static REVIEW: PgEntity = PgEntity {
    name: "review",
    table: "reviews",
    from: "reviews e \
           JOIN users u ON u.id = e.user_id \
           JOIN courses c ON c.id = e.course_id",
    columns: "e.id, e.rating, e.comment, e.created_at, \
              e.user_id, u.name AS user_name, u.email AS user_email, \
              e.course_id, c.name AS course_name",
    fields: &[
        ("id", "e.id"),
        ("rating", "e.rating"),
        ("comment", "e.comment"),
        ("createdAt", "e.created_at"),
        ("user.id", "e.user_id"),
        ("user.name", "u.name"),
        ("course.id", "e.course_id"),
        ("course.name", "c.name"),
    ],
};

// =============================================================================
// Repository Implementation
// =============================================================================

/// PostgreSQL implementation of ReviewRepository.
pub struct PgReviewRepository {
    engine: QueryEngine,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            engine: QueryEngine::new(pool, &REVIEW),
        }
    }
}

#[async_trait]
impl Repository<Review, NewReview, ReviewFilter> for PgReviewRepository {
    async fn add(&self, new: &NewReview) -> StorageResult<Review> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO reviews (rating, comment, created_at, user_id, course_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(new.rating)
        .bind(&new.comment)
        .bind(new.created_at)
        .bind(new.user_id)
        .bind(new.course_id)
        .fetch_one(self.engine.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("reviews id={id}")))
    }

    async fn find_by_id(&self, id: EntityId) -> StorageResult<Option<Review>> {
        let row = self.engine.find_by_id::<ReviewRow>(id).await?;
        Ok(row.map(ReviewRow::into_review))
    }

    /// `created_at` is left untouched.
    async fn update(&self, id: EntityId, new: &NewReview) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE reviews
            SET rating = $1, comment = $2, user_id = $3, course_id = $4
            WHERE id = $5
            "#,
        )
        .bind(new.rating)
        .bind(&new.comment)
        .bind(new.user_id)
        .bind(new.course_id)
        .bind(id)
        .execute(self.engine.pool())
        .await
        .map_err(map_sqlx_error)?;

        expect_affected(result.rows_affected(), REVIEW.table, id)
    }

    async fn delete(&self, id: EntityId) -> StorageResult<()> {
        self.engine.delete_by_id(id).await
    }

    async fn find_all(&self) -> StorageResult<Vec<Review>> {
        let rows = self.engine.find_all::<ReviewRow>().await?;
        Ok(rows.into_iter().map(ReviewRow::into_review).collect())
    }

    async fn id_exists(&self, id: EntityId) -> StorageResult<bool> {
        self.engine.id_exists(id).await
    }

    async fn find_by_filter(&self, filter: &ReviewFilter) -> StorageResult<PagedResult<Review>> {
        let page = self.engine.find_paged::<ReviewRow, _>(filter).await?;
        Ok(page.map(ReviewRow::into_review))
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn delete_by_course_id(&self, course_id: EntityId) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM reviews WHERE course_id = $1")
            .bind(course_id)
            .execute(self.engine.pool())
            .await
            .map_err(map_sqlx_error)?;

        debug!(course_id, deleted = result.rows_affected(), "Deleted reviews of course");
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    rating: i32,
    comment: Option<String>,
    created_at: NaiveDate,
    user_id: i64,
    user_name: String,
    user_email: String,
    course_id: i64,
    course_name: String,
}

impl ReviewRow {
    fn into_review(self) -> Review {
        Review {
            id: self.id,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
            user: ReviewAuthor {
                id: self.user_id,
                name: self.user_name,
                email: self.user_email,
            },
            course: ReviewedCourse {
                id: self.course_id,
                name: self.course_name,
            },
        }
    }
}
