//! Course repository implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use syllabus_core::error::{StorageError, StorageResult};
use syllabus_core::models::{Category, Course, EntityId, NewCourse};
use syllabus_core::ports::{CourseFilter, CourseRepository, PagedResult, Repository};

use super::helpers::{expect_affected, map_sqlx_error};
use super::query_engine::{PgEntity, QueryEngine};

pub(super) static COURSE: PgEntity = PgEntity {
    name: "course",
    table: "courses",
    from: "courses e JOIN categories c ON c.id = e.category_id",
    columns: "e.id, e.name, e.url, e.description, e.category_id, c.name AS category_name",
    fields: &[
        ("id", "e.id"),
        ("name", "e.name"),
        ("url", "e.url"),
        ("description", "e.description"),
        ("category.id", "e.category_id"),
        ("category.name", "c.name"),
    ],
};

// =============================================================================
// Repository Implementation
// =============================================================================

/// PostgreSQL implementation of CourseRepository.
pub struct PgCourseRepository {
    engine: QueryEngine,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            engine: QueryEngine::new(pool, &COURSE),
        }
    }
}

#[async_trait]
impl Repository<Course, NewCourse, CourseFilter> for PgCourseRepository {
    async fn add(&self, new: &NewCourse) -> StorageResult<Course> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO courses (name, url, description, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&new.name)
        .bind(&new.url)
        .bind(&new.description)
        .bind(new.category_id)
        .fetch_one(self.engine.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("courses id={id}")))
    }

    async fn find_by_id(&self, id: EntityId) -> StorageResult<Option<Course>> {
        let row = self.engine.find_by_id::<CourseRow>(id).await?;
        Ok(row.map(CourseRow::into_course))
    }

    async fn update(&self, id: EntityId, new: &NewCourse) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET name = $1, url = $2, description = $3, category_id = $4
            WHERE id = $5
            "#,
        )
        .bind(&new.name)
        .bind(&new.url)
        .bind(&new.description)
        .bind(new.category_id)
        .bind(id)
        .execute(self.engine.pool())
        .await
        .map_err(map_sqlx_error)?;

        expect_affected(result.rows_affected(), COURSE.table, id)
    }

    async fn delete(&self, id: EntityId) -> StorageResult<()> {
        self.engine.delete_by_id(id).await
    }

    async fn find_all(&self) -> StorageResult<Vec<Course>> {
        let rows = self.engine.find_all::<CourseRow>().await?;
        Ok(rows.into_iter().map(CourseRow::into_course).collect())
    }

    async fn id_exists(&self, id: EntityId) -> StorageResult<bool> {
        self.engine.id_exists(id).await
    }

    async fn find_by_filter(&self, filter: &CourseFilter) -> StorageResult<PagedResult<Course>> {
        let page = self.engine.find_paged::<CourseRow, _>(filter).await?;
        Ok(page.map(CourseRow::into_course))
    }
}

impl CourseRepository for PgCourseRepository {}

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: i64,
    name: String,
    url: String,
    description: Option<String>,
    category_id: i64,
    category_name: String,
}

impl CourseRow {
    fn into_course(self) -> Course {
        Course {
            id: self.id,
            name: self.name,
            url: self.url,
            description: self.description,
            category: Category {
                id: self.category_id,
                name: self.category_name,
            },
        }
    }
}
