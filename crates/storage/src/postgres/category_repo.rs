//! Category repository implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use syllabus_core::error::StorageResult;
use syllabus_core::models::{Category, EntityId, NewCategory};
use syllabus_core::ports::{CategoryFilter, CategoryRepository, PagedResult, Repository};

use super::helpers::{expect_affected, map_sqlx_error};
use super::query_engine::{PgEntity, QueryEngine};

pub(super) static CATEGORY: PgEntity = PgEntity {
    name: "category",
    table: "categories",
    from: "categories e",
    columns: "e.id, e.name",
    fields: &[("id", "e.id"), ("name", "e.name")],
};

// =============================================================================
// Repository Implementation
// =============================================================================

/// PostgreSQL implementation of CategoryRepository.
pub struct PgCategoryRepository {
    engine: QueryEngine,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            engine: QueryEngine::new(pool, &CATEGORY),
        }
    }
}

#[async_trait]
impl Repository<Category, NewCategory, CategoryFilter> for PgCategoryRepository {
    async fn add(&self, new: &NewCategory) -> StorageResult<Category> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&new.name)
        .fetch_one(self.engine.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into_category())
    }

    async fn find_by_id(&self, id: EntityId) -> StorageResult<Option<Category>> {
        let row = self.engine.find_by_id::<CategoryRow>(id).await?;
        Ok(row.map(CategoryRow::into_category))
    }

    async fn update(&self, id: EntityId, new: &NewCategory) -> StorageResult<()> {
        let result = sqlx::query("UPDATE categories SET name = $1 WHERE id = $2")
            .bind(&new.name)
            .bind(id)
            .execute(self.engine.pool())
            .await
            .map_err(map_sqlx_error)?;

        expect_affected(result.rows_affected(), CATEGORY.table, id)
    }

    async fn delete(&self, id: EntityId) -> StorageResult<()> {
        self.engine.delete_by_id(id).await
    }

    async fn find_all(&self) -> StorageResult<Vec<Category>> {
        let rows = self.engine.find_all::<CategoryRow>().await?;
        Ok(rows.into_iter().map(CategoryRow::into_category).collect())
    }

    async fn id_exists(&self, id: EntityId) -> StorageResult<bool> {
        self.engine.id_exists(id).await
    }

    async fn find_by_filter(&self, filter: &CategoryFilter) -> StorageResult<PagedResult<Category>> {
        let page = self.engine.find_paged::<CategoryRow, _>(filter).await?;
        Ok(page.map(CategoryRow::into_category))
    }
}

impl CategoryRepository for PgCategoryRepository {}

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syllabus_core::ports::{EntityFilter, SortOrder};

    #[test]
    fn test_name_filter_sql() {
        let filter = CategoryFilter {
            name: Some("prog".into()),
            ..Default::default()
        };
        let rows = CATEGORY
            .rows_query(&filter.clause(), None, CategoryFilter::DEFAULT_SORT)
            .unwrap();
        assert_eq!(
            rows.sql(),
            "SELECT e.id, e.name FROM categories e WHERE e.id IS NOT NULL \
             AND UPPER(e.name) LIKE UPPER($1) ESCAPE '\\' ORDER BY e.name ASC, e.id ASC"
        );
        assert_eq!(CategoryFilter::DEFAULT_SORT, SortOrder::asc("name"));
    }
}
