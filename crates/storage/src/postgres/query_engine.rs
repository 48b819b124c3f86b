//! Generic paged query engine for PostgreSQL.
//!
//! Each entity repository owns a [`QueryEngine`] configured with a static
//! [`PgEntity`] descriptor. The engine turns a [`FilterClause`] into SQL:
//!
//! - the row query and the count query share [`PgEntity::push_where`],
//!   so `total_count` always counts the set the page was cut from;
//! - field paths (`name`, `category.id`, ...) are resolved through the
//!   descriptor's field map, never spliced from user input;
//! - every value is bound as a parameter (`$1`, `$2`, ...).

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use syllabus_core::error::{StorageError, StorageResult};
use syllabus_core::metrics::{QueryTimer, record_query};
use syllabus_core::models::EntityId;
use syllabus_core::ports::{
    EntityFilter, FilterClause, Operator, PagedResult, PaginationData, QueryValue, SortOrder,
    escape_like,
};

use super::helpers::{expect_affected, map_sqlx_error};

/// Always-true base predicate so that an empty clause still renders `WHERE`.
const BASE_PREDICATE: &str = " WHERE e.id IS NOT NULL";

// =============================================================================
// Entity Descriptor
// =============================================================================

/// Static description of how an entity is stored.
///
/// The main table is always aliased `e`; joined tables use their own
/// aliases inside `from`.
#[derive(Debug)]
pub struct PgEntity {
    /// Entity name, used in logs, metrics and error messages.
    pub name: &'static str,
    /// Main table, target of deletes and existence checks.
    pub table: &'static str,
    /// `FROM` source including joins.
    pub from: &'static str,
    /// Selected columns, matching the entity's row type.
    pub columns: &'static str,
    /// Public field path to SQL column. Doubles as the sort whitelist.
    pub fields: &'static [(&'static str, &'static str)],
}

impl PgEntity {
    /// SQL column for a public field path.
    pub fn column(&self, field: &str) -> StorageResult<&'static str> {
        self.fields
            .iter()
            .find(|(path, _)| *path == field)
            .map(|(_, column)| *column)
            .ok_or_else(|| {
                StorageError::InvalidQuery(format!("unknown field '{field}' for {}", self.name))
            })
    }

    /// `SELECT <columns> FROM <from>` without any clause.
    pub fn select_prefix(&self) -> String {
        format!("SELECT {} FROM {}", self.columns, self.from)
    }

    /// Append the base predicate and every clause predicate, ANDed.
    fn push_where(
        &self,
        builder: &mut QueryBuilder<'static, Postgres>,
        clause: &FilterClause,
    ) -> StorageResult<()> {
        builder.push(BASE_PREDICATE);

        for (predicate, value) in clause.bound()? {
            let column = self.column(predicate.field)?;
            builder.push(" AND ");

            match (predicate.operator, value) {
                (Operator::Eq, QueryValue::Int(v)) => {
                    builder.push(column).push(" = ").push_bind(*v);
                }
                (Operator::Eq, QueryValue::Text(v)) => {
                    builder.push(column).push(" = ").push_bind(v.clone());
                }
                (Operator::ContainsIgnoreCase, QueryValue::Text(v)) => {
                    builder
                        .push("UPPER(")
                        .push(column)
                        .push(") LIKE UPPER(")
                        .push_bind(format!("%{}%", escape_like(v)))
                        .push(") ESCAPE '\\'");
                }
                (Operator::ContainsIgnoreCase, QueryValue::Int(_)) => {
                    return Err(StorageError::InvalidQuery(format!(
                        "'{}' needs a text value for a contains match",
                        predicate.field
                    )));
                }
            }
        }

        Ok(())
    }

    /// Row query: predicates, sort, optional window.
    pub fn rows_query(
        &self,
        clause: &FilterClause,
        pagination: Option<&PaginationData>,
        default_sort: SortOrder<'_>,
    ) -> StorageResult<QueryBuilder<'static, Postgres>> {
        let order = SortOrder::resolve(pagination, default_sort);
        let sort_column = self.column(order.field)?;

        let mut builder = QueryBuilder::new(self.select_prefix());
        self.push_where(&mut builder, clause)?;

        builder
            .push(" ORDER BY ")
            .push(sort_column)
            .push(" ")
            .push(order.direction.as_sql());
        if order.needs_tie_break() {
            builder.push(", e.id ASC");
        }

        if let Some(pagination) = pagination {
            let offset = i64::try_from(pagination.offset()).map_err(|_| {
                StorageError::InvalidQuery(format!("offset {} is out of range", pagination.offset()))
            })?;
            builder
                .push(" OFFSET ")
                .push_bind(offset)
                .push(" LIMIT ")
                .push_bind(i64::from(pagination.limit()));
        }

        Ok(builder)
    }

    /// Count query over the same predicates, without sort or window.
    pub fn count_query(&self, clause: &FilterClause) -> StorageResult<QueryBuilder<'static, Postgres>> {
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", self.from));
        self.push_where(&mut builder, clause)?;
        Ok(builder)
    }
}

// =============================================================================
// Query Engine
// =============================================================================

/// Executes the queries described by a [`PgEntity`].
#[derive(Clone)]
pub struct QueryEngine {
    pool: PgPool,
    entity: &'static PgEntity,
}

impl QueryEngine {
    pub fn new(pool: PgPool, entity: &'static PgEntity) -> Self {
        Self { pool, entity }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn entity(&self) -> &'static PgEntity {
        self.entity
    }

    /// Count the filtered set, then fetch the requested page of it.
    #[instrument(skip_all, fields(entity = self.entity.name))]
    pub async fn find_paged<R, F>(&self, filter: &F) -> StorageResult<PagedResult<R>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        F: EntityFilter,
    {
        let _timer = QueryTimer::new(self.entity.name);
        let clause = filter.clause();

        let mut count = self.entity.count_query(&clause)?;
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        record_query(self.entity.name, "count");

        let mut rows = self
            .entity
            .rows_query(&clause, filter.pagination(), F::DEFAULT_SORT)?;
        let rows: Vec<R> = rows
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        record_query(self.entity.name, "paged");

        debug!(total, returned = rows.len(), "Paged query executed");
        Ok(PagedResult::new(u64::try_from(total).unwrap_or_default(), rows))
    }

    pub async fn find_by_id<R>(&self, id: EntityId) -> StorageResult<Option<R>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!("{} WHERE e.id = $1", self.entity.select_prefix());
        let row = sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        record_query(self.entity.name, "by_id");
        Ok(row)
    }

    /// Every row, by id ascending.
    pub async fn find_all<R>(&self) -> StorageResult<Vec<R>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!("{} ORDER BY e.id ASC", self.entity.select_prefix());
        let rows = sqlx::query_as::<_, R>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        record_query(self.entity.name, "all");
        Ok(rows)
    }

    pub async fn id_exists(&self, id: EntityId) -> StorageResult<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = $1 LIMIT 1", self.entity.table);
        let found: Option<i32> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        record_query(self.entity.name, "exists");
        Ok(found.is_some())
    }

    pub async fn delete_by_id(&self, id: EntityId) -> StorageResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.entity.table);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected(), self.entity.table, id)
    }
}
