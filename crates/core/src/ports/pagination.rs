//! Pagination types for list queries.
//!
//! These types implement offset/limit pagination with a single sort key.
//! They carry no knowledge of any entity; the default sort order is supplied
//! by whoever executes the query.

use std::num::NonZeroU32;

/// Ordering direction for sorted queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (smallest first).
    #[default]
    Ascending,
    /// Descending order (largest first).
    Descending,
}

impl SortDirection {
    /// SQL keyword for this direction.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Which page, how big, sorted by what, in which direction.
///
/// `limit` is always positive; `direction` is carried even when no
/// `sort_field` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationData {
    offset: u64,
    limit: NonZeroU32,
    sort_field: Option<String>,
    direction: SortDirection,
}

impl PaginationData {
    /// Window starting at `offset` holding at most `limit` rows.
    pub fn new(offset: u64, limit: NonZeroU32) -> Self {
        Self {
            offset,
            limit,
            sort_field: None,
            direction: SortDirection::default(),
        }
    }

    /// Window for the zero-based `page` of `per_page` rows.
    pub fn page(page: u64, per_page: NonZeroU32) -> Self {
        Self::new(page.saturating_mul(u64::from(per_page.get())), per_page)
    }

    /// Sort the window by `field` in `direction`.
    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = Some(field.into());
        self.direction = direction;
        self
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit.get()
    }

    pub fn sort_field(&self) -> Option<&str> {
        self.sort_field.as_deref()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == SortDirection::Ascending
    }
}

/// A resolved sort key: field path plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder<'a> {
    pub field: &'a str,
    pub direction: SortDirection,
}

impl<'a> SortOrder<'a> {
    pub const fn asc(field: &'a str) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub const fn desc(field: &'a str) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    /// The requested sort if the pagination names a field, else `default`.
    pub fn resolve(pagination: Option<&'a PaginationData>, default: SortOrder<'a>) -> Self {
        match pagination.and_then(|p| p.sort_field().map(|field| (field, p.direction()))) {
            Some((field, direction)) => Self { field, direction },
            None => default,
        }
    }

    /// Whether `id ASC` must be appended to make the order total.
    pub fn needs_tie_break(&self) -> bool {
        self.field != "id"
    }
}

/// Total matching count plus the rows of the current page.
///
/// `total_count` is the size of the whole filtered set, independent of
/// the pagination window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedResult<T> {
    pub total_count: u64,
    pub rows: Vec<T>,
}

impl<T> PagedResult<T> {
    pub fn new(total_count: u64, rows: Vec<T>) -> Self {
        Self { total_count, rows }
    }

    /// Row at `index` within the page, if any.
    pub fn row(&self, index: usize) -> Option<&T> {
        self.rows.get(index)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            total_count: self.total_count,
            rows: self.rows.into_iter().map(f).collect(),
        }
    }

    /// Like [`PagedResult::map`] but with a fallible conversion.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<PagedResult<U>, E> {
        Ok(PagedResult {
            total_count: self.total_count,
            rows: self.rows.into_iter().map(f).collect::<Result<Vec<_>, E>>()?,
        })
    }
}
