//! In-memory evaluation of filter clauses.
//!
//! Mirrors the PostgreSQL engine: the same field whitelist rules, the same
//! predicate semantics, the `id` tie-break, and a count taken from the very
//! set the page is cut from.

use std::cmp::Ordering;

use chrono::NaiveDate;

use syllabus_core::error::{StorageError, StorageResult};
use syllabus_core::models::{Category, Course, EntityId, Review, User};
use syllabus_core::ports::{
    EntityFilter, Operator, PagedResult, Predicate, QueryValue, SortDirection, SortOrder,
};

/// A comparable field value read from a loaded entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Date(NaiveDate),
}

/// Entities that can be filtered and sorted by field path.
pub trait Queryable {
    fn id(&self) -> EntityId;

    /// Value at a field path such as `name` or `category.id`.
    /// `None` for an absent optional value or an unknown path.
    fn field(&self, path: &str) -> Option<FieldValue>;
}

/// Entity name plus the field paths that may be filtered or sorted on.
#[derive(Debug)]
pub struct MemoryEntity {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

pub(crate) static CATEGORY: MemoryEntity = MemoryEntity {
    name: "category",
    fields: &["id", "name"],
};

pub(crate) static COURSE: MemoryEntity = MemoryEntity {
    name: "course",
    fields: &["id", "name", "url", "description", "category.id", "category.name"],
};

pub(crate) static REVIEW: MemoryEntity = MemoryEntity {
    name: "review",
    fields: &[
        "id",
        "rating",
        "comment",
        "createdAt",
        "user.id",
        "user.name",
        "course.id",
        "course.name",
    ],
};

pub(crate) static USER: MemoryEntity = MemoryEntity {
    name: "user",
    fields: &["id", "name", "email", "createdAt"],
};

impl MemoryEntity {
    fn check_field(&self, field: &str) -> StorageResult<()> {
        if self.fields.contains(&field) {
            Ok(())
        } else {
            Err(StorageError::InvalidQuery(format!(
                "unknown field '{field}' for {}",
                self.name
            )))
        }
    }

    /// Filter, count, sort and window `rows` as described by `filter`.
    pub fn find_paged<T, F>(
        &self,
        rows: impl IntoIterator<Item = T>,
        filter: &F,
    ) -> StorageResult<PagedResult<T>>
    where
        T: Queryable,
        F: EntityFilter,
    {
        let clause = filter.clause();
        let bound = clause.bound()?;
        for (predicate, value) in &bound {
            self.check_field(predicate.field)?;
            if predicate.operator == Operator::ContainsIgnoreCase
                && !matches!(value, QueryValue::Text(_))
            {
                return Err(StorageError::InvalidQuery(format!(
                    "'{}' needs a text value for a contains match",
                    predicate.field
                )));
            }
        }

        let order = SortOrder::resolve(filter.pagination(), F::DEFAULT_SORT);
        self.check_field(order.field)?;

        let mut matching: Vec<T> = rows
            .into_iter()
            .filter(|row| matches_all(row, &bound))
            .collect();
        let total_count = matching.len() as u64;

        matching.sort_by(|a, b| compare(a, b, order));

        let rows = match filter.pagination() {
            Some(pagination) => matching
                .into_iter()
                .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
                .take(pagination.limit() as usize)
                .collect(),
            None => matching,
        };

        Ok(PagedResult::new(total_count, rows))
    }
}

fn matches_all<T: Queryable>(row: &T, bound: &[(&Predicate, &QueryValue)]) -> bool {
    bound.iter().all(|(predicate, value)| {
        match (predicate.operator, row.field(predicate.field), value) {
            (Operator::Eq, Some(FieldValue::Int(actual)), QueryValue::Int(expected)) => {
                actual == *expected
            }
            (Operator::Eq, Some(FieldValue::Text(actual)), QueryValue::Text(expected)) => {
                actual == *expected
            }
            (
                Operator::ContainsIgnoreCase,
                Some(FieldValue::Text(actual)),
                QueryValue::Text(needle),
            ) => actual.to_uppercase().contains(&needle.to_uppercase()),
            _ => false,
        }
    })
}

/// Primary key in the requested direction, absent values last when
/// ascending, then `id` ascending unless the primary key is `id`.
fn compare<T: Queryable>(a: &T, b: &T, order: SortOrder<'_>) -> Ordering {
    let primary = match (a.field(order.field), b.field(order.field)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    };
    let primary = match order.direction {
        SortDirection::Ascending => primary,
        SortDirection::Descending => primary.reverse(),
    };

    if order.needs_tie_break() {
        primary.then_with(|| a.id().cmp(&b.id()))
    } else {
        primary
    }
}

// =============================================================================
// Queryable Implementations
// =============================================================================

impl Queryable for Category {
    fn id(&self) -> EntityId {
        self.id
    }

    fn field(&self, path: &str) -> Option<FieldValue> {
        match path {
            "id" => Some(FieldValue::Int(self.id)),
            "name" => Some(FieldValue::Text(self.name.clone())),
            _ => None,
        }
    }
}

impl Queryable for Course {
    fn id(&self) -> EntityId {
        self.id
    }

    fn field(&self, path: &str) -> Option<FieldValue> {
        match path {
            "id" => Some(FieldValue::Int(self.id)),
            "name" => Some(FieldValue::Text(self.name.clone())),
            "url" => Some(FieldValue::Text(self.url.clone())),
            "description" => self.description.clone().map(FieldValue::Text),
            "category.id" => Some(FieldValue::Int(self.category.id)),
            "category.name" => Some(FieldValue::Text(self.category.name.clone())),
            _ => None,
        }
    }
}

impl Queryable for Review {
    fn id(&self) -> EntityId {
        self.id
    }

    fn field(&self, path: &str) -> Option<FieldValue> {
        match path {
            "id" => Some(FieldValue::Int(self.id)),
            "rating" => Some(FieldValue::Int(i64::from(self.rating))),
            "comment" => self.comment.clone().map(FieldValue::Text),
            "createdAt" => Some(FieldValue::Date(self.created_at)),
            "user.id" => Some(FieldValue::Int(self.user.id)),
            "user.name" => Some(FieldValue::Text(self.user.name.clone())),
            "course.id" => Some(FieldValue::Int(self.course.id)),
            "course.name" => Some(FieldValue::Text(self.course.name.clone())),
            _ => None,
        }
    }
}

impl Queryable for User {
    fn id(&self) -> EntityId {
        self.id
    }

    fn field(&self, path: &str) -> Option<FieldValue> {
        match path {
            "id" => Some(FieldValue::Int(self.id)),
            "name" => Some(FieldValue::Text(self.name.clone())),
            "email" => Some(FieldValue::Text(self.email.clone())),
            "createdAt" => Some(FieldValue::Date(self.created_at)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use syllabus_core::ports::{CategoryFilter, PaginationData};

    fn categories(names: &[&str]) -> Vec<Category> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Category {
                id: i as i64 + 1,
                name: (*name).to_string(),
            })
            .collect()
    }

    fn page(offset: u64, limit: u32) -> Option<PaginationData> {
        Some(PaginationData::new(offset, NonZeroU32::new(limit).unwrap()))
    }

    #[test]
    fn test_contains_ignores_case() {
        let filter = CategoryFilter {
            name: Some("AR".into()),
            ..Default::default()
        };
        let result = CATEGORY
            .find_paged(categories(&["Architecture", "Chess", "Guitar"]), &filter)
            .unwrap();

        assert_eq!(result.total_count, 2);
        let names: Vec<_> = result.rows.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Architecture", "Guitar"]);
    }

    // Test critique: le total ignore la fenêtre de pagination
    #[test]
    fn test_total_counts_whole_filtered_set() {
        let filter = CategoryFilter {
            pagination: page(1, 1),
            ..Default::default()
        };
        let result = CATEGORY
            .find_paged(categories(&["B", "A", "C"]), &filter)
            .unwrap();

        assert_eq!(result.total_count, 3);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].name, "B");
    }

    #[test]
    fn test_ties_are_broken_by_id() {
        let rows = vec![
            Category { id: 3, name: "Same".into() },
            Category { id: 1, name: "Same".into() },
            Category { id: 2, name: "Same".into() },
        ];
        let result = CATEGORY.find_paged(rows, &CategoryFilter::default()).unwrap();
        let ids: Vec<_> = result.rows.iter().map(|c| c.id).collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn test_descending_sort() {
        let filter = CategoryFilter {
            pagination: page(0, 10).map(|p| p.sorted_by("id", SortDirection::Descending)),
            ..Default::default()
        };
        let result = CATEGORY
            .find_paged(categories(&["A", "B", "C"]), &filter)
            .unwrap();
        let ids: Vec<_> = result.rows.iter().map(|c| c.id).collect();
        assert_eq!(ids, [3, 2, 1]);
    }

    #[test]
    fn test_unknown_sort_field_is_rejected() {
        let filter = CategoryFilter {
            pagination: page(0, 10).map(|p| p.sorted_by("secret", SortDirection::Ascending)),
            ..Default::default()
        };
        let err = CATEGORY
            .find_paged(categories(&["A"]), &filter)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidQuery(_)));
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let filter = CategoryFilter {
            pagination: page(50, 10),
            ..Default::default()
        };
        let result = CATEGORY
            .find_paged(categories(&["A", "B"]), &filter)
            .unwrap();
        assert_eq!(result.total_count, 2);
        assert!(result.rows.is_empty());
    }
}
