//! Per-entity filters and their translation into predicates.

use super::pagination::{PaginationData, SortOrder};
use super::query::{FilterClause, Operator};
use crate::models::EntityId;

/// A request-scoped filter: optional predicate fields plus pagination.
pub trait EntityFilter: Send + Sync {
    /// Order applied when the pagination does not name a sort field.
    const DEFAULT_SORT: SortOrder<'static>;

    /// Predicates for every present field, ANDed.
    fn clause(&self) -> FilterClause;

    fn pagination(&self) -> Option<&PaginationData>;
}

/// Filter options for category queries.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub pagination: Option<PaginationData>,
    pub name: Option<String>,
}

impl EntityFilter for CategoryFilter {
    const DEFAULT_SORT: SortOrder<'static> = SortOrder::asc("name");

    fn clause(&self) -> FilterClause {
        FilterClause::new().and_some(
            "name",
            Operator::ContainsIgnoreCase,
            "name",
            self.name.as_deref(),
        )
    }

    fn pagination(&self) -> Option<&PaginationData> {
        self.pagination.as_ref()
    }
}

/// Filter options for course queries.
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub pagination: Option<PaginationData>,
    pub name: Option<String>,
    pub category_id: Option<EntityId>,
}

impl EntityFilter for CourseFilter {
    const DEFAULT_SORT: SortOrder<'static> = SortOrder::asc("name");

    fn clause(&self) -> FilterClause {
        FilterClause::new()
            .and_some(
                "name",
                Operator::ContainsIgnoreCase,
                "name",
                self.name.as_deref(),
            )
            .and_some("category.id", Operator::Eq, "category_id", self.category_id)
    }

    fn pagination(&self) -> Option<&PaginationData> {
        self.pagination.as_ref()
    }
}

/// Filter options for review queries.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub pagination: Option<PaginationData>,
    pub user_id: Option<EntityId>,
    pub course_id: Option<EntityId>,
}

impl EntityFilter for ReviewFilter {
    const DEFAULT_SORT: SortOrder<'static> = SortOrder::desc("rating");

    fn clause(&self) -> FilterClause {
        FilterClause::new()
            .and_some("user.id", Operator::Eq, "user_id", self.user_id)
            .and_some("course.id", Operator::Eq, "course_id", self.course_id)
    }

    fn pagination(&self) -> Option<&PaginationData> {
        self.pagination.as_ref()
    }
}

/// Filter options for user queries.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub pagination: Option<PaginationData>,
    pub name: Option<String>,
}

impl EntityFilter for UserFilter {
    const DEFAULT_SORT: SortOrder<'static> = SortOrder::asc("name");

    fn clause(&self) -> FilterClause {
        FilterClause::new().and_some(
            "name",
            Operator::ContainsIgnoreCase,
            "name",
            self.name.as_deref(),
        )
    }

    fn pagination(&self) -> Option<&PaginationData> {
        self.pagination.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::QueryValue;

    #[test]
    fn test_open_filter_has_no_predicates() {
        assert!(CourseFilter::default().clause().is_open());
        assert!(ReviewFilter::default().clause().is_open());
    }

    #[test]
    fn test_course_filter_combines_fields() {
        let filter = CourseFilter {
            name: Some("Learn".into()),
            category_id: Some(2),
            ..Default::default()
        };
        let clause = filter.clause();

        let fields: Vec<_> = clause.predicates().iter().map(|p| p.field).collect();
        assert_eq!(fields, ["name", "category.id"]);
        assert_eq!(
            clause.parameter("name"),
            Some(&QueryValue::Text("Learn".into()))
        );
    }

    #[test]
    fn test_review_filter_uses_equality() {
        let filter = ReviewFilter {
            course_id: Some(9),
            ..Default::default()
        };
        let clause = filter.clause();
        assert_eq!(clause.predicates()[0].operator, Operator::Eq);
        assert_eq!(clause.predicates()[0].field, "course.id");
    }

    #[test]
    fn test_default_sorts() {
        assert_eq!(ReviewFilter::DEFAULT_SORT, SortOrder::desc("rating"));
        assert_eq!(UserFilter::DEFAULT_SORT, SortOrder::asc("name"));
    }
}
