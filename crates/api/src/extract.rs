//! Filters extracted from list URLs.
//!
//! Query parameters: `page` (default 0), `per_page` (default 10), `sort`
//! (`+field` ascending, `-field` descending, bare field ascending) and the
//! entity parameters `name`, `categoryId`, `user_id`, `course_id`.

use std::num::NonZeroU32;

use serde::Deserialize;

use syllabus_core::error::EntityKind;
use syllabus_core::models::EntityId;
use syllabus_core::ports::{
    CategoryFilter, CourseFilter, PaginationData, ReviewFilter, SortDirection, UserFilter,
};

use crate::error::ApiError;

const DEFAULT_PAGE: u64 = 0;
const DEFAULT_PER_PAGE: NonZeroU32 = NonZeroU32::new(10).unwrap();

/// Raw list parameters. Numbers stay text until a resource parses them,
/// so a bad value is reported in the resource's error format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sort: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "categoryId")]
    pub category_id: Option<String>,
    pub user_id: Option<String>,
    pub course_id: Option<String>,
}

impl ListParams {
    pub fn category_filter(&self) -> Result<CategoryFilter, ApiError> {
        let kind = EntityKind::Category;
        Ok(CategoryFilter {
            pagination: Some(self.pagination(kind, "name")?),
            name: self.name.clone(),
        })
    }

    pub fn course_filter(&self) -> Result<CourseFilter, ApiError> {
        let kind = EntityKind::Course;
        Ok(CourseFilter {
            pagination: Some(self.pagination(kind, "name")?),
            name: self.name.clone(),
            category_id: parse_id(kind, "categoryId", self.category_id.as_deref())?,
        })
    }

    pub fn review_filter(&self) -> Result<ReviewFilter, ApiError> {
        let kind = EntityKind::Review;
        Ok(ReviewFilter {
            pagination: Some(self.pagination(kind, "id")?),
            user_id: parse_id(kind, "user_id", self.user_id.as_deref())?,
            course_id: parse_id(kind, "course_id", self.course_id.as_deref())?,
        })
    }

    pub fn user_filter(&self) -> Result<UserFilter, ApiError> {
        let kind = EntityKind::User;
        Ok(UserFilter {
            pagination: Some(self.pagination(kind, "id")?),
            name: self.name.clone(),
        })
    }

    fn pagination(&self, kind: EntityKind, default_sort: &str) -> Result<PaginationData, ApiError> {
        let page = match self.page.as_deref() {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ApiError::bad_request(kind, "page", format!("'{raw}' is not a page number")))?,
            None => DEFAULT_PAGE,
        };

        let per_page = match self.per_page.as_deref() {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or_else(|| {
                    ApiError::bad_request(kind, "per_page", format!("'{raw}' is not a positive page size"))
                })?,
            None => DEFAULT_PER_PAGE,
        };

        let (field, direction) = parse_sort(self.sort.as_deref().unwrap_or(default_sort));
        if field.is_empty() {
            return Err(ApiError::bad_request(kind, "sort", "sort field is empty"));
        }

        Ok(PaginationData::page(page, per_page).sorted_by(field, direction))
    }
}

/// Split a sort parameter into field and direction.
///
/// An unencoded `+` reaches us form-decoded as a space.
fn parse_sort(raw: &str) -> (&str, SortDirection) {
    if let Some(field) = raw.strip_prefix('+').or_else(|| raw.strip_prefix(' ')) {
        (field, SortDirection::Ascending)
    } else if let Some(field) = raw.strip_prefix('-') {
        (field, SortDirection::Descending)
    } else {
        (raw, SortDirection::Ascending)
    }
}

fn parse_id(kind: EntityKind, param: &str, raw: Option<&str>) -> Result<Option<EntityId>, ApiError> {
    raw.map(|raw| {
        raw.parse::<EntityId>()
            .map_err(|_| ApiError::bad_request(kind, param, format!("'{raw}' is not an id")))
    })
    .transpose()
}
