use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::{CategoryService, not_found_as, required};
use crate::error::{DomainError, DomainResult, EntityKind};
use crate::metrics::record_write;
use crate::models::{Category, Course, CourseDraft, EntityId, NewCourse};
use crate::ports::{CourseFilter, PagedResult, Repositories};
use crate::validation::validate;

const KIND: EntityKind = EntityKind::Course;

/// Course CRUD. Resolves the category reference before any write and
/// removes a course together with its reviews.
pub struct CourseService<R: ?Sized> {
    repositories: Arc<R>,
    categories: CategoryService<R>,
}

impl<R: ?Sized> Clone for CourseService<R> {
    fn clone(&self) -> Self {
        Self {
            repositories: Arc::clone(&self.repositories),
            categories: self.categories.clone(),
        }
    }
}

impl<R: Repositories + ?Sized> CourseService<R> {
    pub fn new(repositories: Arc<R>, categories: CategoryService<R>) -> Self {
        Self {
            repositories,
            categories,
        }
    }

    #[instrument(skip_all)]
    pub async fn add(&self, draft: &CourseDraft) -> DomainResult<Course> {
        validate(draft)?;
        let category = self.resolve_category(draft).await?;
        let record = Self::record(draft, &category)?;

        let course = self.repositories.courses().add(&record).await?;
        record_write(KIND.as_str(), "add");
        debug!(id = course.id, category = category.id, "Course added");
        Ok(course)
    }

    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: EntityId, draft: &CourseDraft) -> DomainResult<()> {
        validate(draft)?;
        if !self.repositories.courses().id_exists(id).await? {
            return Err(DomainError::NotFound(KIND));
        }
        let category = self.resolve_category(draft).await?;
        let record = Self::record(draft, &category)?;

        self.repositories
            .courses()
            .update(id, &record)
            .await
            .map_err(not_found_as(KIND))?;
        record_write(KIND.as_str(), "update");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<Course> {
        self.repositories
            .courses()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound(KIND))
    }

    pub async fn find_all(&self) -> DomainResult<Vec<Course>> {
        Ok(self.repositories.courses().find_all().await?)
    }

    #[instrument(skip_all)]
    pub async fn find_by_filter(&self, filter: &CourseFilter) -> DomainResult<PagedResult<Course>> {
        let page = self.repositories.courses().find_by_filter(filter).await?;
        debug!(total = page.total_count, "Courses found");
        Ok(page)
    }

    /// Delete the course and every review of it, all or nothing.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: EntityId) -> DomainResult<()> {
        if !self.repositories.courses().id_exists(id).await? {
            return Err(DomainError::NotFound(KIND));
        }
        let reviews = self
            .repositories
            .delete_course_cascade(id)
            .await
            .map_err(not_found_as(KIND))?;
        record_write(KIND.as_str(), "delete");
        info!(reviews, "🗑️  Course deleted with its reviews");
        Ok(())
    }

    async fn resolve_category(&self, draft: &CourseDraft) -> DomainResult<Category> {
        let category_id = required(&draft.category_id, "category")?;
        self.categories.find_by_id(category_id).await
    }

    fn record(draft: &CourseDraft, category: &Category) -> DomainResult<NewCourse> {
        Ok(NewCourse {
            name: required(&draft.name, "name")?,
            url: required(&draft.url, "url")?,
            description: draft.description.clone(),
            category_id: category.id,
        })
    }
}
