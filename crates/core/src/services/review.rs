use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use super::{CourseService, UserService, not_found_as, required};
use crate::error::{DomainError, DomainResult, EntityKind};
use crate::metrics::record_write;
use crate::models::{EntityId, NewReview, Review, ReviewDraft};
use crate::ports::{PagedResult, Repositories, ReviewFilter};
use crate::validation::validate;

const KIND: EntityKind = EntityKind::Review;

/// Review CRUD. The author and the reviewed course must both exist
/// before anything is written.
pub struct ReviewService<R: ?Sized> {
    repositories: Arc<R>,
    users: UserService<R>,
    courses: CourseService<R>,
}

impl<R: ?Sized> Clone for ReviewService<R> {
    fn clone(&self) -> Self {
        Self {
            repositories: Arc::clone(&self.repositories),
            users: self.users.clone(),
            courses: self.courses.clone(),
        }
    }
}

impl<R: Repositories + ?Sized> ReviewService<R> {
    pub fn new(repositories: Arc<R>, users: UserService<R>, courses: CourseService<R>) -> Self {
        Self {
            repositories,
            users,
            courses,
        }
    }

    #[instrument(skip_all)]
    pub async fn add(&self, draft: &ReviewDraft) -> DomainResult<Review> {
        validate(draft)?;
        let record = self.resolve(draft).await?;

        let review = self.repositories.reviews().add(&record).await?;
        record_write(KIND.as_str(), "add");
        debug!(id = review.id, course = record.course_id, "Review added");
        Ok(review)
    }

    /// Overwrite rating, comment and references. `created_at` is kept.
    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: EntityId, draft: &ReviewDraft) -> DomainResult<()> {
        validate(draft)?;
        if !self.repositories.reviews().id_exists(id).await? {
            return Err(DomainError::NotFound(KIND));
        }
        let record = self.resolve(draft).await?;

        self.repositories
            .reviews()
            .update(id, &record)
            .await
            .map_err(not_found_as(KIND))?;
        record_write(KIND.as_str(), "update");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<Review> {
        self.repositories
            .reviews()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound(KIND))
    }

    pub async fn find_all(&self) -> DomainResult<Vec<Review>> {
        Ok(self.repositories.reviews().find_all().await?)
    }

    #[instrument(skip_all)]
    pub async fn find_by_filter(&self, filter: &ReviewFilter) -> DomainResult<PagedResult<Review>> {
        let page = self.repositories.reviews().find_by_filter(filter).await?;
        debug!(total = page.total_count, "Reviews found");
        Ok(page)
    }

    /// Remove every review of a course. Returns how many were deleted.
    #[instrument(skip(self))]
    pub async fn delete_by_course_id(&self, course_id: EntityId) -> DomainResult<u64> {
        let deleted = self
            .repositories
            .reviews()
            .delete_by_course_id(course_id)
            .await?;
        debug!(deleted, "Reviews of course deleted");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: EntityId) -> DomainResult<()> {
        if !self.repositories.reviews().id_exists(id).await? {
            return Err(DomainError::NotFound(KIND));
        }
        self.repositories
            .reviews()
            .delete(id)
            .await
            .map_err(not_found_as(KIND))?;
        record_write(KIND.as_str(), "delete");
        Ok(())
    }

    /// Resolve user then course, failing with the kind that is missing.
    async fn resolve(&self, draft: &ReviewDraft) -> DomainResult<NewReview> {
        let user = self.users.find_by_id(required(&draft.user_id, "user")?).await?;
        let course = self
            .courses
            .find_by_id(required(&draft.course_id, "course")?)
            .await?;

        Ok(NewReview {
            rating: required(&draft.rating, "rating")?,
            comment: draft.comment.clone(),
            user_id: user.id,
            course_id: course.id,
            created_at: Utc::now().date_naive(),
        })
    }
}
