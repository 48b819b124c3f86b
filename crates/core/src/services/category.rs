use std::sync::Arc;

use tracing::{debug, instrument};

use super::{not_found_as, required};
use crate::error::{DomainError, DomainResult, EntityKind};
use crate::metrics::record_write;
use crate::models::{Category, CategoryDraft, EntityId, NewCategory};
use crate::ports::{CategoryFilter, PagedResult, Repositories};
use crate::validation::validate;

const KIND: EntityKind = EntityKind::Category;

/// Category CRUD and filtered lookup.
pub struct CategoryService<R: ?Sized> {
    repositories: Arc<R>,
}

impl<R: ?Sized> Clone for CategoryService<R> {
    fn clone(&self) -> Self {
        Self {
            repositories: Arc::clone(&self.repositories),
        }
    }
}

impl<R: Repositories + ?Sized> CategoryService<R> {
    pub fn new(repositories: Arc<R>) -> Self {
        Self { repositories }
    }

    #[instrument(skip_all)]
    pub async fn add(&self, draft: &CategoryDraft) -> DomainResult<Category> {
        validate(draft)?;
        let record = Self::record(draft)?;

        let category = self.repositories.categories().add(&record).await?;
        record_write(KIND.as_str(), "add");
        debug!(id = category.id, "Category added");
        Ok(category)
    }

    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: EntityId, draft: &CategoryDraft) -> DomainResult<()> {
        validate(draft)?;
        if !self.repositories.categories().id_exists(id).await? {
            return Err(DomainError::NotFound(KIND));
        }
        let record = Self::record(draft)?;

        self.repositories
            .categories()
            .update(id, &record)
            .await
            .map_err(not_found_as(KIND))?;
        record_write(KIND.as_str(), "update");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<Category> {
        self.repositories
            .categories()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound(KIND))
    }

    pub async fn find_all(&self) -> DomainResult<Vec<Category>> {
        Ok(self.repositories.categories().find_all().await?)
    }

    #[instrument(skip_all)]
    pub async fn find_by_filter(&self, filter: &CategoryFilter) -> DomainResult<PagedResult<Category>> {
        let page = self.repositories.categories().find_by_filter(filter).await?;
        debug!(total = page.total_count, "Categories found");
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: EntityId) -> DomainResult<()> {
        if !self.repositories.categories().id_exists(id).await? {
            return Err(DomainError::NotFound(KIND));
        }
        self.repositories
            .categories()
            .delete(id)
            .await
            .map_err(not_found_as(KIND))?;
        record_write(KIND.as_str(), "delete");
        Ok(())
    }

    fn record(draft: &CategoryDraft) -> DomainResult<NewCategory> {
        Ok(NewCategory {
            name: required(&draft.name, "name")?,
        })
    }
}
