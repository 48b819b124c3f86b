use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use super::{not_found_as, required};
use crate::error::{DomainError, DomainResult, EntityKind};
use crate::metrics::record_write;
use crate::models::{EntityId, NewUser, Role, User, UserDraft};
use crate::password::{hash_password, verify_password};
use crate::ports::{PagedResult, Repositories, UserFilter};
use crate::validation::validate;

const KIND: EntityKind = EntityKind::User;

/// User accounts. Passwords are stored as Argon2id hashes and are only
/// changed through [`UserService::update_password`].
pub struct UserService<R: ?Sized> {
    repositories: Arc<R>,
}

impl<R: ?Sized> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repositories: Arc::clone(&self.repositories),
        }
    }
}

impl<R: Repositories + ?Sized> UserService<R> {
    pub fn new(repositories: Arc<R>) -> Self {
        Self { repositories }
    }

    /// Register a user with the standard role.
    #[instrument(skip_all)]
    pub async fn add(&self, draft: &UserDraft) -> DomainResult<User> {
        validate(draft)?;
        let record = NewUser {
            name: required(&draft.name, "name")?,
            email: required(&draft.email, "email")?,
            password_hash: hash_password(&required(&draft.password, "password")?)?,
            created_at: Utc::now().date_naive(),
            roles: vec![Role::Standard],
        };

        let user = self.repositories.users().add(&record).await?;
        record_write(KIND.as_str(), "add");
        debug!(id = user.id, "User added");
        Ok(user)
    }

    /// Overwrite name and email. Password, roles and creation date are kept.
    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: EntityId, draft: &UserDraft) -> DomainResult<()> {
        let existing = self.find_by_id(id).await?;
        let merged = UserDraft {
            name: draft.name.clone(),
            email: draft.email.clone(),
            password: Some(existing.password.clone()),
        };
        validate(&merged)?;

        let record = NewUser {
            name: required(&merged.name, "name")?,
            email: required(&merged.email, "email")?,
            password_hash: existing.password,
            created_at: existing.created_at,
            roles: existing.roles,
        };
        self.write(id, &record).await?;
        record_write(KIND.as_str(), "update");
        Ok(())
    }

    /// Replace the stored hash with the hash of `password`.
    #[instrument(skip(self, password))]
    pub async fn update_password(&self, id: EntityId, password: &str) -> DomainResult<()> {
        let existing = self.find_by_id(id).await?;
        let record = NewUser {
            name: existing.name,
            email: existing.email,
            password_hash: hash_password(password)?,
            created_at: existing.created_at,
            roles: existing.roles,
        };
        self.write(id, &record).await?;
        record_write(KIND.as_str(), "update_password");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<User> {
        self.repositories
            .users()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound(KIND))
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> DomainResult<User> {
        self.repositories
            .users()
            .find_by_email(email)
            .await?
            .ok_or(DomainError::NotFound(KIND))
    }

    /// The user with this email, if `password` matches its hash.
    ///
    /// An unknown email and a wrong password fail the same way.
    #[instrument(skip(self, password))]
    pub async fn find_by_email_and_password(&self, email: &str, password: &str) -> DomainResult<User> {
        let user = self.find_by_email(email).await?;
        if !verify_password(password, &user.password) {
            warn!("Password mismatch");
            return Err(DomainError::NotFound(KIND));
        }
        Ok(user)
    }

    pub async fn find_all(&self) -> DomainResult<Vec<User>> {
        Ok(self.repositories.users().find_all().await?)
    }

    #[instrument(skip_all)]
    pub async fn find_by_filter(&self, filter: &UserFilter) -> DomainResult<PagedResult<User>> {
        let page = self.repositories.users().find_by_filter(filter).await?;
        debug!(total = page.total_count, "Users found");
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: EntityId) -> DomainResult<()> {
        if !self.repositories.users().id_exists(id).await? {
            return Err(DomainError::NotFound(KIND));
        }
        self.repositories
            .users()
            .delete(id)
            .await
            .map_err(not_found_as(KIND))?;
        record_write(KIND.as_str(), "delete");
        Ok(())
    }

    async fn write(&self, id: EntityId, record: &NewUser) -> DomainResult<()> {
        self.repositories
            .users()
            .update(id, record)
            .await
            .map_err(not_found_as(KIND))
    }
}
