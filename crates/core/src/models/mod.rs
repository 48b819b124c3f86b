//! Domain models for the catalog.
//!
//! Each entity comes in three shapes:
//!
//! - the loaded entity (`Course`), with references resolved,
//! - a draft (`CourseDraft`), the unvalidated write input where every
//!   field is optional and references are plain ids,
//! - a record (`NewCourse`), the validated state handed to a repository.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier generated by the store.
pub type EntityId = i64;

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryDraft {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
}

// =============================================================================
// Course
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: EntityId,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub category: Category,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub category_id: EntityId,
}

// =============================================================================
// Review
// =============================================================================

/// Author of a review as embedded in review responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    pub id: EntityId,
    pub name: String,
    pub email: String,
}

/// Reviewed course as embedded in review responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedCourse {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: EntityId,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: NaiveDate,
    pub user: ReviewAuthor,
    pub course: ReviewedCourse,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub user_id: Option<EntityId>,
    pub course_id: Option<EntityId>,
}

/// `created_at` is written on insert only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub rating: i32,
    pub comment: Option<String>,
    pub user_id: EntityId,
    pub course_id: EntityId,
    pub created_at: NaiveDate,
}

// =============================================================================
// User
// =============================================================================

/// Role granted to a user, stored in the `user_roles` side table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Standard,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STANDARD" => Ok(Self::Standard),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A registered user. `password` holds the hash and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub created_at: NaiveDate,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `password_hash` must already be hashed; `created_at` is written on insert only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: NaiveDate,
    pub roles: Vec<Role>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_string_roundtrip() {
        for role in [Role::Standard, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("ROOT".parse::<Role>().is_err());
    }

    // Test critique: le hash du mot de passe ne doit jamais sortir en JSON
    #[test]
    fn user_serialization_hides_password() {
        let user = User {
            id: 1,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "$argon2id$secret".into(),
            created_at: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            roles: vec![Role::Standard],
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["createdAt"], "2024-05-01");
        assert_eq!(json["roles"][0], "STANDARD");
    }

    #[test]
    fn course_draft_reads_camel_case_reference() {
        let draft: CourseDraft = serde_json::from_str(
            r#"{"name":"Learn Rust","url":"https://rust-lang.org","categoryId":3}"#,
        )
        .unwrap();
        assert_eq!(draft.category_id, Some(3));
        assert!(draft.description.is_none());
    }
}
