//! Field validation for write inputs.
//!
//! Drafts implement [`Validate`] and report every violated constraint;
//! services call [`validate`] which surfaces the first one as
//! [`DomainError::FieldInvalid`].

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DomainError, DomainResult};
use crate::models::{CategoryDraft, CourseDraft, EntityId, ReviewDraft, UserDraft};

/// URL shape accepted for course links.
static COURSE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{2,256}\.[a-z]{2,6}\b([-a-zA-Z0-9@:%_+.~#?&/=]*)$",
    )
    .expect("course URL pattern is valid")
});

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Types whose fields carry constraints.
pub trait Validate {
    /// Every violated constraint, in field declaration order.
    fn violations(&self) -> Vec<FieldViolation>;
}

/// Fail with the first violation of `value`, if any.
pub fn validate<T: Validate + ?Sized>(value: &T) -> DomainResult<()> {
    match value.violations().into_iter().next() {
        Some(violation) => Err(DomainError::FieldInvalid {
            field: violation.field.to_string(),
            message: violation.message,
        }),
        None => Ok(()),
    }
}

/// Accumulates violations while checking fields.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    /// Present, with a character count in `min..=max`.
    pub fn required_text(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) -> &mut Self {
        match value {
            None => self.push(field, "may not be null"),
            Some(text) => {
                self.check_length(field, text, min, max);
            }
        }
        self
    }

    /// If present, at most `max` characters.
    pub fn optional_text(&mut self, field: &'static str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(text) = value {
            self.check_length(field, text, 0, max);
        }
        self
    }

    /// Present and within `min..=max`.
    pub fn required_range(
        &mut self,
        field: &'static str,
        value: Option<i64>,
        min: i64,
        max: i64,
    ) -> &mut Self {
        match value {
            None => self.push(field, "may not be null"),
            Some(v) if v < min => {
                self.push(field, format!("must be greater than or equal to {min}"));
            }
            Some(v) if v > max => self.push(field, format!("must be less than or equal to {max}")),
            Some(_) => {}
        }
        self
    }

    /// A reference id that must be present.
    pub fn required_ref(&mut self, field: &'static str, value: Option<EntityId>) -> &mut Self {
        if value.is_none() {
            self.push(field, "may not be null");
        }
        self
    }

    /// If present, must match `pattern` entirely.
    pub fn pattern(&mut self, field: &'static str, value: Option<&str>, pattern: &Regex) -> &mut Self {
        if let Some(text) = value {
            if !pattern.is_match(text) {
                self.push(field, format!("must match \"{}\"", pattern.as_str()));
            }
        }
        self
    }

    fn check_length(&mut self, field: &'static str, text: &str, min: usize, max: usize) {
        let len = text.chars().count();
        if len < min || len > max {
            self.push(field, format!("size must be between {min} and {max}"));
        }
    }

    pub fn into_vec(self) -> Vec<FieldViolation> {
        self.0
    }
}

impl Validate for CategoryDraft {
    fn violations(&self) -> Vec<FieldViolation> {
        let mut v = Violations::default();
        v.required_text("name", self.name.as_deref(), 2, 25);
        v.into_vec()
    }
}

impl Validate for CourseDraft {
    fn violations(&self) -> Vec<FieldViolation> {
        let mut v = Violations::default();
        v.required_text("name", self.name.as_deref(), 2, 25)
            .required_text("url", self.url.as_deref(), 0, 100)
            .pattern("url", self.url.as_deref(), &COURSE_URL)
            .optional_text("description", self.description.as_deref(), 255)
            .required_ref("category", self.category_id);
        v.into_vec()
    }
}

impl Validate for ReviewDraft {
    fn violations(&self) -> Vec<FieldViolation> {
        let mut v = Violations::default();
        v.required_range("rating", self.rating.map(i64::from), 0, 5)
            .optional_text("comment", self.comment.as_deref(), 200)
            .required_ref("user", self.user_id)
            .required_ref("course", self.course_id);
        v.into_vec()
    }
}

impl Validate for UserDraft {
    fn violations(&self) -> Vec<FieldViolation> {
        let mut v = Violations::default();
        v.required_text("name", self.name.as_deref(), 2, 40)
            .required_text("email", self.email.as_deref(), 0, 40);
        if self.password.is_none() {
            v.push("password", "may not be null");
        }
        v.into_vec()
    }
}
