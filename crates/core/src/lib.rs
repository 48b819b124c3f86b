//! Core domain layer for the Syllabus catalog backend.
//!
//! This crate contains the domain models, port traits (interfaces),
//! validation rules and services for categories, courses, reviews and
//! users. It follows hexagonal architecture principles - this is the
//! innermost layer with no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     syllabus (binary)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                syllabus-api (REST, axum)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    syllabus-storage                         │
//! │               (PostgreSQL, in-memory)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   syllabus-core  ← YOU ARE HERE             │
//! │        (models, ports, validation, services)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Category, Course, Review, User) and their drafts
//! - [`ports`] - Pagination, filters, predicate model and repository traits
//! - [`validation`] - Field constraints checked before every write
//! - [`password`] - Argon2id hashing
//! - [`services`] - One service per entity
//! - [`error`] - Domain and storage error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Paged queries
//!
//! A filter ([`ports::CourseFilter`], ...) turns its present fields into a
//! [`ports::FilterClause`]. Storage adapters derive both the row query and
//! the count query from that one clause, so `total_count` always describes
//! the set the rows were taken from.

pub mod error;
pub mod metrics;
pub mod models;
pub mod password;
pub mod ports;
pub mod services;
pub mod validation;
