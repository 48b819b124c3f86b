//! Storage layer for the Syllabus catalog backend.
//!
//! This crate provides implementations of the repository traits defined
//! in `syllabus-core`:
//!
//! - [`postgres`] - PostgreSQL: connection pooling, migrations, the paged
//!   query engine and one repository per entity
//! - [`memory`] - In-memory tables evaluating the same filter clauses,
//!   with the same constraints
//!
//! # Usage
//!
//! ```ignore
//! use syllabus_storage::{Database, DatabaseConfig, PgRepositories};
//!
//! // Connect to the database
//! let config = DatabaseConfig::for_api(&database_url);
//! let db = Database::connect(&config).await?;
//!
//! // Run migrations
//! db.migrate().await?;
//!
//! // Create repositories
//! let repositories = Arc::new(PgRepositories::new(Arc::new(db)));
//! ```

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryRepositories};
pub use postgres::{Database, DatabaseConfig, PgRepositories};
