//! REST API for the Syllabus catalog backend.
//!
//! Exposes `/categories`, `/courses`, `/reviews` and `/users` over the
//! services of `syllabus-core`. The router is storage agnostic: it takes
//! any [`Repositories`](syllabus_core::ports::Repositories) implementation.
//!
//! ```ignore
//! use syllabus_api::{AppState, ServerConfig, serve_with_shutdown};
//!
//! let state = AppState::new(repositories);
//! serve_with_shutdown(state, ServerConfig::default(), shutdown_signal).await?;
//! ```

mod error;
mod extract;
mod routes;
mod server;
mod state;

pub use error::{ApiError, ApiResult, ErrorBody};
pub use extract::ListParams;
pub use routes::{Created, PagedBody, Paging};
pub use server::{ServerConfig, router, serve, serve_with_shutdown};
pub use state::AppState;
