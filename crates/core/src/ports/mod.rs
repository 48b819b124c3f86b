mod filter;
mod pagination;
mod query;
mod repository;

pub use filter::*;
pub use pagination::*;
pub use query::*;
pub use repository::*;
