//! Pure domain logic of the finance client.
//!
//! Nothing in this crate touches the network: it works on the wire types
//! from `api_types` and is shared by the HTTP client and the CLI.

pub use budget::{BudgetUsage, utilization};
pub use categories::{build_tree, ensure_acyclic, flatten as flatten_categories, would_create_cycle};
pub use error::EngineError;
pub use report::{Report, Totals, TrendBucket, aggregate};
pub use validation::{Validate, ValidationErrors};

pub mod aggregates;
pub mod budget;
pub mod categories;
mod error;
pub mod money;
pub mod period;
pub mod report;
pub mod validation;

#[cfg(test)]
mod testing;

pub type ResultEngine<T> = Result<T, EngineError>;
