//! Client core of the finance API: HTTP calls, the per-session cache, write
//! coordination and the dashboard refresher.

pub use api::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use cache::{Cache, CacheKey, ResourceFamily, SlotState};
pub use error::{ClientError, Result};
pub use mutations::{Mutation, MutationCoordinator};
pub use refresh::{DEFAULT_REFRESH_INTERVAL, DashboardRefresher};
pub use session::Session;

pub mod api;
pub mod cache;
mod error;
pub mod mutations;
pub mod refresh;
pub mod session;
