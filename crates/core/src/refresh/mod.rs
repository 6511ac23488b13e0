//! Country list refresh: cache-or-network decision and observable state.

mod coordinator;
mod state;

pub use coordinator::{DEFAULT_REFRESH_THRESHOLD, RefreshCoordinator, RefreshPath, is_cache_fresh};
pub use state::{Notice, RefreshObserver};
