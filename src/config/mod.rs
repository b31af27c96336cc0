//! Configuration loading and types.

mod loader;
mod types;

pub use loader::{Config, ConfigError, ConfigLoader};
pub use types::{AiConfig, ProviderKind, RetryConfig, WatchSettings};
