//! Configuration — typed schema plus a JSON/env loader.

pub mod loader;
pub mod schema;

pub use loader::{get_config_path, load_config, save_config};
pub use schema::{AccountConfig, Config, HistoryConfig, LivenessConfig, ProviderConfig};
