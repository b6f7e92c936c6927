//! Client configuration
//!
//! Loaded from `<config_dir>/dcctl/config.toml`. Callers overlay the
//! `DAGSTER_CLOUD_*` environment variables with [`env::apply_overrides`].

pub mod env;
pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_client_toml, parse_client_toml_str, parse_toml_file, parse_toml_str, to_toml};
pub use schema::ClientConfig;
pub use store::ConfigStore;
