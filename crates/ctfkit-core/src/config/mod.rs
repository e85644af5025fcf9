//! Project configuration.
//!
//! A ctfkit project is any directory containing `.ctf/config.toml`:
//! - `[config]`: transport backend selection and remote platform coordinates
//! - `[challenges]`: the challenge registry (key -> source locator)
//! - `[deploy]`: deployment handler commands keyed by host scheme

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_project_toml, parse_project_toml_str, to_toml};
pub use paths::{CONFIG_DIR, CONFIG_FILE, config_path, find_project_root};
pub use schema::{ProjectConfig, ProjectSettings};
pub use store::ConfigStore;
