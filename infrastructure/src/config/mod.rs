//! Configuration file loading for casegen
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CASEGEN_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./casegen.toml` or `./.casegen.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/casegen/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileGenerationConfig, FileLoggingConfig, FileModelsConfig, FileOpenAiConfig,
    FileOutputConfig, FileProvidersConfig, FileRetrievalConfig,
};
pub use loader::{ConfigError, ConfigLoader};
