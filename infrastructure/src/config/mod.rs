//! Configuration file loading for agent-crew
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CREW_`-prefixed environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./crew.toml` or `./.crew.toml`
//! 4. Global: `<config dir>/agent-crew/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, ConfirmationMode, FileAgentConfig, FileConfig, FileConfirmationConfig,
    FileCrewConfig, FileJournalConfig, FileModelConfig, FileOutputConfig, FileReplConfig,
};
pub use loader::ConfigLoader;
