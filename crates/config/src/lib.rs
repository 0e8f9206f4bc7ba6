//! Configuration loading, validation and env substitution.
//!
//! Config files: `chatbridge.toml`, `chatbridge.yaml`/`.yml`, or `chatbridge.json`
//! Searched in `./` then `~/.config/chatbridge/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in all values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, find_config_file, load_config, resolve_config_path},
    schema::{
        BridgeConfig, DispatchConfig, EmojiAlias, EmojiConfig, EmojiStyle, HistoryConfig,
        IdentityEntry, MetricsConfig, PlatformConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, check_semantics, validate},
};
