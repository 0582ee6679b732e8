//! Configuration system.
//!
//! Hierarchical configuration with file and environment overrides. Sources
//! are layered lowest to highest priority: built-in defaults, the global
//! file under the user config dir, the workspace `strata.toml`, then
//! `STRATA_`-prefixed environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::logging::LoggingConfig;

/// Workspace configuration file name.
pub const WORKSPACE_FILE: &str = "strata.toml";

/// Remote sync endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the push/pull/upload API.
    pub endpoint: Option<String>,

    /// Bearer token sent with every request.
    pub api_key: Option<String>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Upload tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Part size for multi-part uploads, bytes.
    #[serde(default = "default_part_size")]
    pub part_size: u64,
}

fn default_part_size() -> u64 {
    5 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            part_size: default_part_size(),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StrataConfig {
    /// Load from the default source chain, rooted at the current directory.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(Path::new("."))
    }

    /// Load from the default source chain with an explicit workspace root.
    pub fn load_from(workspace_root: &Path) -> Result<Self, StoreError> {
        let mut builder = builder_with_defaults()?;

        if let Some(global) = global_config_path() {
            builder = builder.add_source(File::from(global).required(false));
        }
        builder = builder
            .add_source(File::from(workspace_root.join(WORKSPACE_FILE)).required(false))
            .add_source(Environment::with_prefix("STRATA").separator("__"));

        let config: StrataConfig = builder.build()?.try_deserialize()?;
        config.warn_on_gaps();
        Ok(config)
    }

    /// Surface configuration gaps on the warn channel at construction time;
    /// the hard error comes on first use of the missing collaborator.
    fn warn_on_gaps(&self) {
        if self.remote.endpoint.is_none() {
            tracing::warn!("remote.endpoint is not configured; sync will be unavailable");
        }
    }
}

/// Create a builder with merge-policy defaults applied.
fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Config::builder()
        .set_default("remote.connect_timeout_secs", default_connect_timeout())?
        .set_default("remote.request_timeout_secs", default_request_timeout())?
        .set_default("upload.part_size", default_part_size())
}

/// Path of the global configuration file, if a home directory exists.
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "strata")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
