use std::path::Path;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capture::capture::CaptureOptions;
use crate::capture::key::FallbackKeys;
use crate::error::{FormSnapshotError, Result};
use crate::fill::fill_model::FillConfig;

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "form-snapshot.yaml";
pub const DEFAULT_STORE_FILE: &str = "form-snapshot.json";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-snapshot",
    version,
    about = "Save web form state as named snapshots and restore it later"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-snapshot.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Snapshot store file (overrides store.path)
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Only act on whitelisted sites
    #[arg(long, global = true)]
    pub require_whitelist: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture the page's form state and store it under a name
    Save {
        /// Page document (JSON tree)
        #[arg(long)]
        dom: String,

        /// Site hostname or URL
        #[arg(long)]
        host: String,

        /// Snapshot name
        #[arg(long)]
        name: String,

        /// 1-based form to capture when the page has several
        #[arg(long)]
        form: Option<usize>,

        /// Key policy for forms with no identifiable fields: hashed or random
        #[arg(long)]
        fallback_keys: Option<FallbackKeys>,

        /// Include password inputs in whole-page captures
        #[arg(long)]
        document_passwords: bool,
    },

    /// Restore a stored snapshot into a page document
    Fill {
        /// Page document (JSON tree)
        #[arg(long)]
        dom: String,

        /// Site hostname or URL
        #[arg(long)]
        host: String,

        /// Snapshot name (newest with that name wins)
        #[arg(long, conflicts_with = "timestamp", required_unless_present = "timestamp")]
        name: Option<String>,

        /// Snapshot timestamp
        #[arg(long)]
        timestamp: Option<u64>,

        /// Write the filled document here (default: stdout)
        #[arg(short, long)]
        out: Option<String>,

        /// Attempts in total before giving up on missing fields
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Milliseconds between attempts
        #[arg(long)]
        retry_interval_ms: Option<u64>,
    },

    /// List stored snapshots, newest first
    List {
        /// Only this site
        #[arg(long)]
        host: Option<String>,
    },

    /// Delete a snapshot by timestamp
    Delete {
        #[arg(long)]
        host: String,

        #[arg(long)]
        timestamp: u64,
    },

    /// Delete every stored snapshot; site lists are kept
    Clear,

    /// Manage the whitelist and blocklist
    Sites {
        #[command(subcommand)]
        action: SitesCommand,
    },

    /// Write the whole store to a JSON file
    Export {
        #[arg(short, long)]
        output: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SitesCommand {
    /// Add a site to the whitelist
    Enable { host: String },
    /// Remove a site from the whitelist
    Disable { host: String },
    /// Stop offering to save on a site
    Block { host: String },
    /// Remove a site from the blocklist
    Unblock { host: String },
    /// Show both lists
    List,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-snapshot.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub fill: FillConfig,
    #[serde(default)]
    pub capture: CaptureOptions,
    #[serde(default)]
    pub require_whitelist: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String { DEFAULT_STORE_FILE.to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

pub fn parse_config(path: &Path, content: &str) -> Result<AppConfig> {
    // An empty file deserializes as unit, not as a mapping.
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| FormSnapshotError::YamlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = Path::new(path.unwrap_or(DEFAULT_CONFIG_FILE));
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(config_path, &content).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring config file");
            AppConfig::default()
        }),
        Err(_) => {
            debug!(path = %config_path.display(), "no config file, using defaults");
            AppConfig::default()
        }
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

impl AppConfig {
    pub fn store_path<'a>(&'a self, cli_store: Option<&'a str>) -> &'a Path {
        Path::new(cli_store.unwrap_or(&self.store.path))
    }

    pub fn capture_options(&self, fallback_keys: Option<FallbackKeys>, document_passwords: bool) -> CaptureOptions {
        CaptureOptions {
            fallback_keys: fallback_keys.unwrap_or(self.capture.fallback_keys),
            document_passwords: document_passwords || self.capture.document_passwords,
        }
    }

    pub fn fill_config(&self, max_attempts: Option<u32>, retry_interval_ms: Option<u64>) -> FillConfig {
        FillConfig {
            max_attempts: max_attempts.unwrap_or(self.fill.max_attempts),
            retry_interval_ms: retry_interval_ms.unwrap_or(self.fill.retry_interval_ms),
        }
    }
}
