//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MBOX2EAXS_CONFIG` (environment variable)
//! 2. `~/.config/mbox2eaxs/config.toml` (Linux/macOS)
//!    `%APPDATA%\mbox2eaxs\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! The `[conversion]` table uses the same PascalCase option names the EAXS
//! tooling has always used, e.g. `HashAlgorithmName = "SHA256"`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::digest::HashAlgorithm;
use crate::error::Result;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Conversion options.
    pub conversion: ConversionSettings,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Options governing one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ConversionSettings {
    /// Digest used for the mbox file, every message and all external content.
    pub hash_algorithm_name: String,
    /// Write attachments and non-text bodies to side files.
    pub save_attachments_and_binary_content_externally: bool,
    /// Wrap side files in a standalone `BodyContent` XML document.
    pub wrap_external_content_in_xml: bool,
    /// Keep the declared transfer encoding when it can be re-applied losslessly.
    pub preserve_content_transfer_encoding_if_possible: bool,
    /// Descend into Thunderbird-style `<name>.sbd` child folders.
    pub include_sub_folders: bool,
    /// Write one XML document per mbox instead of one merged document.
    pub one_file_per_mbox: bool,
    /// Folder, relative to the XML document, that receives side files.
    pub external_content_folder: String,
    /// Records larger than this are truncated and marked incomplete.
    pub maximum_message_size: usize,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            hash_algorithm_name: "SHA256".to_string(),
            save_attachments_and_binary_content_externally: false,
            wrap_external_content_in_xml: false,
            preserve_content_transfer_encoding_if_possible: false,
            include_sub_folders: false,
            one_file_per_mbox: false,
            external_content_folder: "ExtBodyContent".to_string(),
            maximum_message_size: 256 * 1024 * 1024, // 256 MB
        }
    }
}

impl ConversionSettings {
    /// Resolve the configured digest, rejecting unknown names.
    pub fn hash_algorithm(&self) -> Result<HashAlgorithm> {
        self.hash_algorithm_name.parse()
    }

    /// `(name, value)` pairs written as processing instructions at the top of
    /// every document, in a fixed order.
    pub fn as_processing_instructions(&self) -> Vec<(&'static str, String)> {
        vec![
            ("HashAlgorithmName", self.hash_algorithm_name.clone()),
            (
                "SaveAttachmentsAndBinaryContentExternally",
                self.save_attachments_and_binary_content_externally.to_string(),
            ),
            (
                "WrapExternalContentInXml",
                self.wrap_external_content_in_xml.to_string(),
            ),
            (
                "PreserveContentTransferEncodingIfPossible",
                self.preserve_content_transfer_encoding_if_possible
                    .to_string(),
            ),
            ("IncludeSubFolders", self.include_sub_folders.to_string()),
            ("OneFilePerMbox", self.one_file_per_mbox.to_string()),
            (
                "ExternalContentFolder",
                self.external_content_folder.clone(),
            ),
        ]
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MBOX2EAXS_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mbox2eaxs").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mbox2eaxs")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("mbox2eaxs.log")
}
