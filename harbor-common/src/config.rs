//! Configuration loading and root folder resolution
//!
//! The root folder holds the SQLite database and any service-local state.
//! Resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. `HARBOR_ROOT_FOLDER` / `HARBOR_ROOT` environment variables
//! 3. TOML config file (`harbor/config.toml` in the platform config dir,
//!    then `/etc/harbor/config.toml` on Linux)
//! 4. OS-dependent compiled default (fallback)
//!
//! Missing config files never terminate startup; they fall through to the
//! compiled defaults with a warning.

use crate::Result;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Compiled per-platform defaults used when no other configuration is found
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            dirs::data_local_dir()
                .map(|d| d.join("harbor"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/harbor"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("harbor"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/harbor"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("harbor"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\harbor"))
        } else {
            PathBuf::from("./harbor_data")
        };

        Self {
            root_folder,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Logging section of the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

/// Parsed `config.toml` contents
///
/// All fields are optional; absent values fall through to the next
/// resolution tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub crawler_endpoint: Option<String>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl TomlConfig {
    /// Load config.toml from the first existing candidate path.
    ///
    /// Returns None (with a debug log) when no config file exists or when
    /// the file fails to parse. A malformed config file must not stop
    /// service startup.
    pub fn load() -> Option<Self> {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<TomlConfig>(&contents) {
                    Ok(config) => {
                        debug!("Loaded config file: {}", path.display());
                        return Some(config);
                    }
                    Err(e) => {
                        warn!("Ignoring malformed config file {}: {}", path.display(), e);
                        return None;
                    }
                },
                Err(e) => {
                    warn!("Could not read config file {}: {}", path.display(), e);
                    return None;
                }
            }
        }
        debug!("No config file found, using defaults");
        None
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("harbor").join("config.toml"));
        }
        if cfg!(target_os = "linux") {
            paths.push(PathBuf::from("/etc/harbor/config.toml"));
        }
        paths
    }
}

/// Resolves the root folder for a named Harbor module
pub struct RootFolderResolver {
    module_name: String,
    cli_override: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_override: None,
        }
    }

    /// Attach a command-line override (highest priority when Some)
    pub fn with_cli_override(mut self, path: Option<PathBuf>) -> Self {
        self.cli_override = path;
        self
    }

    /// Resolve the root folder following the 4-tier priority order
    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_override {
            debug!(module = %self.module_name, "Root folder from CLI: {}", path.display());
            return path.clone();
        }

        // Priority 2: Environment variables
        for var in ["HARBOR_ROOT_FOLDER", "HARBOR_ROOT"] {
            if let Ok(path) = std::env::var(var) {
                if !path.is_empty() {
                    debug!(module = %self.module_name, "Root folder from {}: {}", var, path);
                    return PathBuf::from(path);
                }
            }
        }

        // Priority 3: TOML config file
        if let Some(config) = TomlConfig::load() {
            if let Some(path) = config.root_folder {
                return path;
            }
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the resolved root folder and derives well-known paths inside it
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the root folder directory if it does not exist
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Path of the service database inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root.join("harbor.db")
    }
}
