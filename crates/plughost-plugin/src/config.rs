use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_USE_MODULAR_FILESYSTEM: &str = "TF_USE_MODULAR_FILESYSTEM";
pub const ENV_PLUGGABLE_DEVICE_LIBRARY_PATH: &str = "TF_PLUGGABLE_DEVICE_LIBRARY_PATH";
pub const ENV_INSTALL_ROOT: &str = "PLUGHOST_INSTALL_ROOT";
pub const ENV_SEARCH_PATH: &str = "PLUGHOST_SEARCH_PATH";
pub const ENV_USER_SITE: &str = "PLUGHOST_USER_SITE";
pub const ENV_SITE_PACKAGES: &str = "PLUGHOST_SITE_PACKAGES";

/// Options recognized from the config file's `[discovery]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverySettings {
    pub marker_segments: Vec<String>,
    pub plugin_dir_name: String,
    pub kernel_subdir: PathBuf,
    pub device_marker: String,
    pub filesystem_marker: String,
    pub require_packaged_install: bool,
    pub extra_site_dirs: Vec<PathBuf>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            marker_segments: vec!["site-packages".into(), "dist-packages".into()],
            plugin_dir_name: "tensorflow-plugins".into(),
            kernel_subdir: PathBuf::from("core").join("kernels"),
            device_marker: "pluggable_device".into(),
            filesystem_marker: "filesystem".into(),
            require_packaged_install: false,
            extra_site_dirs: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    discovery: DiscoverySettings,
}

impl DiscoverySettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(file.discovery)
    }
}

/// Everything the loader needs, resolved once at start up.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub use_modular_filesystem: bool,
    pub pluggable_device_path: Option<PathBuf>,
    pub install_root: PathBuf,
    pub search_paths: Vec<PathBuf>,
    pub user_site: Option<PathBuf>,
    pub system_sites: Vec<PathBuf>,
    pub discovery: DiscoverySettings,
}

impl Configuration {
    pub fn from_env(discovery: DiscoverySettings) -> Self {
        Self::from_lookup(discovery, |key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(discovery: DiscoverySettings, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let use_modular_filesystem = lookup(ENV_USE_MODULAR_FILESYSTEM)
            .map(|value| parse_flag(ENV_USE_MODULAR_FILESYSTEM, &value))
            .unwrap_or(false);

        // Only the empty string means unset; anything else is an explicit
        // request, even if it is only whitespace.
        let pluggable_device_path = lookup(ENV_PLUGGABLE_DEVICE_LIBRARY_PATH)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let install_root = non_empty(lookup(ENV_INSTALL_ROOT))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let search_paths = path_list(lookup(ENV_SEARCH_PATH));
        let user_site = non_empty(lookup(ENV_USER_SITE)).map(PathBuf::from);

        let mut system_sites = path_list(lookup(ENV_SITE_PACKAGES));
        system_sites.extend(discovery.extra_site_dirs.iter().cloned());

        Self {
            use_modular_filesystem,
            pluggable_device_path,
            install_root,
            search_paths,
            user_site,
            system_sites,
            discovery,
        }
    }

    pub fn with_install_root(mut self, install_root: impl Into<PathBuf>) -> Self {
        self.install_root = install_root.into();
        self
    }
}

/// Exact comparison: only `true` and `1` enable a flag.
fn parse_flag(key: &str, value: &str) -> bool {
    match value {
        "true" | "1" => true,
        "false" | "0" | "" => false,
        other => {
            tracing::debug!(
                target: "plughost_plugin",
                key,
                value = other,
                "unrecognized boolean value; treating as false"
            );
            false
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn path_list(value: Option<String>) -> Vec<PathBuf> {
    match non_empty(value) {
        Some(value) => std::env::split_paths(&value)
            .filter(|path| !path.as_os_str().is_empty())
            .collect(),
        None => Vec::new(),
    }
}
