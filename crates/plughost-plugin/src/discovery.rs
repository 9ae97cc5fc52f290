use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::{ArtifactKind, DirectoryOrigin, PluginArtifact, PluginDirectory};
use crate::config::DiscoverySettings;

/// Lists plugin artifacts directly inside `directory`.
///
/// A missing or unreadable directory yields nothing. The directory itself is
/// listed eagerly so entries come out in file-name order; classification is
/// lazy. Every library in a first-party directory is a kernel regardless of
/// its name.
pub fn scan<'a>(
    directory: &'a PluginDirectory,
    settings: &'a DiscoverySettings,
) -> impl Iterator<Item = PluginArtifact> + 'a {
    list_libraries(directory.path())
        .into_iter()
        .filter_map(move |path| {
            let kind = match directory.origin() {
                DirectoryOrigin::FirstParty => ArtifactKind::Kernel,
                DirectoryOrigin::ThirdParty => classify(&path, settings)?,
            };
            Some(PluginArtifact::new(path, kind))
        })
}

/// Shared libraries directly inside `root`, sorted by file name.
pub fn list_libraries(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(
                target: "plughost_plugin",
                path = %root.display(),
                error = %error,
                "cannot read plugin directory"
            );
            return Vec::new();
        }
    };

    let ext = plugin_extension();
    let mut plugins = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(
                    target: "plughost_plugin",
                    path = %root.display(),
                    error = %error,
                    "skipping unreadable directory entry"
                );
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|value| value.to_str()) == Some(ext) {
            plugins.push(path);
        }
    }

    plugins.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    plugins
}

/// Kind of a shared library, decided by its file name.
pub fn classify(path: &Path, settings: &DiscoverySettings) -> Option<ArtifactKind> {
    if path.extension().and_then(|value| value.to_str()) != Some(plugin_extension()) {
        return None;
    }
    let name = path.file_name()?.to_str()?;

    if !settings.device_marker.is_empty() && name.contains(&settings.device_marker) {
        Some(ArtifactKind::PluggableDevice)
    } else if !settings.filesystem_marker.is_empty() && name.contains(&settings.filesystem_marker) {
        Some(ArtifactKind::Filesystem)
    } else {
        Some(ArtifactKind::Kernel)
    }
}

pub fn plugin_extension() -> &'static str {
    if cfg!(target_os = "windows") {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}
