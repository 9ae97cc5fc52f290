use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryOrigin {
    /// Bundled with the host installation.
    FirstParty,
    /// Supplied by an independently installed package.
    ThirdParty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDirectory {
    path: PathBuf,
    origin: DirectoryOrigin,
}

impl PluginDirectory {
    pub fn new(path: impl Into<PathBuf>, origin: DirectoryOrigin) -> Self {
        Self {
            path: path.into(),
            origin,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> DirectoryOrigin {
        self.origin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Kernel,
    PluggableDevice,
    Filesystem,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ArtifactKind::Kernel => "kernel",
            ArtifactKind::PluggableDevice => "pluggable_device",
            ArtifactKind::Filesystem => "filesystem",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl PluginArtifact {
    pub fn new(path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
