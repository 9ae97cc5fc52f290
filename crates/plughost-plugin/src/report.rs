use serde::{Serialize, Serializer};

use crate::artifact::{ArtifactKind, PluginArtifact, PluginDirectory};
use crate::error::LoaderError;
use crate::host::PluginHandle;

pub const REASON_NOT_CONFIGURED: &str = "not configured";
pub const REASON_ALREADY_LOADED: &str = "already loaded";
pub const REASON_FILESYSTEM_DISABLED: &str = "modular filesystem disabled";

#[derive(Debug, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum LoadResult {
    Loaded(PluginHandle),
    Skipped(String),
    Failed(#[serde(serialize_with = "serialize_error")] LoaderError),
}

impl LoadResult {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn handle(&self) -> Option<&PluginHandle> {
        match self {
            Self::Loaded(handle) => Some(handle),
            _ => None,
        }
    }
}

fn serialize_error<S: Serializer>(error: &LoaderError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Serialize)]
pub struct LoadOutcome {
    pub artifact: PluginArtifact,
    pub result: LoadResult,
}

/// What one initialization pass did. Immutable once returned.
#[derive(Debug, Serialize)]
pub struct InitReport {
    pub(crate) packaged_install: bool,
    pub(crate) directories: Vec<PluginDirectory>,
    pub(crate) outcomes: Vec<LoadOutcome>,
    pub(crate) explicit_device: Vec<LoadResult>,
}

impl InitReport {
    pub fn packaged_install(&self) -> bool {
        self.packaged_install
    }

    pub fn directories(&self) -> &[PluginDirectory] {
        &self.directories
    }

    /// Every discovered artifact and what became of it, in scan order.
    pub fn outcomes(&self) -> &[LoadOutcome] {
        &self.outcomes
    }

    /// Results of the explicitly configured device load; a single
    /// `Skipped` entry when no path was configured.
    pub fn explicit_device(&self) -> &[LoadResult] {
        &self.explicit_device
    }

    pub fn loaded(&self) -> impl Iterator<Item = &PluginHandle> {
        self.all_results().filter_map(LoadResult::handle)
    }

    pub fn failed(&self) -> impl Iterator<Item = &LoaderError> {
        self.all_results().filter_map(|result| match result {
            LoadResult::Failed(error) => Some(error),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.all_results().filter_map(|result| match result {
            LoadResult::Skipped(reason) => Some(reason.as_str()),
            _ => None,
        })
    }

    pub fn pluggable_devices(&self) -> impl Iterator<Item = &PluginHandle> {
        self.loaded()
            .filter(|handle| handle.kind == ArtifactKind::PluggableDevice)
    }

    /// The modular filesystem plugin, if one was loaded.
    pub fn filesystem(&self) -> Option<&PluginHandle> {
        self.loaded()
            .find(|handle| handle.kind == ArtifactKind::Filesystem)
    }

    fn all_results(&self) -> impl Iterator<Item = &LoadResult> {
        self.outcomes
            .iter()
            .map(|outcome| &outcome.result)
            .chain(self.explicit_device.iter())
    }
}
