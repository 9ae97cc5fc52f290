use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    /// Directory or file absent. Benign during discovery.
    #[error("plugin path not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to load plugin {}: {source}", path.display())]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("requested plugin path {} is invalid: {reason}", path.display())]
    ExplicitPathInvalid {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<Box<LoaderError>>,
    },
}

impl LoaderError {
    pub fn load_failure<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::LoadFailure {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn explicit_path_invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ExplicitPathInvalid {
            path: path.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound { path }
            | Self::LoadFailure { path, .. }
            | Self::ExplicitPathInvalid { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
