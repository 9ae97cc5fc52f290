use std::path::Path;

use crate::artifact::{ArtifactKind, PluginArtifact, PluginDirectory};
use crate::config::Configuration;
use crate::discovery;
use crate::error::LoaderError;
use crate::host::HostRuntime;
use crate::report::{
    InitReport, LoadOutcome, LoadResult, REASON_ALREADY_LOADED, REASON_FILESYSTEM_DISABLED,
    REASON_NOT_CONFIGURED,
};
use crate::resolver::{self, ResolverInputs};

/// Directories a pass will scan.
#[derive(Debug, Clone)]
pub struct DiscoveryPlan {
    pub packaged_install: bool,
    pub directories: Vec<PluginDirectory>,
}

impl DiscoveryPlan {
    pub fn for_config(config: &Configuration) -> Self {
        let inputs = ResolverInputs::from(config);
        let settings = &config.discovery;
        let sites = resolver::site_dirs(&inputs, settings);
        let packaged_install = resolver::is_packaged_install(&inputs.install_root, &sites);

        if settings.require_packaged_install && !packaged_install {
            tracing::info!(
                target: "plughost_plugin",
                install_root = %inputs.install_root.display(),
                "host is not a packaged install; plugin discovery disabled"
            );
            return Self {
                packaged_install,
                directories: Vec::new(),
            };
        }

        Self {
            packaged_install,
            directories: resolver::resolve(&inputs, settings),
        }
    }

    /// Every artifact in every planned directory, in directory order.
    pub fn artifacts<'a>(&'a self, config: &'a Configuration) -> impl Iterator<Item = PluginArtifact> + 'a {
        let settings = &config.discovery;
        self.directories
            .iter()
            .flat_map(move |directory| discovery::scan(directory, settings))
    }
}

/// Loads plugin artifacts into a host, one at a time, never aborting on a
/// bad plugin.
pub struct PluginLoader<'a, H: HostRuntime> {
    config: &'a Configuration,
    host: &'a mut H,
}

impl<'a, H: HostRuntime> PluginLoader<'a, H> {
    pub fn new(config: &'a Configuration, host: &'a mut H) -> Self {
        Self { config, host }
    }

    pub fn load_artifact(&mut self, artifact: &PluginArtifact) -> LoadResult {
        if artifact.kind == ArtifactKind::Filesystem && !self.config.use_modular_filesystem {
            tracing::debug!(
                target: "plughost_plugin",
                path = %artifact.path.display(),
                "modular filesystem disabled; skipping"
            );
            return LoadResult::skipped(REASON_FILESYSTEM_DISABLED);
        }

        if self.host.is_loaded(&artifact.path, artifact.kind) {
            return LoadResult::skipped(REASON_ALREADY_LOADED);
        }

        let loaded = match artifact.kind {
            ArtifactKind::PluggableDevice => self.host.load_pluggable_device_library(&artifact.path),
            kind => self.host.load_library(&artifact.path, kind),
        };

        match loaded {
            Ok(handle) => LoadResult::Loaded(handle),
            Err(error) => {
                tracing::warn!(
                    target: "plughost_plugin",
                    path = %artifact.path.display(),
                    kind = %artifact.kind,
                    error = %error,
                    "plugin failed to load; continuing"
                );
                LoadResult::Failed(error)
            }
        }
    }

    pub fn load_all<I>(&mut self, artifacts: I) -> Vec<LoadOutcome>
    where
        I: IntoIterator<Item = PluginArtifact>,
    {
        artifacts
            .into_iter()
            .map(|artifact| {
                let result = self.load_artifact(&artifact);
                LoadOutcome { artifact, result }
            })
            .collect()
    }

    /// Loads one explicitly named pluggable device library, or every
    /// library in a named directory. Anything wrong with the request is an
    /// error for the caller.
    pub fn load_pluggable_device(&mut self, path: &Path) -> Result<Vec<LoadResult>, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::explicit_path_invalid(path, "path does not exist"));
        }

        let targets = if path.is_dir() {
            let libraries = discovery::list_libraries(path);
            if libraries.is_empty() {
                return Err(LoaderError::explicit_path_invalid(
                    path,
                    format!(
                        "directory contains no .{} libraries",
                        discovery::plugin_extension()
                    ),
                ));
            }
            libraries
        } else {
            vec![path.to_path_buf()]
        };

        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            if self.host.is_loaded(&target, ArtifactKind::PluggableDevice) {
                tracing::info!(
                    target: "plughost_plugin",
                    path = %target.display(),
                    "requested device library already registered as a device"
                );
                results.push(LoadResult::skipped(REASON_ALREADY_LOADED));
                continue;
            }
            let handle = self
                .host
                .load_pluggable_device_library(&target)
                .map_err(|error| LoaderError::ExplicitPathInvalid {
                    path: target.clone(),
                    reason: "library did not load as a pluggable device".into(),
                    source: Some(Box::new(error)),
                })?;
            results.push(LoadResult::Loaded(handle));
        }
        Ok(results)
    }

    /// The single-path load driven by configuration; skipped when no path
    /// is configured.
    pub fn load_configured_device(&mut self) -> Result<Vec<LoadResult>, LoaderError> {
        let config = self.config;
        match config.pluggable_device_path.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => self.load_pluggable_device(path),
            _ => Ok(vec![LoadResult::skipped(REASON_NOT_CONFIGURED)]),
        }
    }
}

/// Runs one full pass: resolve, scan, load, then the configured device.
///
/// Discovery problems end up in the report. Only a failing explicitly
/// configured device is returned as an error.
pub fn initialize<H: HostRuntime>(config: &Configuration, host: &mut H) -> Result<InitReport, LoaderError> {
    let plan = DiscoveryPlan::for_config(config);
    tracing::info!(
        target: "plughost_plugin",
        directories = plan.directories.len(),
        packaged_install = plan.packaged_install,
        "starting plugin discovery"
    );

    let mut loader = PluginLoader::new(config, host);
    let outcomes = loader.load_all(plan.artifacts(config));
    let explicit_device = loader.load_configured_device()?;

    let report = InitReport {
        packaged_install: plan.packaged_install,
        directories: plan.directories,
        outcomes,
        explicit_device,
    };

    tracing::info!(
        target: "plughost_plugin",
        loaded = report.loaded().count(),
        failed = report.failed().count(),
        skipped = report.skipped().count(),
        "plugin discovery finished"
    );

    Ok(report)
}
