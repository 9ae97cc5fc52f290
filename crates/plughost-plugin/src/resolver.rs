//! Location resolution: which directories may hold plugins.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::artifact::{DirectoryOrigin, PluginDirectory};
use crate::config::{Configuration, DiscoverySettings};

/// Raw inputs to resolution. Every source may be empty.
#[derive(Debug, Clone, Default)]
pub struct ResolverInputs {
    pub search_paths: Vec<PathBuf>,
    pub user_site: Option<PathBuf>,
    pub system_sites: Vec<PathBuf>,
    pub install_root: PathBuf,
}

impl From<&Configuration> for ResolverInputs {
    fn from(config: &Configuration) -> Self {
        Self {
            search_paths: config.search_paths.clone(),
            user_site: config.user_site.clone(),
            system_sites: config.system_sites.clone(),
            install_root: config.install_root.clone(),
        }
    }
}

/// Site directories that look like package locations, de-duplicated, in
/// source order: search paths, user site, system sites.
pub fn site_dirs(inputs: &ResolverInputs, settings: &DiscoverySettings) -> Vec<PathBuf> {
    let candidates = inputs
        .search_paths
        .iter()
        .chain(inputs.user_site.iter())
        .chain(inputs.system_sites.iter());

    let mut seen = HashSet::new();
    let mut sites = Vec::new();
    for candidate in candidates {
        if !has_marker_segment(candidate, &settings.marker_segments) {
            continue;
        }
        if seen.insert(dedup_key(candidate)) {
            sites.push(candidate.clone());
        }
    }
    sites
}

/// Third-party plugin directories for every site, then the first-party
/// kernel directory.
pub fn resolve(inputs: &ResolverInputs, settings: &DiscoverySettings) -> Vec<PluginDirectory> {
    let mut seen = HashSet::new();
    let mut directories = Vec::new();

    let third_party = site_dirs(inputs, settings)
        .into_iter()
        .map(|site| PluginDirectory::new(site.join(&settings.plugin_dir_name), DirectoryOrigin::ThirdParty));
    let first_party = PluginDirectory::new(
        inputs.install_root.join(&settings.kernel_subdir),
        DirectoryOrigin::FirstParty,
    );

    for directory in third_party.chain(std::iter::once(first_party)) {
        if seen.insert(dedup_key(directory.path())) {
            directories.push(directory);
        } else {
            tracing::debug!(
                target: "plughost_plugin",
                path = %directory.path().display(),
                "dropping duplicate plugin directory"
            );
        }
    }

    directories
}

/// True when the install root lives inside one of the site directories,
/// i.e. the host was installed as a package rather than run from a source
/// tree.
pub fn is_packaged_install(install_root: &Path, sites: &[PathBuf]) -> bool {
    let root = dedup_key(install_root);
    sites.iter().any(|site| root.starts_with(dedup_key(site)))
}

fn has_marker_segment(path: &Path, markers: &[String]) -> bool {
    path.components().any(|component| match component {
        Component::Normal(segment) => markers
            .iter()
            .any(|marker| segment.to_str() == Some(marker.as_str())),
        _ => false,
    })
}

/// Canonical path when it exists, lexical path otherwise.
fn dedup_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.components().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> ResolverInputs {
        ResolverInputs {
            search_paths: vec![
                PathBuf::from("/usr/lib/python3/site-packages"),
                PathBuf::from("/home/user/src"),
                PathBuf::from("/usr/lib/python3/site-packages/"),
            ],
            user_site: Some(PathBuf::from("/home/user/.local/lib/site-packages")),
            system_sites: vec![
                PathBuf::from("/usr/lib/python3/dist-packages"),
                PathBuf::from("/opt/not-site-packages-really"),
            ],
            install_root: PathBuf::from("/opt/host"),
        }
    }

    #[test]
    fn keeps_only_marked_paths_in_order() {
        let sites = site_dirs(&inputs(), &DiscoverySettings::default());
        assert_eq!(
            sites,
            vec![
                PathBuf::from("/usr/lib/python3/site-packages"),
                PathBuf::from("/home/user/.local/lib/site-packages"),
                PathBuf::from("/usr/lib/python3/dist-packages"),
            ]
        );
    }

    #[test]
    fn first_party_directory_is_always_last() {
        let directories = resolve(&ResolverInputs::default(), &DiscoverySettings::default());
        assert_eq!(directories.len(), 1);
        assert_eq!(directories[0].origin(), DirectoryOrigin::FirstParty);
        assert!(directories[0].path().ends_with("core/kernels"));

        let directories = resolve(&inputs(), &DiscoverySettings::default());
        assert_eq!(directories.len(), 4);
        let last = directories.last().unwrap();
        assert_eq!(last.path(), Path::new("/opt/host/core/kernels"));
        assert!(directories[..3]
            .iter()
            .all(|dir| dir.origin() == DirectoryOrigin::ThirdParty
                && dir.path().ends_with("tensorflow-plugins")));
    }

    #[test]
    fn packaged_install_detection() {
        let sites = vec![PathBuf::from("/usr/lib/python3/site-packages")];
        assert!(is_packaged_install(
            Path::new("/usr/lib/python3/site-packages/host"),
            &sites
        ));
        assert!(!is_packaged_install(Path::new("/home/user/src/host"), &sites));
    }
}
