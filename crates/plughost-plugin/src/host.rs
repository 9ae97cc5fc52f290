use std::collections::HashSet;
use std::path::{Path, PathBuf};

use libloading::Library;
use serde::Serialize;

use crate::abi::{DeviceInitFn, EntryPoint, KernelInitFn, DEVICE_INIT_SYMBOL, KERNEL_INIT_SYMBOL};
use crate::artifact::ArtifactKind;
use crate::error::LoaderError;

/// A library registered with the host. The host keeps the library itself;
/// this is only a description of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginHandle {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub entry_points: Vec<EntryPoint>,
}

/// The process-side collaborator that actually maps libraries into memory.
///
/// Loading takes `&mut self`: mutation of the symbol space is never
/// concurrent.
pub trait HostRuntime {
    /// Loads a kernel or filesystem library.
    fn load_library(&mut self, path: &Path, kind: ArtifactKind) -> Result<PluginHandle, LoaderError>;

    fn load_pluggable_device_library(&mut self, path: &Path) -> Result<PluginHandle, LoaderError>;

    /// Whether `path` is already registered as `kind`. The same library may
    /// be registered once per kind.
    fn is_loaded(&self, path: &Path, kind: ArtifactKind) -> bool;
}

/// `HostRuntime` backed by the platform dynamic loader.
#[derive(Debug, Default)]
pub struct DynamicHost {
    libraries: Vec<Library>,
    handles: Vec<PluginHandle>,
    loaded: HashSet<(PathBuf, ArtifactKind)>,
}

impl DynamicHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handles(&self) -> &[PluginHandle] {
        &self.handles
    }

    fn open(path: &Path) -> Result<(PathBuf, Library), LoaderError> {
        let canonical = std::fs::canonicalize(path).map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                LoaderError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                LoaderError::load_failure(path, error)
            }
        })?;
        // SAFETY: library initializers run here. Plugins are trusted by virtue
        // of being installed next to the host.
        let library = unsafe { Library::new(&canonical) }
            .map_err(|error| LoaderError::load_failure(&canonical, error))?;
        Ok((canonical, library))
    }

    fn register(&mut self, library: Library, handle: PluginHandle) -> PluginHandle {
        tracing::info!(
            target: "plughost_plugin",
            path = %handle.path.display(),
            kind = %handle.kind,
            "registered plugin library"
        );
        self.loaded.insert((handle.path.clone(), handle.kind));
        self.libraries.push(library);
        self.handles.push(handle.clone());
        handle
    }
}

impl HostRuntime for DynamicHost {
    fn load_library(&mut self, path: &Path, kind: ArtifactKind) -> Result<PluginHandle, LoaderError> {
        let (canonical, library) = Self::open(path)?;

        let mut entry_points = Vec::new();
        // SAFETY: only resolved, never called.
        if unsafe { library.get::<KernelInitFn>(KERNEL_INIT_SYMBOL) }.is_ok() {
            entry_points.push(EntryPoint::KernelInit);
        }

        let handle = PluginHandle {
            path: canonical,
            kind,
            entry_points,
        };
        Ok(self.register(library, handle))
    }

    fn load_pluggable_device_library(&mut self, path: &Path) -> Result<PluginHandle, LoaderError> {
        let (canonical, library) = Self::open(path)?;

        // SAFETY: only resolved, never called.
        if let Err(error) = unsafe { library.get::<DeviceInitFn>(DEVICE_INIT_SYMBOL) } {
            return Err(LoaderError::load_failure(
                &canonical,
                format!(
                    "missing {} entry point: {error}",
                    EntryPoint::DeviceInit.symbol_name()
                ),
            ));
        }

        let mut entry_points = vec![EntryPoint::DeviceInit];
        // SAFETY: only resolved, never called.
        if unsafe { library.get::<KernelInitFn>(KERNEL_INIT_SYMBOL) }.is_ok() {
            entry_points.push(EntryPoint::KernelInit);
        }

        let handle = PluginHandle {
            path: canonical,
            kind: ArtifactKind::PluggableDevice,
            entry_points,
        };
        Ok(self.register(library, handle))
    }

    fn is_loaded(&self, path: &Path, kind: ArtifactKind) -> bool {
        std::fs::canonicalize(path)
            .map(|canonical| self.loaded.contains(&(canonical, kind)))
            .unwrap_or(false)
    }
}

impl Drop for DynamicHost {
    fn drop(&mut self) {
        // Registered kernels and devices keep pointers into these libraries.
        for library in self.libraries.drain(..) {
            std::mem::forget(library);
        }
    }
}
