use std::fs;
use std::path::PathBuf;

use plughost_plugin::discovery::plugin_extension;
use plughost_plugin::{
    initialize, ArtifactKind, Configuration, DiscoverySettings, DynamicHost, HostRuntime, LoadResult,
    LoaderError, PluginLoader,
};

fn config_for(install_root: &std::path::Path) -> Configuration {
    Configuration::from_lookup(DiscoverySettings::default(), |_| None).with_install_root(install_root)
}

#[test]
fn malformed_library_is_recorded_as_failed() {
    let tmp = tempfile::tempdir().unwrap();
    let kernels = tmp.path().join("core").join("kernels");
    fs::create_dir_all(&kernels).unwrap();
    fs::write(kernels.join(format!("libBad.{}", plugin_extension())), b"not a library").unwrap();
    fs::write(kernels.join(format!("libWorse.{}", plugin_extension())), b"").unwrap();

    let config = config_for(tmp.path());
    let mut host = DynamicHost::new();
    let report = initialize(&config, &mut host).unwrap();

    assert_eq!(report.outcomes().len(), 2);
    assert!(report
        .outcomes()
        .iter()
        .all(|outcome| matches!(outcome.result, LoadResult::Failed(LoaderError::LoadFailure { .. }))));
    assert!(host.handles().is_empty());
}

#[test]
fn malformed_explicit_device_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let device = tmp.path().join(format!("libdevice.{}", plugin_extension()));
    fs::write(&device, b"garbage").unwrap();

    let config = config_for(tmp.path());
    let mut host = DynamicHost::new();
    let mut loader = PluginLoader::new(&config, &mut host);

    let err = loader.load_pluggable_device(&device).unwrap_err();
    assert!(matches!(err, LoaderError::ExplicitPathInvalid { .. }));
    assert!(!host.is_loaded(&device, ArtifactKind::PluggableDevice));
}

#[test]
#[ignore = "requires PLUGHOST_TEST_DEVICE_LIBRARY pointing at a real pluggable device library"]
fn real_device_library_registers_once() {
    let Some(path) = std::env::var_os("PLUGHOST_TEST_DEVICE_LIBRARY").map(PathBuf::from) else {
        eprintln!("skipping: PLUGHOST_TEST_DEVICE_LIBRARY not set");
        return;
    };

    let config = config_for(&std::env::temp_dir());
    let mut host = DynamicHost::new();
    let mut loader = PluginLoader::new(&config, &mut host);

    let first = loader.load_pluggable_device(&path).expect("device library should load");
    assert!(first.iter().all(LoadResult::is_loaded));
    let second = loader.load_pluggable_device(&path).expect("second request should not fail");
    assert!(second.iter().all(|result| matches!(result, LoadResult::Skipped(_))));
    assert!(host.is_loaded(&path, ArtifactKind::PluggableDevice));
}
