use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn plughost(install_root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_plughost"))
        .args(args)
        .arg("--install-root")
        .arg(install_root)
        .env_remove("TF_PLUGGABLE_DEVICE_LIBRARY_PATH")
        .env_remove("TF_USE_MODULAR_FILESYSTEM")
        .env_remove("PLUGHOST_SEARCH_PATH")
        .env_remove("PLUGHOST_USER_SITE")
        .env_remove("PLUGHOST_SITE_PACKAGES")
        .env_remove("PLUGHOST_CONFIG")
        .env("PLUGHOST_LOG", "plughost=warn,plughost_plugin=warn")
        .output()
        .expect("failed to run plughost binary")
}

fn lib(stem: &str) -> String {
    let ext = if cfg!(target_os = "windows") {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    };
    format!("{stem}.{ext}")
}

#[test]
fn dirs_lists_first_party_kernel_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let output = plughost(tmp.path(), &["dirs", "--json"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr:\n{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("first_party"), "stdout:\n{stdout}");
    assert!(stdout.contains("kernels"), "stdout:\n{stdout}");
}

#[test]
fn load_survives_a_broken_kernel() {
    let tmp = tempfile::tempdir().unwrap();
    let kernels = tmp.path().join("core").join("kernels");
    fs::create_dir_all(&kernels).unwrap();
    fs::write(kernels.join(lib("libBad")), b"not a library").unwrap();

    let output = plughost(tmp.path(), &["load"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr:\n{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("failed"), "stdout:\n{stdout}");
    assert!(stdout.contains("loaded 0, failed 1, skipped 1"), "stdout:\n{stdout}");
}

#[test]
fn device_with_missing_path_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join(lib("libnope"));
    let output = plughost(tmp.path(), &["device", missing.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn missing_config_file_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("missing.toml");
    let output = plughost(tmp.path(), &["dirs", "--config", missing.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("failed to read config"), "stderr:\n{stderr}");
}
