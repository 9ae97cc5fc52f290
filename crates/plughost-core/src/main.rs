use anyhow::{Context, Result};
use clap::Parser;
use plughost_plugin::{
    initialize, Configuration, DiscoveryPlan, DiscoverySettings, DynamicHost, InitReport,
    LoadResult, PluginLoader,
};

mod cli;
use cli::Args;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("PLUGHOST_LOG")
                .unwrap_or_else(|_| "plughost=info,plughost_plugin=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "plughost starting");

    let config = load_configuration(&args)?;

    match args.command {
        cli::Command::Dirs => print_dirs(&config, args.json),
        cli::Command::Scan => print_scan(&config, args.json),
        cli::Command::Load => load(&config, args.json),
        cli::Command::Device { ref path } => load_device(&config, path, args.json),
    }
}

fn load_configuration(args: &Args) -> Result<Configuration> {
    let discovery = match &args.config {
        Some(path) => DiscoverySettings::load(path)?,
        None => DiscoverySettings::default(),
    };
    let mut config = Configuration::from_env(discovery);
    if let Some(root) = &args.install_root {
        config = config.with_install_root(root);
    }
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn print_dirs(config: &Configuration, json: bool) -> Result<()> {
    let plan = DiscoveryPlan::for_config(config);
    if json {
        println!("{}", serde_json::to_string_pretty(&plan.directories)?);
        return Ok(());
    }
    for directory in &plan.directories {
        let state = if directory.path().is_dir() { "" } else { " (missing)" };
        println!(
            "{:?}\t{}{}",
            directory.origin(),
            directory.path().display(),
            state
        );
    }
    Ok(())
}

fn print_scan(config: &Configuration, json: bool) -> Result<()> {
    let plan = DiscoveryPlan::for_config(config);
    let artifacts: Vec<_> = plan.artifacts(config).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&artifacts)?);
        return Ok(());
    }
    for artifact in &artifacts {
        println!("{}\t{}", artifact.kind, artifact.path.display());
    }
    Ok(())
}

fn load(config: &Configuration, json: bool) -> Result<()> {
    let mut host = DynamicHost::new();
    let report = initialize(config, &mut host).context("explicitly configured device failed to load")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn load_device(config: &Configuration, path: &std::path::Path, json: bool) -> Result<()> {
    let mut host = DynamicHost::new();
    let mut loader = PluginLoader::new(config, &mut host);
    let results = loader.load_pluggable_device(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            print_result(&path.display().to_string(), result);
        }
    }
    Ok(())
}

fn print_report(report: &InitReport) {
    for outcome in report.outcomes() {
        print_result(&outcome.artifact.path.display().to_string(), &outcome.result);
    }
    for result in report.explicit_device() {
        print_result("TF_PLUGGABLE_DEVICE_LIBRARY_PATH", result);
    }
    println!(
        "loaded {}, failed {}, skipped {}",
        report.loaded().count(),
        report.failed().count(),
        report.skipped().count()
    );
}

fn print_result(label: &str, result: &LoadResult) {
    match result {
        LoadResult::Loaded(handle) => println!("loaded\t{}\t{}", handle.kind, handle.path.display()),
        LoadResult::Skipped(reason) => println!("skipped\t{label}\t{reason}"),
        LoadResult::Failed(error) => println!("failed\t{label}\t{error}"),
    }
}
