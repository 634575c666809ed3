//! Headless probe for the update facade.
//!
//! Loads the updater config, reports which backend is active and whether it
//! can reach a checker, then runs one `init` → optional check → `shutdown`
//! cycle. The background check honours the config's `check_interval_hours`
//! against the saved preferences. The final state is printed as JSON on
//! stdout; all tracing output goes to stderr.

use std::path::PathBuf;

use anyhow::Context;
use fae_updater::update::PreferenceStore;
use fae_updater::{UpdateManager, UpdaterConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Status,
    Interactive,
    Background,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (probe, config_path) = parse_args(&args)?;

    let config_path = config_path.unwrap_or_else(UpdaterConfig::default_config_path);
    let config = UpdaterConfig::from_file(&config_path)
        .with_context(|| format!("cannot load updater config {}", config_path.display()))?;
    if !config.is_complete() {
        anyhow::bail!(
            "updater config {} needs both feed_url and verification_key",
            config_path.display()
        );
    }

    let mut manager = UpdateManager::for_current_platform();
    if let Some(store) = PreferenceStore::default_location() {
        manager = manager.with_preferences(store);
    }
    tracing::info!(capability = ?manager.capability(), "fae-update-probe starting");

    let status = manager
        .init_from_config(&config)
        .context("update manager failed to initialize")?;
    tracing::info!(?status, "init finished");

    let request = match probe {
        Probe::Status => None,
        Probe::Interactive => Some(manager.check_interactive()),
        Probe::Background => Some(manager.check_background_if_due(config.check_interval_hours)),
    };

    let report = serde_json::json!({
        "init": status,
        "request": request,
        "state": manager.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    manager.shutdown();
    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<(Probe, Option<PathBuf>)> {
    let mut probe = Probe::Status;
    let mut config = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "status" => probe = Probe::Status,
            "interactive" => probe = Probe::Interactive,
            "background" => probe = Probe::Background,
            "--config" => {
                let path = iter.next().context("--config requires a path")?;
                config = Some(PathBuf::from(path));
            }
            "help" | "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument `{other}` (use status|interactive|background)"),
        }
    }
    Ok((probe, config))
}

fn print_usage() {
    println!("usage: fae-update-probe [status|interactive|background] [--config <path>]");
}
