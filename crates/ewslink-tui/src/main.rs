//! `ewslink` — terminal host shell for the Exchange credentials plugin.
//!
//! A minimal chat-host stand-in: it owns the store and action loop,
//! exposes the registration surfaces plugins expect, and hosts the
//! Exchange settings dialog as its root component. Built on
//! [ratatui](https://ratatui.rs).
//!
//! Logs are written to a file (default `/tmp/ewslink.log`) to avoid
//! corrupting the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and
//! app launch.

mod app;
mod component;
mod event;
mod plugin;
mod registry;
mod settings_dialog;
mod theme;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ewslink_api::PluginClient;
use ewslink_config::{client_config, load_config_or_default};

use crate::app::App;
use crate::plugin::ExchangePlugin;

/// Terminal host shell for the ewslink Exchange integration plugin.
#[derive(Parser, Debug)]
#[command(name = "ewslink", version, about)]
struct Cli {
    /// Chat host base URL (e.g., https://chat.example.com)
    #[arg(short = 'u', long, env = "EWSLINK_HOST_URL")]
    host_url: Option<String>,

    /// Plugin identifier on the host
    #[arg(long, env = "EWSLINK_PLUGIN_ID")]
    plugin_id: Option<String>,

    /// Session token for authenticated requests
    #[arg(long, env = "EWSLINK_SESSION_TOKEN", hide_env = true)]
    session_token: Option<String>,

    /// Log file path (defaults to /tmp/ewslink.log)
    #[arg(long, default_value = "/tmp/ewslink.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Open the settings dialog immediately after startup
    #[arg(long, hide = true)]
    open_settings: bool,

    /// Log every dispatched action at debug level
    #[arg(long, hide = true)]
    log_actions: bool,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that
/// would corrupt the TUI output. Returns a guard that must be held for
/// the lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ewslink={log_level}")));

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("ewslink.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    let mut config = load_config_or_default();
    if let Some(url) = &cli.host_url {
        config.host.url.clone_from(url);
    }
    if let Some(plugin_id) = &cli.plugin_id {
        config.host.plugin_id.clone_from(plugin_id);
    }
    if let Some(token) = &cli.session_token {
        config.host.session_token = Some(token.clone());
    }
    config.debug.open_settings_on_start |= cli.open_settings;
    config.debug.log_actions |= cli.log_actions;

    info!(
        host = %config.host.url,
        plugin_id = %config.host.plugin_id,
        "starting ewslink"
    );

    let client_config = client_config(&config)?;
    let client = PluginClient::new(&client_config)?;

    let mut app = App::new(config.debug);
    ExchangePlugin::new(client).register(&mut app)?;

    app.run().await
}
