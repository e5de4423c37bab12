//! Configuration for the ewslink shell.
//!
//! TOML file + `EWSLINK_`-prefixed environment overlays, session-token
//! resolution, and translation to `ewslink_api::ClientConfig`. The
//! binary layers its CLI flags on top of what this crate loads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ewslink_api::{ClientConfig, TlsMode, TransportConfig};

/// Environment variable consulted when no explicit token source is set.
pub const SESSION_TOKEN_VAR: &str = "EWSLINK_SESSION_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Connection to the chat host.
    #[serde(default)]
    pub host: HostConfig,

    /// Debug switches; see [`DebugOptions`].
    #[serde(default)]
    pub debug: DebugOptions,
}

/// Where the plugin's server half lives and how to reach it.
#[derive(Debug, Deserialize, Serialize)]
pub struct HostConfig {
    /// Chat host base URL.
    #[serde(default = "default_host_url")]
    pub url: String,

    /// Plugin identifier under the host's `/plugins/` route.
    #[serde(default = "default_plugin_id")]
    pub plugin_id: String,

    /// Session token (plaintext -- prefer the env var).
    pub session_token: Option<String>,

    /// Environment variable name containing the session token.
    pub session_token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification (lab hosts behind self-signed certs).
    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            url: default_host_url(),
            plugin_id: default_plugin_id(),
            session_token: None,
            session_token_env: None,
            ca_cert: None,
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_host_url() -> String {
    "http://localhost:8065".into()
}
fn default_plugin_id() -> String {
    "com.ewslink.exchange".into()
}
fn default_timeout() -> u64 {
    30
}

/// Debug switches, injected into the shell at startup rather than read
/// from process-wide globals. All off by default; the CLI can flip them
/// per run.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct DebugOptions {
    /// Open the settings dialog immediately after startup.
    #[serde(default)]
    pub open_settings_on_start: bool,

    /// Mirror every dispatched action to the log.
    #[serde(default)]
    pub log_actions: bool,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "ewslink", "ewslink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ewslink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full [`Config`] from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load a [`Config`] layered over the given TOML file.
///
/// Defaults → file → `EWSLINK_*` environment, last writer wins.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("EWSLINK_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults if the file is absent or broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Session token resolution ────────────────────────────────────────

/// Resolve the session token: the profile's named env var first, then
/// [`SESSION_TOKEN_VAR`], then plaintext config. `None` when the host
/// needs no token (auth proxy in front).
pub fn resolve_session_token(host: &HostConfig) -> Option<SecretString> {
    if let Some(ref env_name) = host.session_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(val) = std::env::var(SESSION_TOKEN_VAR) {
        return Some(SecretString::from(val));
    }

    host.session_token.clone().map(SecretString::from)
}

// ── Client settings ─────────────────────────────────────────────────

/// Build the api crate's [`ClientConfig`] from a loaded [`Config`].
pub fn client_config(config: &Config) -> Result<ClientConfig, ConfigError> {
    let host_url: url::Url = config
        .host
        .url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "host.url".into(),
            reason: format!("invalid URL: {}", config.host.url),
        })?;

    if config.host.plugin_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host.plugin_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let tls = if config.host.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = config.host.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    Ok(ClientConfig {
        host_url,
        plugin_id: config.host.plugin_id.clone(),
        session_token: resolve_session_token(&config.host),
        transport: TransportConfig {
            tls,
            timeout: Duration::from_secs(config.host.timeout),
        },
    })
}
