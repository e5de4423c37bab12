use thiserror::Error;

/// Top-level error type for the `ewslink-api` crate.
///
/// Covers transport failures, client construction, and failures reported
/// by the plugin's server endpoints. The UI layer maps these into the
/// fixed user-facing messages shown in the settings dialog.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Session token contains bytes that cannot go into a header value.
    #[error("Invalid session token")]
    InvalidSessionToken,

    // ── Server ──────────────────────────────────────────────────────
    /// Non-2xx response from a plugin endpoint. `message` carries the raw
    /// response body so callers can surface it verbatim.
    #[error("Plugin API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the failure happened before any server reply
    /// could be read (the dialog shows its generic connectivity message
    /// for these).
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_decode(),
            Self::Tls(_) => true,
            _ => false,
        }
    }

    /// HTTP status of a server-reported failure, if any.
    pub fn api_status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
