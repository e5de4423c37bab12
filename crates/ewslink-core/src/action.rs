// Application actions.
//
// One enum for everything that can happen: host lifecycle, the plugin's
// global state slice, and the settings dialog's completions. Components
// translate input into actions; the store reduces the slice actions; the
// shell routes the rest.

use ewslink_api::{ConnectionTestResult, Credentials};

/// Every action the application can dispatch.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Host lifecycle ──────────────────────────────────────────────
    /// Stop the event loop and exit.
    Quit,
    /// Periodic tick for animations.
    Tick,
    /// Redraw the UI.
    Render,
    /// Terminal resized to (width, height).
    Resize(u16, u16),

    // ── Plugin state slice ──────────────────────────────────────────
    /// Open the Exchange settings dialog.
    OpenSettings,
    /// Close the Exchange settings dialog.
    CloseSettings,
    /// Record credentials the server accepted.
    SetCredentials(Credentials),
    /// Record that a connection test was requested.
    TestConnection(Credentials),

    // ── Settings dialog completions ─────────────────────────────────
    /// A connection test finished. `revision` is the form revision the
    /// request was started under; the dialog discards stale completions.
    SettingsTestResult {
        revision: u64,
        result: ConnectionTestResult,
    },
    /// A credential save finished.
    SettingsSaveResult {
        revision: u64,
        result: ConnectionTestResult,
    },
    /// The post-save timer fired; close the dialog if nothing changed.
    SettingsAutoClose { revision: u64 },
}
