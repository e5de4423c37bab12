use ewslink_api::{ConnectionTestResult, Credentials};

/// The plugin's slice of host state.
///
/// Mutated only by [`crate::reduce`]; read through the store handle the
/// host returns at reducer registration.
#[derive(Debug, Clone, Default)]
pub struct PluginState {
    /// Whether the settings dialog is open.
    pub is_settings_open: bool,
    /// Last credentials the server accepted, if any.
    pub credentials: Option<Credentials>,
    /// Set when a connection test is requested. No action clears it --
    /// the dialog keeps its own in-flight flags and this field is a
    /// record, not a busy indicator.
    pub is_testing_connection: bool,
    /// Last connection test outcome; cleared when the dialog closes or a
    /// new test starts.
    pub connection_test_result: Option<ConnectionTestResult>,
}
