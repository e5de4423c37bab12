// The plugin slice reducer.
//
// Pure: no I/O, no clock access, no logging. The host dispatches far
// more actions than the slice cares about; anything unrecognized returns
// the state unchanged.

use crate::action::Action;
use crate::state::PluginState;

/// Apply `action` to `state`, returning the next state.
pub fn reduce(mut state: PluginState, action: &Action) -> PluginState {
    match action {
        Action::OpenSettings => {
            state.is_settings_open = true;
        }
        Action::CloseSettings => {
            state.is_settings_open = false;
            state.connection_test_result = None;
        }
        Action::SetCredentials(credentials) => {
            state.credentials = Some(credentials.clone());
        }
        Action::TestConnection(_) => {
            state.is_testing_connection = true;
            state.connection_test_result = None;
        }
        _ => {}
    }
    state
}
