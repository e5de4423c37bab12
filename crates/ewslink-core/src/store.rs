// Host-side store for the plugin slice.
//
// The host creates one store per registered reducer and hands back a
// shared handle. That handle is the single way components read plugin
// state; nothing reaches into host internals around it.

use std::sync::{Arc, PoisonError, RwLock};

use crate::action::Action;
use crate::state::PluginState;

/// Reducer function registered with the host.
pub type Reducer = fn(PluginState, &Action) -> PluginState;

/// Shared, cheaply clonable handle to a [`Store`].
pub type StoreHandle = Arc<Store>;

/// Holds the plugin slice and applies the registered reducer to it.
pub struct Store {
    reducer: Reducer,
    state: RwLock<PluginState>,
}

impl Store {
    /// Create a store over the default initial state.
    pub fn new(reducer: Reducer) -> StoreHandle {
        Arc::new(Self {
            reducer,
            state: RwLock::new(PluginState::default()),
        })
    }

    /// Run the reducer over the current state.
    pub fn apply(&self, action: &Action) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let next = (self.reducer)(std::mem::take(&mut *state), action);
        *state = next;
    }

    /// Clone of the current slice.
    pub fn snapshot(&self) -> PluginState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the settings dialog should be showing.
    pub fn is_settings_open(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_settings_open
    }
}
