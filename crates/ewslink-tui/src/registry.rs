//! Host capability registry the plugin wires itself into.
//!
//! Models the plugin-host handshake as a trait: each registration point
//! is a method. The two the plugin cannot work without are required;
//! the cosmetic surfaces default to accepting no-ops, which is exactly
//! what a host lacking that capability offers.

use thiserror::Error;

use ewslink_core::{Action, Reducer, StoreHandle};

use crate::component::Component;

/// Why the host refused a registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The host already holds a reducer for this plugin slice.
    #[error("a reducer is already registered")]
    ReducerAlreadyRegistered,

    /// Components cannot mount before a reducer has created the slice.
    #[error("no reducer registered yet")]
    NoReducer,
}

/// Registration surface a host offers to plugins.
pub trait HostRegistry {
    /// Install the state-slice reducer. The host creates the store and
    /// returns the handle all plugin-state reads go through.
    fn register_reducer(&mut self, reducer: Reducer) -> Result<StoreHandle, RegistryError>;

    /// Mount a root component, rendered above the host's own chrome.
    fn register_root_component(
        &mut self,
        component: Box<dyn Component>,
    ) -> Result<(), RegistryError>;

    /// Add an entry to the host's main menu.
    fn register_main_menu_entry(
        &mut self,
        _label: &str,
        _action: Action,
    ) -> Result<(), RegistryError> {
        Ok(())
    }

    /// Add a channel header button.
    fn register_channel_header_button(
        &mut self,
        _icon: &str,
        _tooltip: &str,
        _action: Action,
    ) -> Result<(), RegistryError> {
        Ok(())
    }

    /// Add an app-bar entry.
    fn register_app_bar_entry(
        &mut self,
        _icon: &str,
        _label: &str,
        _action: Action,
    ) -> Result<(), RegistryError> {
        Ok(())
    }
}
