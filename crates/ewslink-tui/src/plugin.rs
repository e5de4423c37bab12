//! Plugin bootstrap — wires the Exchange surfaces into a host registry.

use std::sync::Arc;

use tracing::{debug, info, warn};

use ewslink_api::PluginClient;
use ewslink_core::{Action, StoreHandle, reduce};

use crate::registry::{HostRegistry, RegistryError};
use crate::settings_dialog::SettingsDialog;

const MENU_LABEL: &str = "Exchange Settings";
const HEADER_ICON: &str = "\u{1F4E7}"; // 📧
const HEADER_TOOLTIP: &str = "Exchange Integration Settings";
const APP_BAR_LABEL: &str = "Exchange Integration";

/// The Exchange credentials plugin.
///
/// Owns the HTTP client; everything else lives in the host once
/// [`Self::register`] has run.
pub struct ExchangePlugin {
    client: Arc<PluginClient>,
}

impl ExchangePlugin {
    pub fn new(client: PluginClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Register the reducer, the settings dialog, and every UI trigger.
    ///
    /// The reducer and root component are load-bearing, so their errors
    /// propagate. Menu, header and app-bar entries are cosmetic: a host
    /// that refuses one gets a warning and registration keeps going.
    /// Every trigger dispatches [`Action::OpenSettings`].
    pub fn register(self, host: &mut impl HostRegistry) -> Result<StoreHandle, RegistryError> {
        let store = host.register_reducer(reduce)?;
        debug!("reducer registered");

        let dialog = SettingsDialog::new(Arc::clone(&self.client), StoreHandle::clone(&store));
        host.register_root_component(Box::new(dialog))?;
        debug!("settings dialog mounted");

        if let Err(e) = host.register_main_menu_entry(MENU_LABEL, Action::OpenSettings) {
            warn!("main menu entry refused: {e}");
        }
        if let Err(e) =
            host.register_channel_header_button(HEADER_ICON, HEADER_TOOLTIP, Action::OpenSettings)
        {
            warn!("channel header button refused: {e}");
        }
        if let Err(e) = host.register_app_bar_entry(HEADER_ICON, APP_BAR_LABEL, Action::OpenSettings)
        {
            warn!("app bar entry refused: {e}");
        }

        info!("Exchange plugin registered");
        Ok(store)
    }
}
