// ewslink-core: state slice, actions, and reducer for the ewslink plugin

pub mod action;
pub mod reducer;
pub mod state;
pub mod store;

pub use action::Action;
pub use reducer::reduce;
pub use state::PluginState;
pub use store::{Reducer, Store, StoreHandle};

// Wire types travel with the slice; re-exported so UI code needs one import.
pub use ewslink_api::{ConnectionTestResult, Credentials};
