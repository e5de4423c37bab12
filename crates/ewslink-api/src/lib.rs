// ewslink-api: Async HTTP client for the ewslink Exchange plugin endpoints

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{ClientConfig, PluginClient};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{CalendarEvent, ConnectionTestResult, Credentials, NO_DETAILS_MESSAGE};
