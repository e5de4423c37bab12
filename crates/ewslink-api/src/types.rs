// Wire types for the plugin's /api/v1 endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Shown when a test-connection reply carries neither `message` nor `error`.
pub const NO_DETAILS_MESSAGE: &str = "No details provided by the server";

/// Exchange account credentials as entered in the settings dialog.
///
/// The password lives in a [`SecretString`]: `Debug` redacts it, and it is
/// exposed only at the serialization boundary when a request body is
/// built. `domain` may be empty.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub domain: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            domain: domain.into(),
        }
    }

    /// Whether the mandatory fields are filled in: a non-blank username
    /// and a non-empty password. The domain is optional.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("domain", &self.domain)
            .finish()
    }
}

impl Serialize for Credentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Credentials", 3)?;
        state.serialize_field("username", &self.username)?;
        state.serialize_field("password", self.password.expose_secret())?;
        state.serialize_field("domain", &self.domain)?;
        state.end()
    }
}

/// Outcome of a connection test or credential save, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
}

impl ConnectionTestResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Lenient wire form of a test-connection reply.
///
/// The server normally writes `{success, message}`, but any subset of
/// fields is accepted; [`Self::into_result`] applies the documented
/// fallbacks (`error` stands in for a missing `message`, then the fixed
/// default).
#[derive(Debug, Deserialize)]
pub(crate) struct RawTestResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl RawTestResponse {
    pub(crate) fn into_result(self) -> ConnectionTestResult {
        ConnectionTestResult {
            success: self.success.unwrap_or(false),
            message: self
                .message
                .or(self.error)
                .unwrap_or_else(|| NO_DETAILS_MESSAGE.to_string()),
        }
    }
}

/// A calendar entry from the connected Exchange account.
///
/// `start`/`end` are the server's ISO-8601 strings, passed through
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub subject: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub is_meeting: bool,
    #[serde(default)]
    pub status: String,
}
