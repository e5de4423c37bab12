// HTTP client for the Exchange plugin's server endpoints.
//
// Wraps `reqwest::Client` with plugin-scoped URL construction and the
// header conventions the host's plugin proxy expects. Response handling
// mirrors the webapp contract: test-connection bodies are parsed as JSON
// whatever the HTTP status says, and a failed credential save surfaces
// the raw body text of the non-2xx response.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{CalendarEvent, ConnectionTestResult, Credentials, RawTestResponse};

// Marker the host uses to tell plugin XHR traffic from page navigation.
const REQUESTED_WITH: &str = "X-Requested-With";
const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// Everything needed to construct a [`PluginClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Chat host root, e.g. `https://chat.example.com`.
    pub host_url: Url,
    /// Plugin identifier under the host's `/plugins/` route.
    pub plugin_id: String,
    /// Session token sent as a bearer `Authorization` header. Hosts
    /// fronted by their own auth proxy run without one.
    pub session_token: Option<SecretString>,
    pub transport: TransportConfig,
}

/// Async client for the plugin's `/api/v1` endpoints.
///
/// All requests go to `{host}/plugins/{plugin_id}/api/v1/...` and carry
/// the `X-Requested-With: XMLHttpRequest` marker as a default header.
pub struct PluginClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PluginClient {
    /// Build a client from a [`ClientConfig`].
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(REQUESTED_WITH, HeaderValue::from_static(XML_HTTP_REQUEST));
        if let Some(token) = &config.session_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|_| Error::InvalidSessionToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = config.transport.build_client(headers)?;
        let base_url = plugin_base(&config.host_url, &config.plugin_id)?;
        Ok(Self { http, base_url })
    }

    /// The plugin base URL requests are built under.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a full URL for an `/api/v1` endpoint path.
    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("api/v1/{path}"))?)
    }

    /// POST `api/v1/test-connection` with the given credentials.
    ///
    /// The body is parsed as JSON regardless of HTTP status -- the server
    /// reports test failures in-band with `{success, message}` (an
    /// `error` field stands in on some builds). A body that is not JSON
    /// at all is a [`Error::Deserialization`].
    pub async fn test_connection(
        &self,
        credentials: &Credentials,
    ) -> Result<ConnectionTestResult, Error> {
        let url = self.endpoint("test-connection")?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(credentials)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        let raw: RawTestResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        let result = raw.into_result();
        debug!(
            status = status.as_u16(),
            success = result.success,
            "test-connection reply"
        );
        Ok(result)
    }

    /// POST `api/v1/credentials`, storing the credentials server-side.
    ///
    /// 2xx means saved (the body is ignored); any other status surfaces
    /// the raw response body as the error message -- the server writes
    /// plain-text reasons.
    pub async fn save_credentials(&self, credentials: &Credentials) -> Result<(), Error> {
        let url = self.endpoint("credentials")?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(credentials)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status.is_success() {
            debug!("credentials saved");
            return Ok(());
        }

        let message = resp.text().await.unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// GET `api/v1/calendar` -- upcoming events for the stored account.
    pub async fn get_calendar(&self) -> Result<Vec<CalendarEvent>, Error> {
        let url = self.endpoint("calendar")?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Normalize the host root and plugin id into the plugin base URL.
///
/// The trailing slash matters: `Url::join` treats the base as a directory
/// only when it ends in one.
fn plugin_base(host: &Url, plugin_id: &str) -> Result<Url, Error> {
    let trimmed = host.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{trimmed}/plugins/{plugin_id}/"))?)
}
