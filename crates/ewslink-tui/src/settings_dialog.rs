//! Exchange settings dialog — enter, test, and save account credentials.
//!
//! Renders only while the store reports the slice open; the store is the
//! sole visibility source. Test and save run as spawned HTTP calls whose
//! completions come back through the action channel tagged with the form
//! revision they started under, so anything the user edited past is
//! discarded on arrival.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use ewslink_api::{Error, PluginClient};
use ewslink_core::{Action, ConnectionTestResult, Credentials, StoreHandle};

use crate::component::Component;
use crate::theme;

const TEST_VALIDATION_MESSAGE: &str = "Please fill in both username and password";
const SAVE_VALIDATION_MESSAGE: &str = "Please fill in all required fields";
const CONNECTIVITY_FAILURE_MESSAGE: &str = "Could not reach the server";
const SAVE_SUCCESS_MESSAGE: &str = "Credentials saved successfully!";
const SAVE_FAILURE_MESSAGE: &str = "Failed to save credentials";

/// How long a saved dialog lingers before closing itself.
const AUTO_CLOSE_DELAY: Duration = Duration::from_millis(2000);

// ── Types ────────────────────────────────────────────────────────────

/// Which form field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogField {
    Username,
    Password,
    Domain,
}

impl DialogField {
    const ALL: [DialogField; 3] = [Self::Username, Self::Password, Self::Domain];

    fn label(self) -> &'static str {
        match self {
            Self::Username => "Username *",
            Self::Password => "Password *",
            Self::Domain => "Domain (optional)",
        }
    }
}

// ── Component ────────────────────────────────────────────────────────

pub struct SettingsDialog {
    action_tx: Option<UnboundedSender<Action>>,
    client: Arc<PluginClient>,
    store: StoreHandle,
    active_field: DialogField,
    username_input: String,
    password_input: String,
    domain_input: String,
    show_password: bool,
    /// Connection test in flight. Blocks re-entry of the test only.
    testing: bool,
    /// Credential save in flight. Blocks re-entry of the save only.
    saving: bool,
    /// Bumped on every edit, open reset, and close. Completions carry
    /// the revision they started under; a mismatch means stale.
    revision: u64,
    /// Outcome currently shown, local to the dialog.
    result: Option<ConnectionTestResult>,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl SettingsDialog {
    pub fn new(client: Arc<PluginClient>, store: StoreHandle) -> Self {
        Self {
            action_tx: None,
            client,
            store,
            active_field: DialogField::Username,
            username_input: String::new(),
            password_input: String::new(),
            domain_input: String::new(),
            show_password: false,
            testing: false,
            saving: false,
            revision: 0,
            result: None,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    fn visible(&self) -> bool {
        self.store.is_settings_open()
    }

    fn credentials(&self) -> Credentials {
        Credentials::new(
            self.username_input.clone(),
            self.password_input.clone(),
            self.domain_input.clone(),
        )
    }

    /// An edit happened: drop the shown outcome and stale out anything
    /// still in flight.
    fn touch(&mut self) {
        self.revision += 1;
        self.result = None;
    }

    // ── Field navigation ─────────────────────────────────────────────

    fn focus_next(&mut self) {
        let pos = DialogField::ALL
            .iter()
            .position(|&f| f == self.active_field)
            .unwrap_or(0);
        self.active_field = DialogField::ALL[(pos + 1) % DialogField::ALL.len()];
    }

    fn focus_prev(&mut self) {
        let pos = DialogField::ALL
            .iter()
            .position(|&f| f == self.active_field)
            .unwrap_or(0);
        self.active_field =
            DialogField::ALL[(pos + DialogField::ALL.len() - 1) % DialogField::ALL.len()];
    }

    fn active_input_mut(&mut self) -> &mut String {
        match self.active_field {
            DialogField::Username => &mut self.username_input,
            DialogField::Password => &mut self.password_input,
            DialogField::Domain => &mut self.domain_input,
        }
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Kick off a connection test against the current form values.
    ///
    /// Ignored while one is already in flight. Validation failures show
    /// a fixed message and never touch the network.
    fn start_test(&mut self) {
        if self.testing {
            return;
        }

        let credentials = self.credentials();
        if !credentials.is_complete() {
            self.result = Some(ConnectionTestResult::failure(TEST_VALIDATION_MESSAGE));
            return;
        }

        let Some(tx) = self.action_tx.clone() else {
            return;
        };

        self.result = None;
        self.testing = true;
        let _ = tx.send(Action::TestConnection(credentials.clone()));

        let revision = self.revision;
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            let result = match client.test_connection(&credentials).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("connection test failed: {e}");
                    ConnectionTestResult::failure(CONNECTIVITY_FAILURE_MESSAGE)
                }
            };
            let _ = tx.send(Action::SettingsTestResult { revision, result });
        });
    }

    /// Kick off a credential save. Same shape as the test, guarded by
    /// its own flag; an in-flight test does not block it.
    fn start_save(&mut self) {
        if self.saving {
            return;
        }

        let credentials = self.credentials();
        if !credentials.is_complete() {
            self.result = Some(ConnectionTestResult::failure(SAVE_VALIDATION_MESSAGE));
            return;
        }

        let Some(tx) = self.action_tx.clone() else {
            return;
        };

        self.result = None;
        self.saving = true;

        let revision = self.revision;
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            let result = match client.save_credentials(&credentials).await {
                Ok(()) => {
                    // The server accepted these; the slice records that
                    // even if the form has moved on since.
                    let _ = tx.send(Action::SetCredentials(credentials));
                    ConnectionTestResult::ok(SAVE_SUCCESS_MESSAGE)
                }
                Err(e) => {
                    warn!("credential save failed: {e}");
                    save_failure(&e)
                }
            };
            let _ = tx.send(Action::SettingsSaveResult { revision, result });
        });
    }

    /// Close the dialog a moment after a successful save, unless the
    /// user edits or closes it first.
    fn schedule_auto_close(&self) {
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let revision = self.revision;
        tokio::spawn(async move {
            tokio::time::sleep(AUTO_CLOSE_DELAY).await;
            let _ = tx.send(Action::SettingsAutoClose { revision });
        });
    }

    // ── Rendering ────────────────────────────────────────────────────

    #[allow(clippy::unused_self)]
    fn render_panel(&self, frame: &mut Frame, area: Rect) -> Rect {
        let panel_w = 58u16.min(area.width.saturating_sub(4));
        let panel_h = 20u16.min(area.height.saturating_sub(2));
        let x = (area.width.saturating_sub(panel_w)) / 2;
        let y = (area.height.saturating_sub(panel_h)) / 2;
        let panel = Rect::new(area.x + x, area.y + y, panel_w, panel_h);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_PANEL)),
            panel,
        );

        let block = Block::default()
            .title(Line::from(vec![
                Span::raw(" \u{1F4E7} "),
                Span::styled("Exchange Settings", theme::title_style()),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(panel);
        frame.render_widget(block, panel);
        inner
    }

    fn render_input(&self, frame: &mut Frame, area: Rect, field: DialogField) {
        if area.height < 4 {
            return;
        }
        let active = self.active_field == field;

        let label_style = if active {
            Style::default().fg(theme::ACCENT_BLUE)
        } else {
            Style::default().fg(theme::FG_MUTED)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(field.label(), label_style)),
            Rect::new(area.x, area.y, area.width, 1),
        );

        let box_area = Rect::new(area.x, area.y + 1, area.width, 3);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if active {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let text_area = block.inner(box_area);
        frame.render_widget(block, box_area);

        let value = match field {
            DialogField::Username => &self.username_input,
            DialogField::Password => &self.password_input,
            DialogField::Domain => &self.domain_input,
        };
        let masked = field == DialogField::Password && !self.show_password;
        let mut shown = if masked {
            "\u{25CF}".repeat(value.chars().count())
        } else {
            value.clone()
        };
        if active {
            shown.push('\u{2588}');
        }
        frame.render_widget(
            Paragraph::new(Span::styled(shown, Style::default().fg(theme::FG_DEFAULT))),
            text_area,
        );
    }

    fn render_outcome(&self, frame: &mut Frame, area: Rect) {
        if self.testing || self.saving {
            let label = if self.testing {
                "  Testing connection..."
            } else {
                "  Saving..."
            };
            let throbber = throbber_widgets_tui::Throbber::default()
                .label(label)
                .style(Style::default().fg(theme::AMBER))
                .throbber_style(Style::default().fg(theme::SOFT_VIOLET));
            frame.render_stateful_widget(throbber, area, &mut self.throbber_state.clone());
            return;
        }

        if let Some(ref result) = self.result {
            let style = if result.success {
                theme::success()
            } else {
                theme::error()
            };
            frame.render_widget(
                Paragraph::new(Span::styled(result.message.as_str(), style))
                    .alignment(Alignment::Center),
                area,
            );
        }
    }

    fn render_hints(&self, frame: &mut Frame, area: Rect) {
        let hints = if self.active_field == DialogField::Password {
            "Ctrl+U reveal  Tab next  Ctrl+T test  Enter save  Esc close"
        } else {
            "Tab next  Shift+Tab prev  Ctrl+T test  Enter save  Esc close"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(hints, theme::key_hint())).alignment(Alignment::Center),
            area,
        );
    }
}

fn save_failure(error: &Error) -> ConnectionTestResult {
    match error {
        Error::Api { message, .. } if !message.is_empty() => {
            ConnectionTestResult::failure(message.clone())
        }
        Error::Api { .. } => ConnectionTestResult::failure(SAVE_FAILURE_MESSAGE),
        _ => ConnectionTestResult::failure(CONNECTIVITY_FAILURE_MESSAGE),
    }
}

// ── Component impl ───────────────────────────────────────────────────

impl Component for SettingsDialog {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.visible() {
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => return Ok(Some(Action::CloseSettings)),
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_prev(),
            KeyCode::Enter => self.start_save(),
            KeyCode::Backspace => {
                self.active_input_mut().pop();
                self.touch();
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    match c {
                        't' => self.start_test(),
                        's' => self.start_save(),
                        'u' => self.show_password = !self.show_password,
                        _ => {}
                    }
                } else {
                    self.active_input_mut().push(c);
                    self.touch();
                }
            }
            _ => {}
        }

        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SettingsTestResult { revision, result } => {
                self.testing = false;
                if *revision == self.revision && self.visible() {
                    self.result = Some(result.clone());
                } else {
                    debug!("discarding stale connection test result");
                }
            }

            Action::SettingsSaveResult { revision, result } => {
                self.saving = false;
                if *revision == self.revision && self.visible() {
                    self.result = Some(result.clone());
                    if result.success {
                        self.schedule_auto_close();
                    }
                } else {
                    debug!("discarding stale save result");
                }
            }

            Action::SettingsAutoClose { revision } => {
                if *revision == self.revision && self.visible() {
                    debug!("auto-closing the settings dialog");
                    return Ok(Some(Action::CloseSettings));
                }
            }

            Action::OpenSettings => {
                self.active_field = DialogField::Username;
                self.show_password = false;
            }

            Action::CloseSettings => {
                self.result = None;
                self.revision += 1;
            }

            Action::Tick => {
                if self.testing || self.saving {
                    self.throbber_state.calc_next();
                }
            }

            _ => {}
        }

        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if !self.visible() {
            return;
        }

        let inner = self.render_panel(frame, area);

        let layout = Layout::vertical([
            Constraint::Length(1), // spacer
            Constraint::Length(4), // username
            Constraint::Length(4), // password
            Constraint::Length(4), // domain
            Constraint::Length(1), // spacer
            Constraint::Length(1), // outcome / busy line
            Constraint::Min(0),   // filler
            Constraint::Length(1), // key hints
        ])
        .split(inner);

        self.render_input(frame, layout[1], DialogField::Username);
        self.render_input(frame, layout[2], DialogField::Password);
        self.render_input(frame, layout[3], DialogField::Domain);
        self.render_outcome(frame, layout[5]);
        self.render_hints(frame, layout[7]);
    }

    fn id(&self) -> &'static str {
        "settings-dialog"
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use ewslink_api::{ClientConfig, TransportConfig};
    use ewslink_core::{Store, reduce};

    use super::*;

    const TEST_PATH: &str = "/plugins/com.ewslink.exchange/api/v1/test-connection";
    const SAVE_PATH: &str = "/plugins/com.ewslink.exchange/api/v1/credentials";

    fn dialog_for(uri: &str) -> (SettingsDialog, StoreHandle, UnboundedReceiver<Action>) {
        let config = ClientConfig {
            host_url: Url::parse(uri).unwrap(),
            plugin_id: "com.ewslink.exchange".into(),
            session_token: None,
            transport: TransportConfig::default(),
        };
        let client = PluginClient::new(&config).unwrap();

        let store = Store::new(reduce);
        let mut dialog = SettingsDialog::new(Arc::new(client), StoreHandle::clone(&store));

        let (tx, rx) = mpsc::unbounded_channel();
        dialog.init(tx).unwrap();

        store.apply(&Action::OpenSettings);
        (dialog, store, rx)
    }

    async fn setup() -> (MockServer, SettingsDialog, StoreHandle, UnboundedReceiver<Action>) {
        let server = MockServer::start().await;
        let (dialog, store, rx) = dialog_for(&server.uri());
        (server, dialog, store, rx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(dialog: &mut SettingsDialog, text: &str) {
        for c in text.chars() {
            dialog.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn fill_form(dialog: &mut SettingsDialog) {
        type_text(dialog, "svc-cal");
        dialog.handle_key_event(key(KeyCode::Tab)).unwrap();
        type_text(dialog, "hunter2");
        dialog.handle_key_event(key(KeyCode::Tab)).unwrap();
        type_text(dialog, "CORP");
    }

    async fn recv(rx: &mut UnboundedReceiver<Action>) -> Action {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for an action")
            .expect("action channel closed")
    }

    // ── Validation ───────────────────────────────────────────────────

    #[tokio::test]
    async fn a_test_without_a_username_never_touches_the_network() {
        let (server, mut dialog, _store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(TEST_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        dialog.handle_key_event(key(KeyCode::Tab)).unwrap();
        type_text(&mut dialog, "hunter2");
        dialog.handle_key_event(ctrl('t')).unwrap();

        assert_eq!(
            dialog.result,
            Some(ConnectionTestResult::failure(TEST_VALIDATION_MESSAGE))
        );
        assert!(!dialog.testing);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn a_save_without_a_password_never_touches_the_network() {
        let (server, mut dialog, _store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(SAVE_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        type_text(&mut dialog, "svc-cal");
        dialog.handle_key_event(key(KeyCode::Enter)).unwrap();

        assert_eq!(
            dialog.result,
            Some(ConnectionTestResult::failure(SAVE_VALIDATION_MESSAGE))
        );
        assert!(!dialog.saving);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    // ── Connection test ──────────────────────────────────────────────

    #[tokio::test]
    async fn a_test_surfaces_the_server_verdict_verbatim() {
        let (server, mut dialog, store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(TEST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "Connection successful",
            })))
            .expect(1)
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('t')).unwrap();
        assert!(dialog.testing);

        let requested = recv(&mut rx).await;
        assert!(matches!(requested, Action::TestConnection(_)));
        store.apply(&requested);
        assert!(store.snapshot().is_testing_connection);

        let completion = recv(&mut rx).await;
        dialog.update(&completion).unwrap();

        assert!(!dialog.testing);
        assert_eq!(
            dialog.result,
            Some(ConnectionTestResult::ok("Connection successful"))
        );
    }

    #[tokio::test]
    async fn a_non_json_test_reply_maps_to_the_connectivity_message() {
        let (server, mut dialog, _store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(TEST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('t')).unwrap();
        let _requested = recv(&mut rx).await;

        let completion = recv(&mut rx).await;
        dialog.update(&completion).unwrap();

        assert_eq!(
            dialog.result,
            Some(ConnectionTestResult::failure(CONNECTIVITY_FAILURE_MESSAGE))
        );
    }

    #[tokio::test]
    async fn an_unreachable_server_maps_to_the_connectivity_message() {
        // Nothing listens on port 1
        let (mut dialog, _store, mut rx) = dialog_for("http://127.0.0.1:1");

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('t')).unwrap();
        let _requested = recv(&mut rx).await;

        let completion = recv(&mut rx).await;
        dialog.update(&completion).unwrap();

        assert!(!dialog.testing);
        assert_eq!(
            dialog.result,
            Some(ConnectionTestResult::failure(CONNECTIVITY_FAILURE_MESSAGE))
        );
    }

    // ── Staleness ────────────────────────────────────────────────────

    #[tokio::test]
    async fn an_edit_discards_the_shown_result() {
        let (server, mut dialog, _store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(TEST_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": false, "message": "bad login"})),
            )
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('t')).unwrap();
        let _requested = recv(&mut rx).await;
        let completion = recv(&mut rx).await;
        dialog.update(&completion).unwrap();
        assert!(dialog.result.is_some());

        dialog.handle_key_event(key(KeyCode::Backspace)).unwrap();
        assert_eq!(dialog.result, None);
    }

    #[tokio::test]
    async fn a_completion_after_an_edit_is_discarded() {
        let (server, mut dialog, _store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(TEST_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "message": "OK"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('t')).unwrap();
        let _requested = recv(&mut rx).await;

        // Edit while the request is still out
        dialog.handle_key_event(key(KeyCode::Char('x'))).unwrap();

        let completion = recv(&mut rx).await;
        dialog.update(&completion).unwrap();

        assert!(!dialog.testing);
        assert_eq!(dialog.result, None);
    }

    #[tokio::test]
    async fn a_completion_after_close_is_discarded() {
        let (server, mut dialog, store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(TEST_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "message": "OK"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('t')).unwrap();
        let _requested = recv(&mut rx).await;

        store.apply(&Action::CloseSettings);
        dialog.update(&Action::CloseSettings).unwrap();

        let completion = recv(&mut rx).await;
        dialog.update(&completion).unwrap();

        assert!(!dialog.testing);
        assert_eq!(dialog.result, None);
        assert!(!store.is_settings_open());
    }

    // ── Busy flags ───────────────────────────────────────────────────

    #[tokio::test]
    async fn a_second_test_while_one_is_in_flight_is_ignored() {
        let (server, mut dialog, _store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(TEST_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "message": "OK"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('t')).unwrap();
        dialog.handle_key_event(ctrl('t')).unwrap();

        let requested = recv(&mut rx).await;
        assert!(matches!(requested, Action::TestConnection(_)));

        let completion = recv(&mut rx).await;
        assert!(matches!(completion, Action::SettingsTestResult { .. }));
        dialog.update(&completion).unwrap();

        // Exactly one request went out and one completion came back
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(dialog.result, Some(ConnectionTestResult::ok("OK")));
    }

    #[tokio::test]
    async fn a_save_is_not_blocked_by_an_in_flight_test() {
        let (server, mut dialog, _store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(TEST_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "message": "OK"}))
                    .set_delay(Duration::from_millis(1000)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(SAVE_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('t')).unwrap();
        dialog.handle_key_event(ctrl('s')).unwrap();
        assert!(dialog.testing);
        assert!(dialog.saving);

        let _test_requested = recv(&mut rx).await;

        // The save returns while the test is still pending
        let set = recv(&mut rx).await;
        assert!(matches!(set, Action::SetCredentials(_)));
        let save_done = recv(&mut rx).await;
        assert!(matches!(save_done, Action::SettingsSaveResult { .. }));
        dialog.update(&save_done).unwrap();

        assert!(!dialog.saving);
        assert!(dialog.testing);
        assert_eq!(
            dialog.result,
            Some(ConnectionTestResult::ok(SAVE_SUCCESS_MESSAGE))
        );

        let test_done = recv(&mut rx).await;
        dialog.update(&test_done).unwrap();
        assert!(!dialog.testing);
    }

    // ── Save outcomes ────────────────────────────────────────────────

    #[tokio::test]
    async fn a_successful_save_stores_credentials_and_auto_closes() {
        let (server, mut dialog, store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(SAVE_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(dialog.saving);

        let set = recv(&mut rx).await;
        assert!(matches!(set, Action::SetCredentials(_)));
        store.apply(&set);
        assert!(store.snapshot().credentials.is_some());

        let save_done = recv(&mut rx).await;
        dialog.update(&save_done).unwrap();
        assert!(!dialog.saving);
        assert_eq!(
            dialog.result,
            Some(ConnectionTestResult::ok(SAVE_SUCCESS_MESSAGE))
        );

        // The timer fires 2s later and closes the untouched dialog
        let auto_close = recv(&mut rx).await;
        assert!(matches!(auto_close, Action::SettingsAutoClose { .. }));
        let follow_up = dialog.update(&auto_close).unwrap();
        assert!(matches!(follow_up, Some(Action::CloseSettings)));

        store.apply(&Action::CloseSettings);
        dialog.update(&Action::CloseSettings).unwrap();
        assert!(!store.is_settings_open());
        assert_eq!(dialog.result, None);
    }

    #[tokio::test]
    async fn an_edit_cancels_the_pending_auto_close() {
        let (server, mut dialog, store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(SAVE_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('s')).unwrap();

        let _set = recv(&mut rx).await;
        let save_done = recv(&mut rx).await;
        dialog.update(&save_done).unwrap();

        // User keeps typing before the timer fires
        dialog.handle_key_event(key(KeyCode::Char('x'))).unwrap();

        let auto_close = recv(&mut rx).await;
        assert!(matches!(auto_close, Action::SettingsAutoClose { .. }));
        let follow_up = dialog.update(&auto_close).unwrap();

        assert!(follow_up.is_none());
        assert!(store.is_settings_open());
    }

    #[tokio::test]
    async fn a_manual_close_makes_the_auto_close_a_noop() {
        let (server, mut dialog, store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(SAVE_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('s')).unwrap();

        let _set = recv(&mut rx).await;
        let save_done = recv(&mut rx).await;
        dialog.update(&save_done).unwrap();

        let action = dialog.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(matches!(action, Some(Action::CloseSettings)));
        store.apply(&Action::CloseSettings);
        dialog.update(&Action::CloseSettings).unwrap();

        let auto_close = recv(&mut rx).await;
        let follow_up = dialog.update(&auto_close).unwrap();

        assert!(follow_up.is_none());
        assert!(!store.is_settings_open());
    }

    #[tokio::test]
    async fn a_rejected_save_shows_the_server_reason() {
        let (server, mut dialog, _store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(SAVE_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('s')).unwrap();

        let save_done = recv(&mut rx).await;
        assert!(matches!(save_done, Action::SettingsSaveResult { .. }));
        dialog.update(&save_done).unwrap();

        assert!(!dialog.saving);
        assert_eq!(dialog.result, Some(ConnectionTestResult::failure("boom")));
    }

    #[tokio::test]
    async fn a_save_to_an_unreachable_server_maps_to_the_connectivity_message() {
        let (mut dialog, _store, mut rx) = dialog_for("http://127.0.0.1:1");

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('s')).unwrap();

        let save_done = recv(&mut rx).await;
        assert!(matches!(save_done, Action::SettingsSaveResult { .. }));
        dialog.update(&save_done).unwrap();

        assert!(!dialog.saving);
        assert_eq!(
            dialog.result,
            Some(ConnectionTestResult::failure(CONNECTIVITY_FAILURE_MESSAGE))
        );
    }

    #[tokio::test]
    async fn a_rejected_save_without_a_reason_uses_the_fallback() {
        let (server, mut dialog, _store, mut rx) = setup().await;
        Mock::given(method("POST"))
            .and(path(SAVE_PATH))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        fill_form(&mut dialog);
        dialog.handle_key_event(ctrl('s')).unwrap();

        let save_done = recv(&mut rx).await;
        dialog.update(&save_done).unwrap();

        assert_eq!(
            dialog.result,
            Some(ConnectionTestResult::failure(SAVE_FAILURE_MESSAGE))
        );
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn buffer_text(backend: &TestBackend) -> String {
        backend
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[tokio::test]
    async fn renders_only_while_the_slice_is_open_and_masks_the_password() {
        let (_server, mut dialog, store, _rx) = setup().await;
        fill_form(&mut dialog);

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                dialog.render(frame, area);
            })
            .unwrap();
        let open_view = buffer_text(terminal.backend());
        assert!(open_view.contains("Exchange Settings"));
        assert!(open_view.contains(&"\u{25CF}".repeat(7)));
        assert!(!open_view.contains("hunter2"));

        // Ctrl+U reveals the password
        dialog.handle_key_event(ctrl('u')).unwrap();
        let mut revealed = Terminal::new(TestBackend::new(80, 24)).unwrap();
        revealed
            .draw(|frame| {
                let area = frame.area();
                dialog.render(frame, area);
            })
            .unwrap();
        assert!(buffer_text(revealed.backend()).contains("hunter2"));

        // A closed slice renders nothing
        store.apply(&Action::CloseSettings);
        dialog.update(&Action::CloseSettings).unwrap();
        let mut closed = Terminal::new(TestBackend::new(80, 24)).unwrap();
        closed
            .draw(|frame| {
                let area = frame.area();
                dialog.render(frame, area);
            })
            .unwrap();
        assert!(!buffer_text(closed.backend()).contains("Exchange Settings"));
    }
}
