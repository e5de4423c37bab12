//! Application core — event loop, host surfaces, action dispatch.
//!
//! The app is the host side of [`HostRegistry`]: plugins hand it a
//! reducer and components, and it owns the store, the action channel,
//! and the terminal loop. Every dispatched action goes through the
//! store first, then to the registered components.

use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use ewslink_config::DebugOptions;
use ewslink_core::{Action, Reducer, Store, StoreHandle};

use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::registry::{HostRegistry, RegistryError};
use crate::theme;
use crate::tui::Tui;

/// A main-menu entry contributed by a plugin.
struct MenuEntry {
    label: String,
    action: Action,
}

/// A header-bar button contributed by a plugin, reachable via 1-9.
struct HeaderButton {
    icon: String,
    tooltip: String,
    action: Action,
}

/// Top-level host state and event loop.
pub struct App {
    /// Whether the app should keep running.
    running: bool,
    /// Terminal size for responsive layout.
    terminal_size: (u16, u16),
    /// The plugin store, created at reducer registration.
    store: Option<StoreHandle>,
    /// Root components in registration order. Rendered last, on top of
    /// the host chrome.
    root_components: Vec<Box<dyn Component>>,
    menu_entries: Vec<MenuEntry>,
    header_buttons: Vec<HeaderButton>,
    /// Main menu overlay visibility.
    menu_open: bool,
    menu_selected: usize,
    /// Debug switches, injected at construction.
    debug: DebugOptions,
    /// Action sender — components dispatch through clones of this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver — main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(debug: DebugOptions) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        Self {
            running: true,
            terminal_size: (0, 0),
            store: None,
            root_components: Vec::new(),
            menu_entries: Vec::new(),
            header_buttons: Vec::new(),
            menu_open: false,
            menu_selected: 0,
            debug,
            action_tx,
            action_rx,
        }
    }

    /// Initialize all registered components with the action sender.
    fn init_components(&mut self) -> Result<()> {
        for component in &mut self.root_components {
            debug!("initializing component {}", component.id());
            component.init(self.action_tx.clone())?;
        }
        Ok(())
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.terminal_size = tui.size().unwrap_or((80, 24));
        self.init_components()?;

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        if self.debug.open_settings_on_start {
            self.action_tx.send(Action::OpenSettings)?;
        }

        info!("host event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action(s)
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => {
                    self.action_tx.send(Action::Resize(w, h))?;
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        info!("host event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Host keys are handled here; while
    /// the settings dialog is open, keys go to the components instead.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Ctrl+C always quits
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        // The dialog captures input while its slice is open
        if self.store.as_ref().is_some_and(|s| s.is_settings_open()) {
            for component in &mut self.root_components {
                if let Some(action) = component.handle_key_event(key)? {
                    return Ok(Some(action));
                }
            }
            return Ok(None);
        }

        if self.menu_open {
            match key.code {
                KeyCode::Esc | KeyCode::Char('m') => {
                    self.menu_open = false;
                }
                KeyCode::Up => {
                    self.menu_selected = self.menu_selected.saturating_sub(1);
                }
                KeyCode::Down => {
                    if self.menu_selected + 1 < self.menu_entries.len() {
                        self.menu_selected += 1;
                    }
                }
                KeyCode::Enter => {
                    self.menu_open = false;
                    return Ok(self
                        .menu_entries
                        .get(self.menu_selected)
                        .map(|e| e.action.clone()));
                }
                _ => {}
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(Some(Action::Quit)),

            KeyCode::Char('m') => {
                if !self.menu_entries.is_empty() {
                    self.menu_open = true;
                    self.menu_selected = 0;
                }
            }

            // Header buttons via number keys
            KeyCode::Char(c @ '1'..='9') => {
                let idx = (c as u8 - b'1') as usize;
                return Ok(self.header_buttons.get(idx).map(|b| b.action.clone()));
            }

            _ => {}
        }

        Ok(None)
    }

    /// Process a single action — the store sees it first, then every
    /// registered component, in registration order.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        if self.debug.log_actions {
            debug!(?action, "dispatch");
        }

        if let Some(store) = &self.store {
            store.apply(action);
        }

        match action {
            Action::Quit => {
                self.running = false;
            }
            Action::Resize(w, h) => {
                self.terminal_size = (*w, *h);
            }
            Action::OpenSettings => {
                self.menu_open = false;
            }
            // Render is a draw signal, not component input
            Action::Render => return Ok(()),
            _ => {}
        }

        let mut follow_ups = Vec::new();
        for component in &mut self.root_components {
            if let Some(follow_up) = component.update(action)? {
                follow_ups.push(follow_up);
            }
        }
        for follow_up in follow_ups {
            self.action_tx.send(follow_up)?;
        }

        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────

    /// Render the full host frame: chrome first, components on top.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_CANVAS)),
            area,
        );

        let layout = Layout::vertical([
            Constraint::Length(1), // header bar
            Constraint::Min(1),    // content
            Constraint::Length(1), // status bar
        ])
        .split(area);

        self.render_header(frame, layout[0]);
        self.render_content(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        if self.menu_open {
            self.render_menu(frame, area);
        }

        // Components render last so the dialog sits on top
        for component in &self.root_components {
            component.render(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(" ewslink ", theme::title_style())];
        for (i, button) in self.header_buttons.iter().enumerate() {
            spans.push(Span::styled(format!("  [{}] ", i + 1), theme::key_hint_key()));
            spans.push(Span::raw(format!("{} ", button.icon)));
            spans.push(Span::styled(&button.tooltip, theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_content(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(store) = &self.store else {
            frame.render_widget(
                Paragraph::new(Span::styled("No plugin registered", theme::key_hint()))
                    .alignment(Alignment::Center),
                inner,
            );
            return;
        };

        let snapshot = store.snapshot();
        let account = match &snapshot.credentials {
            Some(c) if c.domain.is_empty() => {
                Span::styled(format!("Linked account: {}", c.username), theme::success())
            }
            Some(c) => Span::styled(
                format!("Linked account: {}\\{}", c.domain, c.username),
                theme::success(),
            ),
            None => Span::styled(
                "No Exchange account linked",
                Style::default().fg(theme::FG_MUTED),
            ),
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Exchange Integration",
                Style::default().fg(theme::FG_DEFAULT),
            )),
            Line::from(""),
            Line::from(account),
        ];
        if snapshot.is_testing_connection {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "A connection test has been requested",
                Style::default().fg(theme::AMBER),
            )));
        }

        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center),
            inner,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let hints = if self.menu_open {
            " \u{2191}/\u{2193} select  Enter choose  Esc close"
        } else {
            " m menu  1-9 header buttons  q quit"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(hints, theme::key_hint())),
            area,
        );
    }

    /// Render the main menu overlay centered on screen.
    fn render_menu(&self, frame: &mut Frame, area: Rect) {
        let width = 34u16.min(area.width.saturating_sub(4));
        let height = (self.menu_entries.len() as u16 + 2).min(area.height.saturating_sub(4));

        let x = (area.width.saturating_sub(width)) / 2;
        let y = (area.height.saturating_sub(height)) / 2;
        let menu_area = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_PANEL)),
            menu_area,
        );

        let block = Block::default()
            .title(" Menu ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(menu_area);
        frame.render_widget(block, menu_area);

        let lines: Vec<Line> = self
            .menu_entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if i == self.menu_selected {
                    theme::menu_selected()
                } else {
                    Style::default().fg(theme::FG_DEFAULT)
                };
                Line::from(Span::styled(format!(" {} ", entry.label), style))
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl HostRegistry for App {
    fn register_reducer(&mut self, reducer: Reducer) -> Result<StoreHandle, RegistryError> {
        if self.store.is_some() {
            return Err(RegistryError::ReducerAlreadyRegistered);
        }
        let store = Store::new(reducer);
        self.store = Some(StoreHandle::clone(&store));
        Ok(store)
    }

    fn register_root_component(
        &mut self,
        component: Box<dyn Component>,
    ) -> Result<(), RegistryError> {
        if self.store.is_none() {
            return Err(RegistryError::NoReducer);
        }
        debug!("registered root component {}", component.id());
        self.root_components.push(component);
        Ok(())
    }

    fn register_main_menu_entry(
        &mut self,
        label: &str,
        action: Action,
    ) -> Result<(), RegistryError> {
        self.menu_entries.push(MenuEntry {
            label: label.to_owned(),
            action,
        });
        Ok(())
    }

    fn register_channel_header_button(
        &mut self,
        icon: &str,
        tooltip: &str,
        action: Action,
    ) -> Result<(), RegistryError> {
        self.header_buttons.push(HeaderButton {
            icon: icon.to_owned(),
            tooltip: tooltip.to_owned(),
            action,
        });
        Ok(())
    }

    // register_app_bar_entry deliberately keeps the trait default: this
    // host has no app bar and silently accepts the registration.
}

#[cfg(test)]
mod tests {
    use ewslink_core::reduce;
    use tokio::sync::mpsc::UnboundedSender;

    use super::*;

    struct NullComponent;

    impl Component for NullComponent {
        fn render(&self, _frame: &mut Frame, _area: Rect) {}

        fn id(&self) -> &'static str {
            "null"
        }
    }

    /// Fails the test if the store has not seen `OpenSettings` by the
    /// time the component does.
    struct AssertsStoreSawOpen {
        store: StoreHandle,
    }

    impl Component for AssertsStoreSawOpen {
        fn update(&mut self, action: &Action) -> Result<Option<Action>> {
            if matches!(action, Action::OpenSettings) {
                assert!(self.store.is_settings_open());
            }
            Ok(None)
        }

        fn render(&self, _frame: &mut Frame, _area: Rect) {}

        fn id(&self) -> &'static str {
            "asserts-store-saw-open"
        }
    }

    /// Swallows every key and answers with `Quit`.
    struct KeyEater;

    impl Component for KeyEater {
        fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
            Ok(Some(Action::Quit))
        }

        fn render(&self, _frame: &mut Frame, _area: Rect) {}

        fn id(&self) -> &'static str {
            "key-eater"
        }
    }

    /// Announces itself on the action channel as soon as init runs.
    struct AnnouncesInit;

    impl Component for AnnouncesInit {
        fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
            action_tx.send(Action::Tick)?;
            Ok(())
        }

        fn render(&self, _frame: &mut Frame, _area: Rect) {}

        fn id(&self) -> &'static str {
            "announces-init"
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn a_second_reducer_registration_fails() {
        let mut app = App::new(DebugOptions::default());

        assert!(app.register_reducer(reduce).is_ok());
        assert!(matches!(
            app.register_reducer(reduce),
            Err(RegistryError::ReducerAlreadyRegistered)
        ));
    }

    #[test]
    fn components_require_a_reducer_first() {
        let mut app = App::new(DebugOptions::default());

        let err = app
            .register_root_component(Box::new(NullComponent))
            .unwrap_err();
        assert!(matches!(err, RegistryError::NoReducer));
    }

    #[test]
    fn the_store_sees_actions_before_components_do() {
        let mut app = App::new(DebugOptions::default());
        let store = app.register_reducer(reduce).unwrap();
        app.register_root_component(Box::new(AssertsStoreSawOpen {
            store: StoreHandle::clone(&store),
        }))
        .unwrap();

        app.process_action(&Action::OpenSettings).unwrap();
        assert!(store.is_settings_open());
    }

    #[test]
    fn quit_stops_the_loop_flag() {
        let mut app = App::new(DebugOptions::default());
        app.register_reducer(reduce).unwrap();

        app.process_action(&Action::Quit).unwrap();
        assert!(!app.running);
    }

    #[test]
    fn q_and_ctrl_c_map_to_quit() {
        let mut app = App::new(DebugOptions::default());
        app.register_reducer(reduce).unwrap();

        let action = app.handle_key_event(key(KeyCode::Char('q'))).unwrap();
        assert!(matches!(action, Some(Action::Quit)));

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let action = app.handle_key_event(ctrl_c).unwrap();
        assert!(matches!(action, Some(Action::Quit)));
    }

    #[test]
    fn the_menu_returns_the_selected_entry_action() {
        let mut app = App::new(DebugOptions::default());
        app.register_reducer(reduce).unwrap();
        app.register_main_menu_entry("Exchange Settings", Action::OpenSettings)
            .unwrap();

        assert!(app.handle_key_event(key(KeyCode::Char('m'))).unwrap().is_none());
        assert!(app.menu_open);

        let action = app.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(action, Some(Action::OpenSettings)));
        assert!(!app.menu_open);
    }

    #[test]
    fn header_hotkeys_dispatch_the_button_action() {
        let mut app = App::new(DebugOptions::default());
        app.register_reducer(reduce).unwrap();
        app.register_channel_header_button(
            "\u{1F4E7}",
            "Exchange Integration Settings",
            Action::OpenSettings,
        )
        .unwrap();

        let action = app.handle_key_event(key(KeyCode::Char('1'))).unwrap();
        assert!(matches!(action, Some(Action::OpenSettings)));

        // No button behind 2
        let action = app.handle_key_event(key(KeyCode::Char('2'))).unwrap();
        assert!(action.is_none());
    }

    #[test]
    fn an_open_dialog_captures_the_keys() {
        let mut app = App::new(DebugOptions::default());
        let store = app.register_reducer(reduce).unwrap();
        app.register_root_component(Box::new(KeyEater)).unwrap();

        // Closed: 'x' means nothing to the host
        let action = app.handle_key_event(key(KeyCode::Char('x'))).unwrap();
        assert!(action.is_none());

        store.apply(&Action::OpenSettings);
        let action = app.handle_key_event(key(KeyCode::Char('x'))).unwrap();
        assert!(matches!(action, Some(Action::Quit)));
    }

    #[test]
    fn init_hands_every_component_a_working_sender() {
        let mut app = App::new(DebugOptions::default());
        app.register_reducer(reduce).unwrap();
        app.register_root_component(Box::new(AnnouncesInit)).unwrap();

        app.init_components().unwrap();
        assert!(matches!(app.action_rx.try_recv(), Ok(Action::Tick)));
    }
}
