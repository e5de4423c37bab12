//! Component trait implemented by every mounted UI surface.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};
use tokio::sync::mpsc::UnboundedSender;

use ewslink_core::Action;

/// A unit of UI the shell drives.
///
/// Lifecycle: `init` once at mount, then any mix of `handle_key_event`,
/// `update`, and `render` calls from the event loop.
pub trait Component: Send {
    /// Called once when the component is mounted. Receives the sender
    /// used to dispatch actions into the app loop.
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    /// Translate a key press into an action, or handle it locally.
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// React to a dispatched action. May return a follow-up action.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Draw into the given frame area.
    fn render(&self, frame: &mut Frame, area: Rect);

    /// Stable identifier, used in logs.
    fn id(&self) -> &'static str;
}
