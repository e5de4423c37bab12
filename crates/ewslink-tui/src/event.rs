//! Terminal event reader running in a background tokio task.
//!
//! Key presses and resizes come from crossterm's [`EventStream`]; tick
//! and render pulses come from two `tokio::time` intervals. Everything
//! funnels into one mpsc channel the app loop reads.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Raw input to the app loop, before translation into actions.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal resized to (cols, rows).
    Resize(u16, u16),
    /// Animation pulse.
    Tick,
    /// Redraw pulse.
    Render,
}

/// Spawns the reader task and hands events out one at a time.
pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    /// Spawn the background reader.
    ///
    /// - `tick_rate`: interval for [`Event::Tick`]
    /// - `render_rate`: interval for [`Event::Render`]
    pub fn new(tick_rate: Duration, render_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut stream = EventStream::new();
            let mut ticks = tokio::time::interval(tick_rate);
            let mut renders = tokio::time::interval(render_rate);

            // Skip missed ticks instead of bursting to catch up
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            renders.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    _ = task_cancel.cancelled() => break,

                    _ = ticks.tick() => Event::Tick,

                    _ = renders.tick() => Event::Render,

                    Some(Ok(term_event)) = stream.next() => {
                        match term_event {
                            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                                Event::Key(key)
                            }
                            CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
                            // Releases, repeats, focus, mouse and paste are unused
                            _ => continue,
                        }
                    }
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, cancel }
    }

    /// Next event, or `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Ask the background task to stop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
