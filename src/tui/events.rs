use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::app::AppEvent;

/// Events consumed by the UI loop
#[derive(Debug)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),

    /// Terminal resize event
    Resize(u16, u16),

    /// Periodic tick event
    Tick,

    /// Result from a background task
    App(AppEvent),
}

/// Event handler merging terminal input with background results
pub struct EventHandler {
    /// Event receiver channel
    receiver: mpsc::UnboundedReceiver<Event>,

    /// Event sender channel
    sender: mpsc::UnboundedSender<Event>,

    /// Tick interval for periodic events
    tick_interval: Duration,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(tick_interval: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            receiver,
            sender,
            tick_interval,
        }
    }

    /// Start reading terminal input on a blocking thread
    pub fn start_input_reader(&self) {
        let sender = self.sender.clone();
        let tick_interval = self.tick_interval;

        tokio::task::spawn_blocking(move || {
            while !sender.is_closed() {
                let event = match crossterm::event::poll(tick_interval) {
                    Ok(true) => match crossterm::event::read() {
                        Ok(event) => convert_crossterm_event(event),
                        Err(e) => {
                            warn!("Failed to read terminal event: {}", e);
                            break;
                        }
                    },
                    Ok(false) => Some(Event::Tick),
                    Err(e) => {
                        warn!("Failed to poll terminal events: {}", e);
                        break;
                    }
                };

                if let Some(event) = event {
                    if sender.send(event).is_err() {
                        break;
                    }
                }
            }
            debug!("Input reader stopped");
        });
    }

    /// Get the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Get a clone of the sender
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

/// Convert crossterm events to application events
fn convert_crossterm_event(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key_event) if key_event.kind == KeyEventKind::Press => {
            Some(Event::Key(key_event))
        }
        CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
        _ => None,
    }
}
