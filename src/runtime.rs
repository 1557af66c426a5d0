use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::app::{Action, App};

/// Everything the map screen reacts to
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Where the event loop gets its input from
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Reads the terminal on a background thread, forwarding key presses and resizes
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || forward_terminal_events(&tx));
        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

fn forward_terminal_events(tx: &Sender<AppEvent>) {
    loop {
        let ev = match event::read() {
            // Windows reports releases and repeats too
            Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
            Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
            Ok(_) => continue,
            Err(_) => return,
        };
        if tx.send(ev).is_err() {
            return;
        }
    }
}

/// Events pushed through a channel, for driving the app without a terminal
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }

    /// A source together with the sender that feeds it
    pub fn pair() -> (Sender<AppEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl AppEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls events one at a time and hands keys to the [`App`]
pub struct Runner<E: AppEventSource> {
    events: E,
    tick: Duration,
}

impl<E: AppEventSource> Runner<E> {
    pub fn new(events: E, tick: Duration) -> Self {
        Self { events, tick }
    }

    /// Next event, or `Tick` once the tick interval passes quietly or the source is gone
    pub fn step(&self) -> AppEvent {
        self.events
            .recv_timeout(self.tick)
            .unwrap_or(AppEvent::Tick)
    }

    /// Wait for one event and apply it to `app`.
    ///
    /// `None` means a quiet tick: nothing changed and the screen can stay as it is.
    /// A resize asks for a redraw, a key is whatever [`App::handle_key`] decides.
    pub fn next_action(&self, app: &mut App) -> Option<Action> {
        match self.step() {
            AppEvent::Tick => None,
            AppEvent::Resize => Some(Action::Redraw),
            AppEvent::Key(key) => Some(app.handle_key(key)),
        }
    }
}
