#[cfg(test)]
#[path = "events_test.rs"]
mod tests;

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use crossterm::event::Event as CrosstermEvent;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use futures::StreamExt;
use tokio::sync::mpsc;
use yansi::Paint;

use super::RawTerminalWriter;
use super::StreamControl;
use crate::domain::models::Event;

pub const INTERRUPT_NOTICE: &str = "(Escape key pressed: Cancelling current completion)";

#[derive(Debug, PartialEq, Eq)]
pub enum Keypress {
    Interrupt,
    Forward(Event),
    Ignore,
}

/// Maps a terminal event to what the listener should do with it. Keys typed
/// while a completion is streaming never reach the line prompt.
pub fn translate(event: CrosstermEvent, streaming: bool) -> Keypress {
    let keyevent = match event {
        CrosstermEvent::Paste(text) => {
            if streaming {
                return Keypress::Ignore;
            }
            return Keypress::Forward(Event::KeyboardPaste(text));
        }
        CrosstermEvent::Key(keyevent) => keyevent,
        _ => return Keypress::Ignore,
    };

    if keyevent.kind != KeyEventKind::Press {
        return Keypress::Ignore;
    }

    if streaming {
        return translate_streaming(keyevent);
    }

    match keyevent {
        KeyEvent {
            code: KeyCode::Char('c') | KeyCode::Char('d'),
            modifiers,
            ..
        } if modifiers == KeyModifiers::CONTROL => {
            return Keypress::Forward(Event::KeyboardEOF());
        }
        KeyEvent {
            code: KeyCode::Enter,
            ..
        } => {
            return Keypress::Forward(Event::KeyboardEnter());
        }
        KeyEvent {
            code: KeyCode::Backspace,
            ..
        } => {
            return Keypress::Forward(Event::KeyboardBackspace());
        }
        KeyEvent {
            code: KeyCode::Char(char),
            modifiers,
            ..
        } if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            return Keypress::Forward(Event::KeyboardCharInput(char));
        }
        _ => {
            return Keypress::Ignore;
        }
    }
}

fn translate_streaming(keyevent: KeyEvent) -> Keypress {
    match keyevent {
        KeyEvent {
            code: KeyCode::Esc, ..
        } => {
            return Keypress::Interrupt;
        }
        KeyEvent {
            code: KeyCode::Char('c'),
            modifiers,
            ..
        } if modifiers == KeyModifiers::CONTROL => {
            return Keypress::Interrupt;
        }
        _ => {
            return Keypress::Ignore;
        }
    }
}

/// Reads raw key events for the whole session. Interrupt keys are handled
/// here, everything else is forwarded to the line prompt.
pub struct EventsService {
    crossterm_events: EventStream,
    control: Arc<StreamControl>,
    events: mpsc::UnboundedSender<Event>,
}

impl EventsService {
    pub fn new(control: Arc<StreamControl>, events: mpsc::UnboundedSender<Event>) -> EventsService {
        return EventsService {
            crossterm_events: EventStream::new(),
            control,
            events,
        };
    }

    pub async fn start(mut self) -> Result<()> {
        while let Some(event) = self.crossterm_events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = ?err, "Failed to read terminal event");
                    continue;
                }
            };

            match translate(event, self.control.is_streaming()) {
                Keypress::Interrupt => {
                    if self.control.interrupt() {
                        let mut out = RawTerminalWriter::new(std::io::stdout());
                        write!(out, "\n{}", Paint::new(INTERRUPT_NOTICE).dimmed())?;
                        out.flush()?;
                    }
                }
                Keypress::Forward(event) => {
                    // The prompt went away, so the session is over.
                    if self.events.send(event).is_err() {
                        return Ok(());
                    }
                }
                Keypress::Ignore => {}
            }
        }

        return Ok(());
    }
}
