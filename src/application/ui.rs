use std::io;
use std::sync::Arc;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::domain::models::AppError;
use crate::domain::models::Event;
use crate::domain::services::ClipboardService;
use crate::domain::services::EventsService;
use crate::domain::services::Panel;
use crate::domain::services::RawTerminalWriter;
use crate::domain::services::Session;
use crate::domain::services::StreamControl;
use crate::domain::services::TerminalLines;
use crate::infrastructure::backends::BackendManager;

pub fn print_panel(panel: &Panel) {
    println!("{}", panel.render());
}

pub fn print_error(err: &AppError) {
    eprintln!("{}", Panel::error(err.title(), err.remediation()).render());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(io::stdout(), DisableBracketedPaste, cursor::Show);
}

/// Runs a chat session in raw mode until the user quits. The terminal is
/// restored before any error is returned.
pub async fn start(config: Config) -> Result<()> {
    let settings = config.to_chat_settings()?;
    settings.validate()?;

    if let Err(clipboard_err) = ClipboardService::healthcheck() {
        tracing::warn!(err = ?clipboard_err, "Clipboard is unavailable, :copy will fail");
    }

    let backend = BackendManager::get(&settings);
    let control = Arc::new(StreamControl::default());
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    enable_raw_mode()?;
    crossterm::execute!(io::stdout(), EnableBracketedPaste)?;

    let listener = tokio::spawn(EventsService::new(control.clone(), event_tx).start());
    let mut lines = TerminalLines::new(event_rx, RawTerminalWriter::new(io::stdout()));
    let mut session = Session::new(
        settings,
        backend,
        control,
        Box::<ClipboardService>::default(),
        RawTerminalWriter::new(io::stdout()),
    );

    let res = session.start(&mut lines).await;

    listener.abort();
    disable_raw_mode()?;
    crossterm::execute!(io::stdout(), DisableBracketedPaste)?;

    let transcript = session.transcript();
    if transcript.is_empty() {
        tracing::debug!(conversation = transcript.id(), "Chat session ended without messages");
    } else {
        tracing::debug!(
            conversation = transcript.id(),
            path = ?transcript.path(),
            messages = transcript.len(),
            "Chat session ended"
        );
    }

    return res;
}
