#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::io;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use yansi::Paint;

use super::Panel;
use super::StreamControl;
use super::Transcript;
use crate::domain::models::help_text;
use crate::domain::models::AppError;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendError;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatSettings;
use crate::domain::models::Clipboard;
use crate::domain::models::FragmentStream;
use crate::domain::models::Input;
use crate::domain::models::LineReader;
use crate::domain::models::Message;
use crate::domain::models::SessionCommand;

pub const USER_PROMPT: &str = "[User]: ";
pub const ASSISTANT_PROMPT: &str = "[Assistant]: ";

struct Drained {
    content: String,
    failure: Option<BackendError>,
}

/// An interactive chat with a backend, persisted to a transcript as it goes.
///
/// User turns are appended before the backend is called, assistant turns only
/// once the reply stopped streaming. A reply that was cancelled or failed
/// part way through still keeps whatever was received.
pub struct Session<W: Write + Send> {
    settings: ChatSettings,
    backend: BackendBox,
    control: Arc<StreamControl>,
    clipboard: Box<dyn Clipboard>,
    transcript: Transcript,
    out: W,
}

impl<W: Write + Send> Session<W> {
    pub fn new(
        settings: ChatSettings,
        backend: BackendBox,
        control: Arc<StreamControl>,
        clipboard: Box<dyn Clipboard>,
        out: W,
    ) -> Session<W> {
        let transcript = Transcript::create(&settings.history_dir);

        return Session {
            settings,
            backend,
            control,
            clipboard,
            transcript,
            out,
        };
    }

    pub fn transcript(&self) -> &Transcript {
        return &self.transcript;
    }

    /// Runs until the user quits or input ends.
    pub async fn start(&mut self, lines: &mut dyn LineReader) -> Result<()> {
        tracing::debug!(
            backend = %self.backend.name(),
            model = self.settings.model,
            temperature = self.settings.temperature,
            conversation = self.transcript.id(),
            "Starting chat session"
        );
        self.render_banner()?;

        loop {
            write!(self.out, "{}", Paint::new(USER_PROMPT).dimmed())?;
            self.out.flush()?;

            let line = match lines.read_line().await? {
                Some(line) => line,
                None => {
                    writeln!(self.out)?;
                    return Ok(());
                }
            };

            match Input::classify(&line) {
                Input::Empty => {
                    continue;
                }
                Input::Command(command) => {
                    if !self.handle_command(command)? {
                        return Ok(());
                    }
                }
                Input::UnknownCommand(text) => {
                    tracing::debug!(command = text, "Unknown session command");
                    self.notice("(Unknown command. Use :help to see available commands)")?;
                }
                Input::Chat(text) => {
                    self.chat(&text).await?;
                }
            }
        }
    }

    /// Returns false when the session should end.
    fn handle_command(&mut self, command: SessionCommand) -> Result<bool> {
        if command.is_quit() {
            tracing::debug!(conversation = self.transcript.id(), "Quitting chat session");
            return Ok(false);
        }

        if command.is_new() {
            self.transcript = Transcript::create(&self.settings.history_dir);
            tracing::debug!(conversation = self.transcript.id(), "Started new conversation");
            self.render_banner()?;
        } else if command.is_copy() {
            self.copy_last()?;
        } else if command.is_help() {
            self.render_help()?;
        }

        return Ok(true);
    }

    async fn chat(&mut self, text: &str) -> Result<()> {
        self.transcript.append(Message::user(text)).await?;

        let request = ChatRequest {
            model: self.settings.model.to_string(),
            temperature: self.settings.temperature,
            messages: self.transcript.messages().to_vec(),
        };

        let cancel = self.control.begin();
        let stream = match self.backend.chat(request, cancel.clone()).await {
            Ok(stream) => stream,
            Err(err) => {
                self.control.finish();
                writeln!(self.out)?;
                return Err(self.translate(err));
            }
        };

        let drained = self.drain(stream, cancel).await;
        self.control.finish();
        let drained = drained?;
        writeln!(self.out)?;
        self.out.flush()?;

        let authentication_failed = drained
            .failure
            .as_ref()
            .map(|err| return err.is_authentication())
            .unwrap_or(false);

        if !drained.content.is_empty() && !authentication_failed {
            self.transcript
                .append(Message::assistant(&drained.content))
                .await?;
        }

        if let Some(err) = drained.failure {
            return Err(self.translate(err));
        }

        return Ok(());
    }

    /// Writes fragments out as they arrive until the stream ends, fails, or
    /// is cancelled.
    async fn drain(
        &mut self,
        stream: FragmentStream,
        cancel: CancellationToken,
    ) -> io::Result<Drained> {
        write!(self.out, "{}", Paint::new(ASSISTANT_PROMPT).dimmed())?;
        self.out.flush()?;

        let mut fragments = Box::pin(stream.take_until(cancel.cancelled_owned()));
        let mut drained = Drained {
            content: "".to_string(),
            failure: None,
        };

        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) => {
                    write!(self.out, "{text}")?;
                    self.out.flush()?;
                    drained.content += &text;
                }
                Err(err) => {
                    tracing::error!(error = %err, "Completion stream failed");
                    drained.failure = Some(err);
                    break;
                }
            }
        }

        return Ok(drained);
    }

    fn translate(&self, err: BackendError) -> anyhow::Error {
        if err.is_authentication() {
            return AppError::Authentication {
                backend: self.backend.name(),
            }
            .into();
        }

        return err.into();
    }

    fn copy_last(&mut self) -> Result<()> {
        let content = self
            .transcript
            .last()
            .filter(|message| return message.is_assistant() && !message.content.is_empty())
            .map(|message| return message.content.to_string());

        let content = match content {
            Some(content) => content,
            None => {
                return self.notice("(No previous assistant message)");
            }
        };

        if let Err(err) = self.clipboard.set_text(&content) {
            tracing::warn!(error = ?err, "Failed to copy to clipboard");
            return self.notice(&format!("(Unable to access the clipboard: {err})"));
        }

        return self.notice("(Previous assistant message copied to clipboard)");
    }

    fn settings_lines(&self) -> Vec<String> {
        let mut lines = vec![];
        if let Some(preset) = &self.settings.preset {
            lines.push(format!("Preset: {preset}"));
        }
        lines.push(format!("Provider: {}", self.settings.backend.label()));
        lines.push(format!("Model: {}", self.settings.model));
        lines.push(format!("Temperature: {}", self.settings.temperature));

        return lines;
    }

    fn render_banner(&mut self) -> Result<()> {
        let mut lines = vec!["".to_string()];
        lines.extend(self.settings_lines());
        lines.push("".to_string());
        lines.push(":quit to exit out of chat conversation".to_string());
        lines.push(":help to see more options".to_string());

        let panel = Panel::info(lines).with_title("New chat conversation started");
        writeln!(self.out, "{}", panel.render())?;

        return Ok(());
    }

    fn render_help(&mut self) -> Result<()> {
        let mut lines = vec!["".to_string()];
        lines.extend(self.settings_lines());
        lines.push("".to_string());
        lines.extend(help_text());

        let panel = Panel::info(lines).with_title("Conversation Help:");
        writeln!(self.out)?;
        writeln!(self.out, "{}", panel.render())?;
        writeln!(self.out)?;

        return Ok(());
    }

    fn notice(&mut self, text: &str) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", Paint::new(text).dimmed())?;
        writeln!(self.out)?;

        return Ok(());
    }
}
