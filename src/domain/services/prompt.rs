#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;

use std::io;
use std::io::Write;
use std::mem;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthChar;

use crate::domain::models::Event;
use crate::domain::models::LineReader;

/// Raw mode leaves newlines alone, so the cursor would not return to the
/// first column. Every `\n` written through here goes out as `\r\n`.
pub struct RawTerminalWriter<W: Write> {
    inner: W,
}

impl<W: Write> RawTerminalWriter<W> {
    pub fn new(inner: W) -> RawTerminalWriter<W> {
        return RawTerminalWriter { inner };
    }
}

impl<W: Write> Write for RawTerminalWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        for (idx, byte) in buf.iter().enumerate() {
            if *byte == b'\n' {
                self.inner.write_all(&buf[start..idx])?;
                self.inner.write_all(b"\r\n")?;
                start = idx + 1;
            }
        }
        self.inner.write_all(&buf[start..])?;

        return Ok(buf.len());
    }

    fn flush(&mut self) -> io::Result<()> {
        return self.inner.flush();
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Edit {
    Pending,
    Line(String),
    End,
}

/// Line editor fed by the keypress listener. Echoes what is typed since the
/// terminal is in raw mode.
pub struct TerminalLines<W: Write + Send> {
    events: mpsc::UnboundedReceiver<Event>,
    buffer: String,
    out: W,
}

impl<W: Write + Send> TerminalLines<W> {
    pub fn new(events: mpsc::UnboundedReceiver<Event>, out: W) -> TerminalLines<W> {
        return TerminalLines {
            events,
            buffer: "".to_string(),
            out,
        };
    }

    pub fn apply(&mut self, event: Event) -> io::Result<Edit> {
        match event {
            Event::KeyboardCharInput(char) => {
                self.buffer.push(char);
                write!(self.out, "{char}")?;
            }
            Event::KeyboardPaste(text) => {
                let text = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
                write!(self.out, "{text}")?;
                self.buffer += &text;
            }
            Event::KeyboardBackspace() => {
                if let Some(char) = self.buffer.pop() {
                    let width = char.width().unwrap_or(0);
                    write!(self.out, "{}", "\x08 \x08".repeat(width))?;
                }
            }
            Event::KeyboardEnter() => {
                writeln!(self.out)?;
                return Ok(Edit::Line(mem::take(&mut self.buffer)));
            }
            Event::KeyboardEOF() => {
                // Only an empty prompt ends input.
                if self.buffer.is_empty() {
                    return Ok(Edit::End);
                }
            }
        }

        return Ok(Edit::Pending);
    }
}

#[async_trait]
impl<W: Write + Send> LineReader for TerminalLines<W> {
    async fn read_line(&mut self) -> Result<Option<String>> {
        while let Some(event) = self.events.recv().await {
            let edit = self.apply(event)?;
            self.out.flush()?;

            match edit {
                Edit::Pending => {}
                Edit::Line(line) => return Ok(Some(line)),
                Edit::End => return Ok(None),
            }
        }

        return Ok(None);
    }
}
