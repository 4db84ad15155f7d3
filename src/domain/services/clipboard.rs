use anyhow::Result;

use crate::domain::models::Clipboard;

/// System clipboard, opened on first use. The handle is kept for the rest of
/// the session as some platforms drop copied text along with it.
#[derive(Default)]
pub struct ClipboardService {
    clipboard: Option<arboard::Clipboard>,
}

impl ClipboardService {
    pub fn healthcheck() -> Result<()> {
        arboard::Clipboard::new()?;
        return Ok(());
    }
}

impl Clipboard for ClipboardService {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.clipboard.is_none() {
            self.clipboard = Some(arboard::Clipboard::new()?);
        }

        if let Some(clipboard) = self.clipboard.as_mut() {
            clipboard.set_text(text)?;
        }

        return Ok(());
    }
}
