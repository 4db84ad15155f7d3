use anyhow::Result;

/// Write-only access to the system clipboard.
pub trait Clipboard: Send {
    fn set_text(&mut self, text: &str) -> Result<()>;
}
