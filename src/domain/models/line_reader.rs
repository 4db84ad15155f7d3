use anyhow::Result;
use async_trait::async_trait;

/// Source of the chat prompt's input, one line at a time.
#[async_trait]
pub trait LineReader: Send {
    /// Waits for the next complete line, without its line ending. `None`
    /// signals the end of input.
    async fn read_line(&mut self) -> Result<Option<String>>;
}
