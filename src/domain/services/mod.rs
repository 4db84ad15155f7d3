mod clipboard;
mod events;
mod history;
mod panel;
mod presets;
mod prompt;
mod session;
mod stream_control;
mod transcript;

pub use clipboard::*;
pub use events::*;
pub use history::*;
pub use panel::*;
pub use presets::*;
pub use prompt::*;
pub use session::*;
pub use stream_control::*;
pub use transcript::*;
