mod backend;
mod clipboard;
mod error;
mod event;
mod line_reader;
mod message;
mod preset;
mod role;
mod session_command;
mod settings;

pub use backend::*;
pub use clipboard::*;
pub use error::*;
pub use event::*;
pub use line_reader::*;
pub use message::*;
pub use preset::*;
pub use role::*;
pub use session_command::*;
pub use settings::*;
