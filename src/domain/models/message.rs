#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Role;

/// A single turn in a conversation. Messages are never edited once created,
/// a conversation only ever grows by appending new ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Message {
        return Message {
            role,
            content: content.to_string(),
        };
    }

    pub fn user(content: &str) -> Message {
        return Message::new(Role::User, content);
    }

    pub fn assistant(content: &str) -> Message {
        return Message::new(Role::Assistant, content);
    }

    pub fn is_assistant(&self) -> bool {
        return self.role == Role::Assistant;
    }

    /// First line of the message, cut down to `max_len` characters for list
    /// views.
    pub fn preview(&self, max_len: usize) -> String {
        let line = self.content.trim().split('\n').next().unwrap_or_default();
        if line.chars().count() <= max_len {
            return line.to_string();
        }

        let cut = line
            .chars()
            .take(max_len.saturating_sub(3))
            .collect::<String>();
        return format!("{cut}...");
    }
}
