#[cfg(test)]
#[path = "session_command_test.rs"]
mod tests;

pub const COMMAND_PREFIX: char = ':';

pub struct SessionCommand {
    command: String,
}

impl SessionCommand {
    /// Matches the trimmed text exactly against the command vocabulary.
    /// Arguments are not supported, so `:copy 1` is not a command.
    pub fn parse(text: &str) -> Option<SessionCommand> {
        let cmd = SessionCommand {
            command: text.trim().to_string(),
        };

        if cmd.is_quit() || cmd.is_new() || cmd.is_copy() || cmd.is_help() {
            return Some(cmd);
        }

        return None;
    }

    pub fn is_quit(&self) -> bool {
        return [":q", ":quit"].contains(&self.command.as_str());
    }

    pub fn is_new(&self) -> bool {
        return [":n", ":new"].contains(&self.command.as_str());
    }

    pub fn is_copy(&self) -> bool {
        return [":c", ":copy"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return [":h", ":help"].contains(&self.command.as_str());
    }
}

pub enum Input {
    Empty,
    Command(SessionCommand),
    UnknownCommand(String),
    Chat(String),
}

impl Input {
    pub fn classify(line: &str) -> Input {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Input::Empty;
        }

        if let Some(cmd) = SessionCommand::parse(trimmed) {
            return Input::Command(cmd);
        }

        if trimmed.starts_with(COMMAND_PREFIX) {
            return Input::UnknownCommand(trimmed.to_string());
        }

        return Input::Chat(line.to_string());
    }
}

pub fn help_text() -> Vec<String> {
    return vec![
        ":quit, :q - Exit out of the current conversation".to_string(),
        ":new,  :n - Start a new conversation".to_string(),
        ":copy, :c - Copy the previous assistant message to the clipboard".to_string(),
        ":help, :h - View options".to_string(),
        "Escape    - Cancel the response currently being streamed".to_string(),
    ];
}
