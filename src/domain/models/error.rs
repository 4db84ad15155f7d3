use std::path;

use super::BackendName;

/// Failures that are reported to the user with a dedicated panel rather than
/// the generic crash report.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{} rejected the API key", .backend.label())]
    Authentication { backend: BackendName },
    #[error("Corrupted transcript {}: {reason}", .path.display())]
    CorruptedTranscript { path: path::PathBuf, reason: String },
    #[error("{0}")]
    Input(String),
}

impl AppError {
    pub fn input(message: &str) -> AppError {
        return AppError::Input(message.to_string());
    }

    pub fn title(&self) -> &'static str {
        match self {
            AppError::Authentication { .. } => return "AuthenticationError",
            AppError::CorruptedTranscript { .. } => return "CorruptedTranscriptError",
            AppError::Input(_) => return "InputError",
        }
    }

    /// Lines shown below the panel title, including how to fix the problem
    /// where there's something the user can do about it.
    pub fn remediation(&self) -> Vec<String> {
        match self {
            AppError::Authentication { backend } => {
                return vec![
                    format!("Are you sure your {} API key is correct?", backend.label()),
                    "Set it using `parley config set --api-key <YOUR API KEY>`,".to_string(),
                    "or pass `--api-key` when starting a chat.".to_string(),
                ];
            }
            AppError::CorruptedTranscript { path, .. } => {
                return vec![format!("Corrupted file detected: {}", path.display())];
            }
            AppError::Input(_) => {
                return vec![self.to_string()];
            }
        }
    }
}
