#[cfg(test)]
#[path = "transcript_test.rs"]
mod tests;

use std::io;
use std::path;

use chrono::NaiveDateTime;
use chrono::Utc;
use tokio::fs;

use crate::domain::models::Message;

const ID_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3fZ";

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Corrupted transcript {}: {source}", .path.display())]
    Corrupted {
        path: path::PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to read transcript {}: {source}", .path.display())]
    Read { path: path::PathBuf, source: io::Error },
    #[error("Failed to write transcript {}: {source}", .path.display())]
    Write { path: path::PathBuf, source: io::Error },
    #[error("Failed to serialize transcript: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl TranscriptError {
    pub fn is_corrupted(&self) -> bool {
        return matches!(self, TranscriptError::Corrupted { .. });
    }
}

/// Parses the creation time out of a conversation id.
pub fn parse_id(id: &str) -> Option<NaiveDateTime> {
    // Ids that collided within the same millisecond carry a `-N` suffix.
    let (stamp, _) = id.split_once('Z')?;
    return NaiveDateTime::parse_from_str(&format!("{stamp}Z"), ID_FORMAT).ok();
}

/// The persisted, append-only message history of one conversation.
///
/// Every append rewrites the whole file as a single JSON array. The new
/// content is written to a sibling file first and then renamed over the
/// transcript, so readers only ever see complete arrays.
#[derive(Debug)]
pub struct Transcript {
    id: String,
    path: path::PathBuf,
    messages: Vec<Message>,
}

impl Transcript {
    /// Starts a new, empty conversation in `dir` with a timestamp derived id.
    /// Nothing is written until the first append.
    pub fn create(dir: &path::Path) -> Transcript {
        let stamp = Utc::now().format(ID_FORMAT).to_string();
        let mut id = stamp.to_string();
        let mut attempt = 0;
        while dir.join(format!("{id}.json")).exists() {
            attempt += 1;
            id = format!("{stamp}-{attempt}");
        }

        return Transcript {
            path: dir.join(format!("{id}.json")),
            id,
            messages: vec![],
        };
    }

    /// Loads the transcript at `path`, or starts an empty one if the file
    /// doesn't exist yet.
    pub async fn open(file_path: &path::Path) -> Result<Transcript, TranscriptError> {
        let id = file_path
            .file_stem()
            .map(|stem| return stem.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut transcript = Transcript {
            id,
            path: file_path.to_path_buf(),
            messages: vec![],
        };

        if !file_path.exists() {
            return Ok(transcript);
        }

        // Parsed from raw bytes so invalid UTF-8 counts as corruption.
        let payload = fs::read(file_path).await.map_err(|source| {
            return TranscriptError::Read {
                path: file_path.to_path_buf(),
                source,
            };
        })?;

        transcript.messages = serde_json::from_slice::<Vec<Message>>(&payload).map_err(|source| {
            return TranscriptError::Corrupted {
                path: file_path.to_path_buf(),
                source,
            };
        })?;

        return Ok(transcript);
    }

    pub fn id(&self) -> &str {
        return &self.id;
    }

    pub fn path(&self) -> &path::Path {
        return &self.path;
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn last(&self) -> Option<&Message> {
        return self.messages.last();
    }

    pub fn len(&self) -> usize {
        return self.messages.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.messages.is_empty();
    }

    /// Appends `message` and persists the whole conversation. When the write
    /// fails the message is removed again, so memory and disk never diverge.
    pub async fn append(&mut self, message: Message) -> Result<(), TranscriptError> {
        self.messages.push(message);

        if let Err(err) = self.persist().await {
            self.messages.pop();
            tracing::error!(path = ?self.path, error = %err, "Failed to persist transcript");
            return Err(err);
        }

        tracing::debug!(id = self.id, count = self.messages.len(), "Appended message");
        return Ok(());
    }

    async fn persist(&self) -> Result<(), TranscriptError> {
        let payload = serde_json::to_string(&self.messages)?;
        let write_err = |source: io::Error| {
            return TranscriptError::Write {
                path: self.path.to_path_buf(),
                source,
            };
        };

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        if let Err(source) = fs::write(&tmp_path, payload.as_bytes()).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_err(source));
        }

        if let Err(source) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_err(source));
        }

        return Ok(());
    }
}
