#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use std::fmt;
use std::path;

use anyhow::Result;
use chrono::Local;
use chrono::TimeZone;
use tokio::fs;

use super::parse_id;
use super::Transcript;
use crate::configuration;
use crate::domain::models::AppError;

const PREVIEW_LENGTH: usize = 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub date: String,
    pub first_message: String,
}

#[derive(Debug, Default)]
pub struct HistoryListing {
    pub entries: Vec<HistoryEntry>,
    /// One `AppError::CorruptedTranscript` per file that failed to load.
    pub corrupted: Vec<AppError>,
}

/// Formats a conversation id as `MM/dd hh:mm` in the given timezone.
pub fn format_date<Tz: TimeZone>(id: &str, tz: &Tz) -> Option<String>
where
    Tz::Offset: fmt::Display,
{
    let created = parse_id(id)?;
    return Some(
        tz.from_utc_datetime(&created)
            .format("%m/%d %I:%M")
            .to_string(),
    );
}

/// Read only view over every transcript in the history directory.
pub struct History {
    pub dir: path::PathBuf,
}

impl Default for History {
    fn default() -> History {
        return History::new(configuration::data_dir().join("history"));
    }
}

impl History {
    pub fn new(dir: path::PathBuf) -> History {
        return History { dir };
    }

    /// Files in the history directory whose name ends with one of `suffixes`.
    async fn files_ending_with(&self, suffixes: &[&str]) -> Result<Vec<path::PathBuf>> {
        let mut paths = vec![];
        if !self.dir.exists() {
            return Ok(paths);
        }

        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(file) = dir.next_entry().await? {
            let file_path = file.path();
            let name = file.file_name().to_string_lossy().to_string();
            if suffixes.iter().any(|suffix| return name.ends_with(suffix)) {
                paths.push(file_path);
            }
        }

        paths.sort();
        return Ok(paths);
    }

    /// Lists conversations oldest first. Corrupted transcripts are reported
    /// separately instead of failing the listing.
    pub async fn list(&self) -> Result<HistoryListing> {
        let mut listing = HistoryListing::default();

        for file_path in self.files_ending_with(&[".json"]).await? {
            let transcript = match Transcript::open(&file_path).await {
                Ok(transcript) => transcript,
                Err(err) if err.is_corrupted() => {
                    tracing::warn!(path = ?file_path, error = %err, "Skipping corrupted transcript");
                    listing.corrupted.push(AppError::CorruptedTranscript {
                        path: file_path,
                        reason: err.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let first_message = transcript
                .messages()
                .first()
                .map(|message| return message.preview(PREVIEW_LENGTH))
                .unwrap_or_default();

            listing.entries.push(HistoryEntry {
                id: transcript.id().to_string(),
                date: format_date(transcript.id(), &Local).unwrap_or_default(),
                first_message,
            });
        }

        listing.entries.sort_by(|a, b| return a.id.cmp(&b.id));

        return Ok(listing);
    }

    /// Deletes every transcript, returning how many were removed. Temporary
    /// files left behind by an interrupted write go too.
    pub async fn clear(&self) -> Result<usize> {
        let paths = self.files_ending_with(&[".json", ".json.tmp"]).await?;
        let mut count = 0;
        for file_path in paths.iter() {
            fs::remove_file(file_path).await?;
            if file_path.extension().and_then(|ext| return ext.to_str()) == Some("json") {
                count += 1;
            }
        }

        tracing::debug!(count, "Cleared conversation history");
        return Ok(count);
    }
}
