#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;

use std::path;

use super::AppError;
use super::BackendName;

/// Parses a user supplied temperature, only accepting values within `[0, 1]`.
pub fn parse_temperature(text: &str) -> Result<f64, AppError> {
    let temperature = text
        .trim()
        .parse::<f64>()
        .map_err(|_| return AppError::input("Temperature must be a number"))?;

    return validate_temperature(temperature);
}

pub fn validate_temperature(temperature: f64) -> Result<f64, AppError> {
    if !(0.0..=1.0).contains(&temperature) {
        return Err(AppError::input(
            "Temperature must be a number between 0 and 1",
        ));
    }

    return Ok(temperature);
}

/// Everything a chat session needs to talk to a backend and persist its
/// transcripts. Built once before the session starts and passed along
/// explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatSettings {
    pub backend: BackendName,
    pub model: String,
    pub temperature: f64,
    pub api_key: String,
    pub backend_url: String,
    pub history_dir: path::PathBuf,
    pub preset: Option<String>,
}

impl ChatSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_temperature(self.temperature)?;

        if self.model.trim().is_empty() {
            return Err(AppError::input("A model must be set"));
        }

        if self.api_key.trim().is_empty() {
            return Err(AppError::Authentication {
                backend: self.backend,
            });
        }

        return Ok(());
    }
}
