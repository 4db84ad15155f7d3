#[cfg(test)]
#[path = "preset_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::validate_temperature;
use super::AppError;
use super::BackendName;

/// A named, reusable connection to a backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub provider: BackendName,
    pub model: String,
    pub temperature: f64,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Preset {
    pub fn validate(&self) -> Result<(), AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::input("Preset name can't be empty"));
        }
        if name.contains(['/', '\\', '.']) {
            return Err(AppError::Input(format!(
                "Preset name '{name}' can't contain '/', '\\' or '.'"
            )));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::input("Preset model can't be empty"));
        }

        validate_temperature(self.temperature)?;

        return Ok(());
    }

    pub fn masked_api_key(&self) -> String {
        return mask_secret(&self.api_key);
    }
}

/// Hides all but the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }

    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }

    let tail = secret.chars().skip(count - 4).collect::<String>();
    return format!("{}{tail}", "*".repeat(8));
}
