#[cfg(test)]
#[path = "presets_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::configuration;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AppError;
use crate::domain::models::Preset;

pub struct Presets {
    pub dir: path::PathBuf,
}

impl Default for Presets {
    fn default() -> Presets {
        return Presets::new(configuration::config_dir().join("presets"));
    }
}

impl Presets {
    pub fn new(dir: path::PathBuf) -> Presets {
        return Presets { dir };
    }

    pub fn create_id() -> String {
        return Uuid::new_v4()
            .to_string()
            .split('-')
            .enumerate()
            .filter_map(|(idx, str)| {
                if idx > 1 {
                    return None;
                }
                return Some(str);
            })
            .collect::<Vec<&str>>()
            .join("-");
    }

    fn get_file_path(&self, name: &str) -> path::PathBuf {
        return self.dir.join(format!("{name}.yaml"));
    }

    /// Every readable preset, sorted by name. Files that fail to parse are
    /// skipped.
    pub async fn list(&self) -> Result<Vec<Preset>> {
        let mut presets: Vec<Preset> = vec![];
        if !self.dir.exists() {
            return Ok(presets);
        }

        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(file) = dir.next_entry().await? {
            let file_path = file.path();
            if file_path.extension().and_then(|ext| return ext.to_str()) != Some("yaml") {
                continue;
            }

            let payload = fs::read_to_string(&file_path).await?;
            match serde_yaml::from_str::<Preset>(&payload) {
                Ok(preset) => presets.push(preset),
                Err(err) => {
                    tracing::warn!(path = ?file_path, error = ?err, "Skipping unreadable preset");
                }
            }
        }

        presets.sort_by(|a, b| return a.name.cmp(&b.name));

        return Ok(presets);
    }

    pub async fn load(&self, name: &str) -> Result<Preset> {
        let file_path = self.get_file_path(name);
        if !file_path.exists() {
            return Err(AppError::Input(format!("No preset found named '{name}'")).into());
        }

        let payload = fs::read_to_string(file_path).await?;
        let preset: Preset = serde_yaml::from_str(&payload)?;

        return Ok(preset);
    }

    pub async fn create(&self, preset: &Preset) -> Result<()> {
        preset.validate()?;

        let file_path = self.get_file_path(&preset.name);
        if file_path.exists() {
            return Err(AppError::Input(format!(
                "A preset named '{}' already exists",
                preset.name
            ))
            .into());
        }

        let payload = serde_yaml::to_string(preset)?;

        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
        }

        let mut file = fs::File::create(file_path).await?;
        file.write_all(payload.as_bytes()).await?;
        tracing::debug!(name = preset.name, id = preset.id, "Created preset");

        return Ok(());
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let file_path = self.get_file_path(name);
        if !file_path.exists() {
            return Err(AppError::Input(format!("No preset found named '{name}'")).into());
        }

        fs::remove_file(file_path).await?;
        return Ok(());
    }

    /// The preset named by the `preset` config key, if one is set.
    pub async fn active(&self, config: &Config) -> Result<Option<Preset>> {
        let name = config.get(ConfigKey::Preset);
        if name.is_empty() {
            return Ok(None);
        }

        return Ok(Some(self.load(&name).await?));
    }
}
