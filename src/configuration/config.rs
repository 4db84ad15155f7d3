#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::collections::HashMap;
use std::collections::HashSet;
use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::parser::ValueSource;
use clap::ArgMatches;
use clap::Command;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::mask_secret;
use crate::domain::models::parse_temperature;
use crate::domain::models::AppError;
use crate::domain::models::BackendName;
use crate::domain::models::ChatSettings;
use crate::domain::services::Presets;

fn platform_dir(dir: Option<path::PathBuf>) -> path::PathBuf {
    return dir
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("parley");
}

pub fn config_dir() -> path::PathBuf {
    #[cfg(not(target_os = "macos"))]
    return platform_dir(dirs::config_dir());
    #[cfg(target_os = "macos")]
    return platform_dir(dirs::home_dir().map(|home| return home.join(".config")));
}

pub fn data_dir() -> path::PathBuf {
    return platform_dir(dirs::data_dir());
}

pub fn cache_dir() -> path::PathBuf {
    return platform_dir(dirs::cache_dir());
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    Provider,
    Model,
    Temperature,
    ApiKey,
    Preset,
    #[strum(serialize = "openai-url")]
    OpenAiURL,
    AnthropicURL,
    HistoryDir,
    ConfigFile,
}

impl ConfigKey {
    pub fn env_var(&self) -> String {
        return format!("PARLEY_{}", self.to_string().to_uppercase().replace('-', "_"));
    }

    /// Keys that live in the config file, as opposed to only selecting it.
    pub fn persisted() -> impl Iterator<Item = ConfigKey> {
        return ConfigKey::iter().filter(|key| return *key != ConfigKey::ConfigFile);
    }
}

/// Effective configuration, resolved from defaults, the config file, the
/// active preset and finally command line arguments or their environment
/// variables.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    values: HashMap<ConfigKey, String>,
    overrides: HashSet<ConfigKey>,
}

impl Default for Config {
    fn default() -> Config {
        let values = ConfigKey::iter()
            .map(|key| return (key, Config::default_value(key)))
            .collect::<HashMap<ConfigKey, String>>();

        return Config {
            values,
            overrides: HashSet::new(),
        };
    }
}

impl Config {
    pub fn default_value(key: ConfigKey) -> String {
        let history_dir = data_dir().join("history");
        let config_path = config_dir().join("config.toml");

        let res = match key {
            ConfigKey::Provider => "openai",
            ConfigKey::Model => "gpt-4",
            ConfigKey::Temperature => "0",
            ConfigKey::ApiKey => "",
            ConfigKey::Preset => "",
            ConfigKey::OpenAiURL => "https://api.openai.com",
            ConfigKey::AnthropicURL => "https://api.anthropic.com",
            ConfigKey::HistoryDir => return history_dir.to_string_lossy().to_string(),
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    pub fn get(&self, key: ConfigKey) -> String {
        if let Some(val) = self.values.get(&key) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(&mut self, key: ConfigKey, value: &str) {
        self.values.insert(key, value.to_string());
    }

    pub fn config_file(&self) -> path::PathBuf {
        return path::PathBuf::from(self.get(ConfigKey::ConfigFile));
    }

    /// Resolves every key but the preset. Values set on the command line or
    /// through their environment variables are remembered so a preset can't
    /// override them later.
    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<Config> {
        let mut config = Config::default();

        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config.set(ConfigKey::ConfigFile, config_file);
            }
        }

        let config_path = config.config_file();
        if config_path.exists() {
            let toml_str = fs::read_to_string(&config_path).await?;
            config.merge_toml(&cmd, &toml_str)?;
        }

        for key in ConfigKey::persisted() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    config.set(key, val);
                    config.overrides.insert(key);
                }
            }
        }

        tracing::debug!(
            provider = config.get(ConfigKey::Provider),
            model = config.get(ConfigKey::Model),
            temperature = config.get(ConfigKey::Temperature),
            preset = config.get(ConfigKey::Preset),
            history_dir = config.get(ConfigKey::HistoryDir),
            config_file = config.get(ConfigKey::ConfigFile),
            "config"
        );

        return Ok(config);
    }

    fn merge_toml(&mut self, cmd: &Command, toml_str: &str) -> Result<()> {
        let doc = toml_str.parse::<toml_edit::Document>()?;

        for key in ConfigKey::persisted() {
            let val = match doc.get(&key.to_string()) {
                Some(val) => val,
                None => continue,
            };

            // Use clap value parsers to do validation.
            let possible_values = possible_values(cmd, key);

            if let Some(val_int) = val.as_integer() {
                self.set(key, &val_int.to_string());
            } else if let Some(val_float) = val.as_float() {
                self.set(key, &val_float.to_string());
            } else if let Some(val_str) = val.as_str() {
                if val_str.is_empty() {
                    continue;
                }
                if !possible_values.is_empty() && !possible_values.contains(&val_str.to_string()) {
                    return Err(AppError::Input(format!(
                        "config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}",
                        possible_values.join(", ")
                    ))
                    .into());
                }
                self.set(key, val_str);
            } else {
                bail!(format!("config.toml has an unsupported value for key '{key}'"));
            }
        }

        return Ok(());
    }

    /// Merges the active preset over the current values, leaving anything set
    /// on the command line untouched.
    pub async fn apply_preset(&mut self, presets: &Presets) -> Result<()> {
        let preset = match presets.active(self).await? {
            Some(preset) => preset,
            None => return Ok(()),
        };

        let values = [
            (ConfigKey::Provider, preset.provider.to_string()),
            (ConfigKey::Model, preset.model.to_string()),
            (ConfigKey::Temperature, preset.temperature.to_string()),
            (ConfigKey::ApiKey, preset.api_key.to_string()),
        ];

        for (key, val) in values {
            if val.is_empty() || self.overrides.contains(&key) {
                continue;
            }
            self.set(key, &val);
        }

        tracing::debug!(preset = preset.name, "Applied preset");
        return Ok(());
    }

    pub fn to_chat_settings(&self) -> Result<ChatSettings, AppError> {
        let provider = self.get(ConfigKey::Provider);
        let backend = BackendName::parse(&provider)
            .ok_or_else(|| return AppError::Input(format!("Unknown provider '{provider}'")))?;

        let backend_url = match backend {
            BackendName::OpenAI => self.get(ConfigKey::OpenAiURL),
            BackendName::Anthropic => self.get(ConfigKey::AnthropicURL),
        };

        let preset = self.get(ConfigKey::Preset);

        return Ok(ChatSettings {
            backend,
            model: self.get(ConfigKey::Model),
            temperature: parse_temperature(&self.get(ConfigKey::Temperature))?,
            api_key: self.get(ConfigKey::ApiKey),
            backend_url: backend_url.trim_end_matches('/').to_string(),
            history_dir: path::PathBuf::from(self.get(ConfigKey::HistoryDir)),
            preset: if preset.is_empty() { None } else { Some(preset) },
        });
    }

    /// Effective values for display, with the API key masked.
    pub fn view_lines(&self) -> Vec<String> {
        return ConfigKey::iter()
            .map(|key| {
                let mut val = self.get(key);
                if key == ConfigKey::ApiKey {
                    val = mask_secret(&val);
                } else if val.is_empty() {
                    val = "(not set)".to_string();
                }
                return format!("{key}: {val}");
            })
            .collect();
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::persisted()
            .map(|key| {
                let mut description = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    .and_then(|arg| return arg.get_help())
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let possible_values = possible_values(&cmd, key);
                if !possible_values.is_empty() {
                    description = format!(
                        "{description} [possible values: {}]",
                        possible_values.join(", ")
                    );
                }

                let mut val = Config::default_value(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<f64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{}\"", val.replace('\\', "\\\\"));
                }

                return format!("# {description}\n{val}");
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }

    /// Writes the default config file, failing if one already exists.
    pub async fn create_file(cmd: Command, config_path: &path::Path) -> Result<()> {
        if config_path.exists() {
            return Err(AppError::Input(format!(
                "Config file already exists at {}",
                config_path.display()
            ))
            .into());
        }

        return Config::write_file(config_path, &Config::serialize_default(cmd)).await;
    }

    /// Rewrites the config file with the defaults.
    pub async fn reset_file(cmd: Command, config_path: &path::Path) -> Result<()> {
        return Config::write_file(config_path, &Config::serialize_default(cmd)).await;
    }

    /// Updates keys in the config file in place, keeping its comments. A
    /// missing file starts out from the defaults.
    pub async fn set_in_file(
        cmd: Command,
        config_path: &path::Path,
        values: &[(ConfigKey, String)],
    ) -> Result<()> {
        let toml_str = if config_path.exists() {
            fs::read_to_string(config_path).await?
        } else {
            Config::serialize_default(cmd.clone())
        };

        let mut doc = toml_str.parse::<toml_edit::Document>()?;
        for (key, val) in values {
            if *key == ConfigKey::Temperature {
                doc[key.to_string().as_str()] = toml_edit::value(parse_temperature(val)?);
                continue;
            }

            let possible_values = possible_values(&cmd, *key);
            if !possible_values.is_empty() && !possible_values.contains(val) {
                return Err(AppError::Input(format!(
                    "Invalid value for '{key}': {val}\nPossible values are: {}",
                    possible_values.join(", ")
                ))
                .into());
            }

            doc[key.to_string().as_str()] = toml_edit::value(val.to_string());
        }

        return Config::write_file(config_path, &doc.to_string()).await;
    }

    async fn write_file(config_path: &path::Path, payload: &str) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(config_path, payload).await?;
        return Ok(());
    }

    /// Keys passed explicitly on the command line, ignoring environment
    /// variables.
    pub fn command_line_values(matches: &ArgMatches) -> Vec<(ConfigKey, String)> {
        return ConfigKey::persisted()
            .filter_map(|key| {
                let id = key.to_string();
                let val = match matches.try_get_one::<String>(&id) {
                    Ok(Some(val)) => val,
                    _ => return None,
                };
                if matches.value_source(&id) != Some(ValueSource::CommandLine) {
                    return None;
                }
                return Some((key, val.to_string()));
            })
            .collect();
    }
}

fn possible_values(cmd: &Command, key: ConfigKey) -> Vec<String> {
    let long = key.to_string();
    if let Some(arg) = cmd
        .get_arguments()
        .find(|e| return e.get_long() == Some(long.as_str()))
    {
        return arg
            .get_possible_values()
            .iter()
            .map(|e| return e.get_name().to_string())
            .collect::<Vec<String>>();
    }

    return vec![];
}

pub fn log_dir() -> path::PathBuf {
    return env::var("PARLEY_LOG_DIR")
        .map(path::PathBuf::from)
        .unwrap_or_else(|_| return cache_dir());
}
