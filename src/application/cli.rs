use std::io;
use std::path;

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use strum::VariantNames;
use yansi::Paint;

use super::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::help_text;
use crate::domain::models::parse_temperature;
use crate::domain::models::AppError;
use crate::domain::models::BackendName;
use crate::domain::models::Preset;
use crate::domain::services::History;
use crate::domain::services::HistoryListing;
use crate::domain::services::Panel;
use crate::domain::services::Presets;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// The config file selected on the command line, checking the deepest
/// subcommand first.
fn config_file_path(clap_arg_matches: &[&ArgMatches]) -> path::PathBuf {
    for matches in clap_arg_matches.iter().rev() {
        if let Ok(Some(config_file)) =
            matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
        {
            return path::PathBuf::from(config_file);
        }
    }

    return path::PathBuf::from(Config::default_value(ConfigKey::ConfigFile));
}

fn history_lines(listing: &HistoryListing) -> Vec<String> {
    return listing
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            return format!("{}: {} \"{}\"", idx + 1, entry.date, entry.first_message);
        })
        .collect();
}

async fn print_history(history: &History) -> Result<()> {
    let listing = history.list().await?;

    for err in listing.corrupted.iter() {
        ui::print_panel(&Panel::info(err.remediation()).with_title(err.title()));
    }

    if listing.entries.is_empty() {
        println!("{}", Paint::new("(No conversation history)").dimmed());
        return Ok(());
    }

    ui::print_panel(&Panel::info(history_lines(&listing)).with_title("Conversation history"));
    return Ok(());
}

fn format_preset(preset: &Preset, active: &str) -> Vec<String> {
    let mut title = preset.name.to_string();
    if preset.name == active {
        title = format!("{title} (active)");
    }

    let mut lines = vec![
        title,
        format!("  Provider: {}", preset.provider.label()),
        format!("  Model: {}", preset.model),
        format!("  Temperature: {}", preset.temperature),
        format!("  API key: {}", preset.masked_api_key()),
    ];
    if let Some(description) = &preset.description {
        lines.push(format!("  Description: {description}"));
    }

    return lines;
}

async fn print_presets(presets: &Presets, config: &Config) -> Result<()> {
    let list = presets.list().await?;
    if list.is_empty() {
        println!("{}", Paint::new("(No presets saved)").dimmed());
        return Ok(());
    }

    let active = config.get(ConfigKey::Preset);
    let lines = list
        .iter()
        .map(|preset| return format_preset(preset, &active))
        .collect::<Vec<Vec<String>>>()
        .join(&"".to_string());

    ui::print_panel(&Panel::info(lines).with_title("Presets"));
    return Ok(());
}

async fn create_preset(presets: &Presets, create_matches: &ArgMatches) -> Result<()> {
    let get = |id: &str| {
        return create_matches
            .get_one::<String>(id)
            .map(|val| return val.to_string());
    };

    let provider = get("provider").unwrap_or_default();
    let backend = BackendName::parse(&provider)
        .ok_or_else(|| return AppError::Input(format!("Unknown provider '{provider}'")))?;
    let temperature = parse_temperature(&get("temperature").unwrap_or_else(|| return "0".to_string()))?;

    let preset = Preset {
        id: Presets::create_id(),
        name: get("name").unwrap_or_default(),
        provider: backend,
        model: get("model").unwrap_or_default(),
        temperature,
        api_key: get("api-key").unwrap_or_default(),
        description: get("description").filter(|description| return !description.is_empty()),
    };

    presets.create(&preset).await?;
    println!("Created preset {}", preset.name);

    return Ok(());
}

async fn use_preset(
    presets: &Presets,
    config_path: &path::Path,
    use_matches: &ArgMatches,
) -> Result<()> {
    let name = match use_matches.get_one::<String>("name") {
        Some(name) => presets.load(name).await?.name,
        None => {
            let list = presets.list().await?;
            if list.is_empty() {
                println!("There are no presets available. Create one with `parley presets create`.");
                return Ok(());
            }

            let options = list
                .iter()
                .map(|preset| {
                    return format!(
                        "{} ({}, {})",
                        preset.name,
                        preset.provider.label(),
                        preset.model
                    );
                })
                .collect::<Vec<String>>();

            let idx = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Which preset would you like to use?")
                .default(0)
                .items(&options)
                .interact_opt()?;

            match idx {
                Some(idx) => list[idx].name.to_string(),
                None => return Ok(()),
            }
        }
    };

    Config::set_in_file(build(), config_path, &[(ConfigKey::Preset, name.to_string())]).await?;
    println!("Now using preset {name}");

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        )
        .subcommand(
            Command::new("view").about("Displays the effective configuration, with the API key masked.")
        )
        .subcommand(
            Command::new("set")
                .about("Updates values in the configuration file, keeping any comments.")
                .arg_required_else_help(true)
                .arg(arg_provider())
                .arg(arg_model())
                .arg(arg_temperature())
                .arg(arg_api_key())
                .arg(arg_preset())
                .arg(arg_history_dir())
                .arg(arg_openai_url())
                .arg(arg_anthropic_url())
        )
        .subcommand(
            Command::new("reset").about("Overwrites the configuration file with the defaults.")
        );
}

fn subcommand_history() -> Command {
    return Command::new("history")
        .about("Browse past conversations.")
        .arg_required_else_help(true)
        .arg(arg_history_dir())
        .subcommand(Command::new("view").about("List all previous conversations with their first message."))
        .subcommand(Command::new("clear").about("Delete every saved conversation."))
        .subcommand(Command::new("dir").about("Print the conversation history directory path."));
}

fn arg_name(help: &str) -> Arg {
    return Arg::new("name")
        .short('n')
        .long("name")
        .num_args(1)
        .help(help.to_string());
}

fn subcommand_presets() -> Command {
    return Command::new("presets")
        .about("Manage saved provider, model and API key combinations.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all saved presets."))
        .subcommand(
            Command::new("create")
                .about("Save a new preset.")
                .arg(arg_name("Name of the preset.").required(true))
                .arg(
                    Arg::new("provider")
                        .short('p')
                        .long("provider")
                        .num_args(1)
                        .help("The provider the preset connects to.")
                        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS))
                        .required(true),
                )
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .num_args(1)
                        .help("The model the preset uses.")
                        .required(true),
                )
                .arg(
                    Arg::new("temperature")
                        .short('t')
                        .long("temperature")
                        .num_args(1)
                        .help("Sampling temperature between 0 and 1. [default: 0]"),
                )
                .arg(
                    Arg::new("api-key")
                        .short('k')
                        .long("api-key")
                        .num_args(1)
                        .help("API key for the provider."),
                )
                .arg(
                    Arg::new("description")
                        .short('d')
                        .long("description")
                        .num_args(1)
                        .help("Short note on what the preset is for."),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a preset.")
                .arg(arg_name("Name of the preset.").required(true)),
        )
        .subcommand(
            Command::new("use")
                .about("Make a preset active for new chats. Omit the name to pick one interactively.")
                .arg(arg_name("Name of the preset.")),
        );
}

fn arg_provider() -> Arg {
    return Arg::new(ConfigKey::Provider.to_string())
        .short('p')
        .long(ConfigKey::Provider.to_string())
        .env(ConfigKey::Provider.env_var())
        .num_args(1)
        .help(format!(
            "The provider hosting the model to chat with. [default: {}]",
            Config::default_value(ConfigKey::Provider)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS));
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env(ConfigKey::Model.env_var())
        .num_args(1)
        .help(format!(
            "The model to chat with. [default: {}]",
            Config::default_value(ConfigKey::Model)
        ));
}

fn arg_temperature() -> Arg {
    return Arg::new(ConfigKey::Temperature.to_string())
        .short('t')
        .long(ConfigKey::Temperature.to_string())
        .env(ConfigKey::Temperature.env_var())
        .num_args(1)
        .help(format!(
            "Sampling temperature between 0 and 1. [default: {}]",
            Config::default_value(ConfigKey::Temperature)
        ));
}

fn arg_api_key() -> Arg {
    return Arg::new(ConfigKey::ApiKey.to_string())
        .short('k')
        .long(ConfigKey::ApiKey.to_string())
        .env(ConfigKey::ApiKey.env_var())
        .num_args(1)
        .hide_env_values(true)
        .help("API key for the selected provider.");
}

fn arg_preset() -> Arg {
    return Arg::new(ConfigKey::Preset.to_string())
        .long(ConfigKey::Preset.to_string())
        .env(ConfigKey::Preset.env_var())
        .num_args(1)
        .help("Name of a saved preset to start from. Other command line options take precedence over it.");
}

fn arg_history_dir() -> Arg {
    return Arg::new(ConfigKey::HistoryDir.to_string())
        .long(ConfigKey::HistoryDir.to_string())
        .env(ConfigKey::HistoryDir.env_var())
        .num_args(1)
        .help(format!(
            "Directory conversations are saved to. [default: {}]",
            Config::default_value(ConfigKey::HistoryDir)
        ));
}

fn arg_openai_url() -> Arg {
    return Arg::new(ConfigKey::OpenAiURL.to_string())
        .long(ConfigKey::OpenAiURL.to_string())
        .env(ConfigKey::OpenAiURL.env_var())
        .num_args(1)
        .help(format!(
            "OpenAI API URL when using the OpenAI provider. Can be swapped to a compatible proxy. [default: {}]",
            Config::default_value(ConfigKey::OpenAiURL)
        ));
}

fn arg_anthropic_url() -> Arg {
    return Arg::new(ConfigKey::AnthropicURL.to_string())
        .long(ConfigKey::AnthropicURL.to_string())
        .env(ConfigKey::AnthropicURL.env_var())
        .num_args(1)
        .help(format!(
            "Anthropic API URL when using the Anthropic provider. [default: {}]",
            Config::default_value(ConfigKey::AnthropicURL)
        ));
}

fn chat_args(cmd: Command) -> Command {
    return cmd
        .arg(arg_preset())
        .arg(arg_provider())
        .arg(arg_model())
        .arg(arg_temperature())
        .arg(arg_api_key())
        .arg(arg_history_dir())
        .arg(arg_openai_url())
        .arg(arg_anthropic_url());
}

fn subcommand_chat() -> Command {
    return chat_args(Command::new("chat").about("Start a new chat conversation."));
}

pub fn build() -> Command {
    let commands_text = help_text()
        .iter()
        .map(|line| {
            return format!("  {line}");
        })
        .collect::<Vec<String>>()
        .join("\n");

    let commands_text = format!(
        "{}\n{commands_text}",
        Paint::new("CHAT COMMANDS:").underline().bold()
    );

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    let cmd = Command::new("parley")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_history())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .subcommand(subcommand_presets())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env(ConfigKey::ConfigFile.env_var())
                .num_args(1)
                .help(format!(
                    "Path to configuration file [default: {}]",
                    Config::default_value(ConfigKey::ConfigFile)
                ))
                .global(true),
        );

    return chat_args(cmd);
}

/// Handles every subcommand that runs to completion on its own. Returns the
/// configuration to chat with when a chat session should start.
pub async fn parse() -> Result<Option<Config>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            let mut config = Config::load(build(), vec![&matches, subcmd_matches]).await?;
            config.apply_preset(&Presets::default()).await?;
            return Ok(Some(config));
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => {
            let config_path = config_file_path(&[&matches, subcmd_matches]);
            match subcmd_matches.subcommand() {
                Some(("create", _)) => {
                    Config::create_file(build(), &config_path).await?;
                    println!("Created default config file at {}", config_path.display());
                }
                Some(("default", _)) => {
                    println!("{}", Config::serialize_default(build()));
                }
                Some(("path", _)) => {
                    println!("{}", config_path.display());
                }
                Some(("view", view_matches)) => {
                    let mut config =
                        Config::load(build(), vec![&matches, subcmd_matches, view_matches]).await?;
                    config.apply_preset(&Presets::default()).await?;
                    ui::print_panel(&Panel::info(config.view_lines()).with_title("Configuration"));
                }
                Some(("set", set_matches)) => {
                    let values = Config::command_line_values(set_matches);
                    if values.is_empty() {
                        subcommand_config().print_long_help()?;
                        return Ok(None);
                    }
                    Config::set_in_file(build(), &config_path, &values).await?;
                    let keys = values
                        .iter()
                        .map(|(key, _)| return key.to_string())
                        .collect::<Vec<String>>()
                        .join(", ");
                    println!("Updated {keys} in {}", config_path.display());
                }
                Some(("reset", _)) => {
                    Config::reset_file(build(), &config_path).await?;
                    println!("Reset config file at {}", config_path.display());
                }
                _ => {
                    subcommand_config().print_long_help()?;
                }
            }
        }
        Some(("history", subcmd_matches)) => {
            let config = Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let history = History::new(path::PathBuf::from(config.get(ConfigKey::HistoryDir)));
            match subcmd_matches.subcommand() {
                Some(("view", _)) => {
                    print_history(&history).await?;
                }
                Some(("clear", _)) => {
                    let count = history.clear().await?;
                    println!("Deleted {count} conversations");
                }
                Some(("dir", _)) => {
                    println!("{}", history.dir.display());
                }
                _ => {
                    subcommand_history().print_long_help()?;
                }
            }
        }
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
        }
        Some(("presets", subcmd_matches)) => {
            let presets = Presets::default();
            match subcmd_matches.subcommand() {
                Some(("list", _)) => {
                    let config = Config::load(build(), vec![&matches, subcmd_matches]).await?;
                    print_presets(&presets, &config).await?;
                }
                Some(("create", create_matches)) => {
                    create_preset(&presets, create_matches).await?;
                }
                Some(("delete", delete_matches)) => {
                    let name = delete_matches
                        .get_one::<String>("name")
                        .map(|name| return name.to_string())
                        .unwrap_or_default();
                    presets.delete(&name).await?;
                    println!("Deleted preset {name}");
                }
                Some(("use", use_matches)) => {
                    let config_path = config_file_path(&[&matches, subcmd_matches, use_matches]);
                    use_preset(&presets, &config_path, use_matches).await?;
                }
                _ => {
                    subcommand_presets().print_long_help()?;
                }
            }
        }
        _ => {
            let mut config = Config::load(build(), vec![&matches]).await?;
            config.apply_preset(&Presets::default()).await?;
            return Ok(Some(config));
        }
    }

    return Ok(None);
}
