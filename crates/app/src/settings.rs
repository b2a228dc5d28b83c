//! Handles settings for the application.
//!
//! Values come, in increasing priority, from the TOML file (default
//! `config/gastos.toml`, optional), from `GASTOS__*` environment variables
//! (e.g. `GASTOS__TELEGRAM__TOKEN`) and from the command line.
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/gastos.toml";

#[derive(Debug, Parser)]
#[command(name = "gastos", about = "Conversational expense tracker")]
pub struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    pub config: Option<String>,
    /// Override the ledger file path.
    #[arg(long)]
    pub ledger: Option<String>,
    /// Talk through stdin/stdout even if Telegram is configured.
    #[arg(long)]
    pub console: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    pub timezone: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ledger {
    pub path: String,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            path: "data/expenses.txt".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    #[serde(default)]
    pub allowed_users: Vec<u64>,
}

/// One category of the keyword dictionary. Order in the file is the lookup
/// order.
#[derive(Debug, Deserialize)]
pub struct CategoryGroup {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub ledger: Ledger,
    pub telegram: Option<Telegram>,
    #[serde(default)]
    pub console: bool,
    #[serde(default)]
    pub categories: Vec<CategoryGroup>,
}

impl Settings {
    pub fn new(args: &Args) -> Result<Self, ConfigError> {
        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let settings = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("GASTOS")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("telegram.allowed_users"),
            )
            .build()?;

        let mut settings: Settings = settings.try_deserialize()?;
        if let Some(ledger) = &args.ledger {
            settings.ledger.path = ledger.clone();
        }
        if args.console {
            settings.console = true;
        }
        Ok(settings)
    }
}
