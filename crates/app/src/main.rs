use std::sync::Arc;

use chrono_tz::Tz;
use clap::Parser;
use expense_bot::{Agent, CategoryDictionary, console, telegram::TelegramBot};
use ledger::LedgerStore;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = settings::Args::parse();
    let settings = settings::Settings::new(&args)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "gastos={level},expense_bot={level},ledger={level}",
            level = settings.app.level
        ))
        .init();

    let timezone: Tz = settings
        .app
        .timezone
        .parse()
        .map_err(|err| format!("invalid timezone {}: {err}", settings.app.timezone))?;

    let agent = Agent::builder()
        .ledger(LedgerStore::new(&settings.ledger.path))
        .categories(category_dictionary(&settings.categories))
        .timezone(timezone);

    match settings.telegram {
        Some(telegram) if !settings.console => {
            tracing::info!("Found telegram settings...");
            let bot = TelegramBot::builder()
                .token(&telegram.token)
                .allowed_users(telegram.allowed_users)
                .build()?;
            bot.run(agent).await?;
        }
        _ => {
            if !settings.console {
                tracing::info!("No telegram settings, falling back to the console");
            }
            let agent = agent.transport(Arc::new(console::ConsoleTransport)).build()?;
            console::run(&agent).await?;
        }
    }

    Ok(())
}

fn category_dictionary(groups: &[settings::CategoryGroup]) -> CategoryDictionary {
    if groups.is_empty() {
        return CategoryDictionary::builtin();
    }
    groups
        .iter()
        .fold(CategoryDictionary::default(), |dict, group| {
            dict.with_group(&group.name, &group.keywords)
        })
}
