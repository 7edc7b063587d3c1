pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::calc::ScheduleView;
use crate::core::config::AppConfig;
use crate::core::decimal::{Money, Rate};
use anyhow::Result;
use tracing::{debug, info};

/// Commands that run against a loaded book.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Calc {
        principal: Money,
        annual_rate_percent: Rate,
        term_months: u32,
        schedule: ScheduleView,
    },
    Loans {
        window: Option<usize>,
        full: bool,
    },
    Portfolio,
    NetWorth,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!(?command, "moneyflow starting...");

    match command {
        AppCommand::Calc {
            principal,
            annual_rate_percent,
            term_months,
            schedule,
        } => {
            // The calculator needs no book; use its currency only when one is given.
            let currency = match config_path {
                Some(path) => AppConfig::load_from_path(path)?.currency,
                None => "USD".to_string(),
            };
            let today = chrono::Local::now().date_naive();
            cli::calc::run(principal, annual_rate_percent, term_months, schedule, today, &currency)
        }
        AppCommand::Loans { window, full } => {
            let config = load_config(config_path)?;
            let view = if full {
                ScheduleView::Full
            } else {
                ScheduleView::Window(window.unwrap_or(config.schedule_window))
            };
            cli::loans::run(&config.loans, view, &config.currency)
        }
        AppCommand::Portfolio => {
            let config = load_config(config_path)?;
            let source = providers::build_quote_source(&config)?;
            cli::portfolio::run(&config.investments, source.as_ref(), &config.currency).await
        }
        AppCommand::NetWorth => {
            let config = load_config(config_path)?;
            let source = providers::build_quote_source(&config)?;
            cli::networth::run(&config, source.as_ref()).await
        }
    }
}
