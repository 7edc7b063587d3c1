use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use moneyflow::cli::calc::ScheduleView;
use moneyflow::core::log::init_logging;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for moneyflow::AppCommand {
    fn from(cmd: Commands) -> moneyflow::AppCommand {
        match cmd {
            Commands::Calc {
                principal,
                rate,
                term,
                schedule,
                window,
                full,
            } => moneyflow::AppCommand::Calc {
                principal,
                annual_rate_percent: rate,
                term_months: term,
                schedule: ScheduleView::from_flags(schedule, window, full),
            },
            Commands::Loans { window, full } => moneyflow::AppCommand::Loans { window, full },
            Commands::Portfolio => moneyflow::AppCommand::Portfolio,
            Commands::Networth => moneyflow::AppCommand::NetWorth,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example book to the default location
    Setup,
    /// Calculate the level payment for a loan
    Calc {
        /// Amount borrowed
        #[arg(short, long)]
        principal: Decimal,
        /// Annual interest rate in percent, e.g. 3.5
        #[arg(short, long)]
        rate: Decimal,
        /// Term in months
        #[arg(short, long)]
        term: u32,
        /// Show the first entries of the amortization schedule
        #[arg(short, long)]
        schedule: bool,
        /// Number of schedule entries to show
        #[arg(short, long)]
        window: Option<usize>,
        /// Show the whole schedule
        #[arg(long, conflicts_with = "window")]
        full: bool,
    },
    /// Replay loan payments and show balances and upcoming schedule
    Loans {
        /// Number of schedule entries to show
        #[arg(short, long)]
        window: Option<usize>,
        /// Show the whole remaining schedule
        #[arg(long, conflicts_with = "window")]
        full: bool,
    },
    /// Value investment positions at current quotes
    Portfolio,
    /// Total assets minus outstanding loan balances
    Networth,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => moneyflow::cli::setup::setup(),
        Some(cmd) => moneyflow::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
