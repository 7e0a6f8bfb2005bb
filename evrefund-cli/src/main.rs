use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use evrefund_api::{BatchOptions, PortalClient, run_refunds};
use evrefund_core::{BillQuery, DateWindow, WindowStrategy};
use std::path::{Path, PathBuf};
use tracing::{error, info};

mod config;
mod env;
mod logging;
mod state;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("EVREFUND_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "evrefund",
    version = VERSION,
    about = "Refund awaiting-refund EV charging bills through the portal API"
)]
struct Cli {
    /// Settings file (default: ~/.evrefund/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in, fetch bills awaiting refund and refund every bill with a positive amount (default)
    Run(RunArgs),

    /// Write the default settings file if it does not exist yet
    InitConfig,

    /// Print effective settings and which credentials are set
    ShowConfig,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Query window: today | since-yesterday (overrides settings)
    #[arg(long)]
    window: Option<WindowStrategy>,

    /// Treat this day (YYYY-MM-DD) as today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Log what would be refunded without calling the refund endpoint
    #[arg(long)]
    dry_run: bool,

    /// Write the log file only
    #[arg(long)]
    no_console: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    match cli.command.unwrap_or_else(|| Command::Run(RunArgs::default())) {
        Command::Run(args) => run(cli.config.as_deref(), args).await,
        Command::InitConfig => config::init_config(cli.config.as_deref()),
        Command::ShowConfig => show_config(cli.config.as_deref()),
    }
}

async fn run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    // Nothing may touch the log directory or the network before this succeeds.
    let creds = env::load_credentials()?;
    let settings = config::load_settings(config_path)?;

    let console = settings.log.console && !args.no_console;
    let log_path = logging::init(&settings.log, console)?;
    println!("Logs: {}.<date>", log_path.display());

    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    let strategy = args.window.unwrap_or(settings.query.window);
    let window = DateWindow::resolve(strategy, today);
    let query = BillQuery::new(&settings.query.filter(), &window);
    let batch = BatchOptions::new(settings.refund.note_prefix.clone(), today)
        .with_dry_run(args.dry_run);

    info!(
        version = VERSION,
        %today,
        window = %strategy,
        headers = %settings.http.headers,
        dry_run = args.dry_run,
        "auto-refund starting"
    );

    let client = PortalClient::new(&creds, settings.client_options())
        .context("build portal client")?;

    match run_refunds(&client, &creds, &query, &batch).await {
        Ok(outcome) => {
            info!(%outcome, "done");
            Ok(())
        }
        Err(e) => {
            error!("aborting run");
            Err(e).context("login failed")
        }
    }
}

fn show_config(config_path: Option<&Path>) -> Result<()> {
    let settings = config::load_settings(config_path)?;
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => config::default_config_path()?,
    };
    let source = if path.exists() { "file" } else { "defaults" };

    println!("# settings ({source}: {})\n", path.display());
    println!(
        "{}",
        toml::to_string_pretty(&settings).context("serialize settings")?
    );

    println!("# credentials");
    match env::load_credentials() {
        Ok(creds) => println!("{creds:?}"),
        Err(e) => println!("{e}"),
    }
    Ok(())
}
