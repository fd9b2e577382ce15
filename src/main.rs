// src/main.rs
use std::{fs::OpenOptions, net::SocketAddr, path::{Path, PathBuf}, str::FromStr, sync::Mutex};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trip_expense_tracker::{
    backend, cli,
    config::Config,
    database::{
        db::{connection, migrate},
        models::{Category, ExpenseFilter},
    },
};

#[derive(Parser, Debug)]
#[command(name = "trip-expenses", version, about = "Track shared expenses of a group trip")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Overrides BIND_ADDR
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Interactive terminal client (default)
    Tui,
    /// Write a PDF report of the (filtered) expenses
    Export {
        #[arg(long)]
        payer: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
        #[arg(short, long, default_value = "expenses.pdf")]
        out: PathBuf,
    },
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stdout_logging() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// The TUI owns the screen, so its logs go to a file.
fn init_file_logging(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn parse_day(flag: &str, value: Option<String>) -> anyhow::Result<Option<chrono::NaiveDate>> {
    value
        .map(|v| {
            cli::util::parse_date(&v).ok_or_else(|| anyhow!("--{flag} must be YYYY-MM-DD, got '{v}'"))
        })
        .transpose()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Cli::parse();
    let command = args.command.unwrap_or(Command::Tui);

    let mut config = match &command {
        Command::Tui => {
            let config = Config::load()?;
            init_file_logging(&config.log_file)?;
            config
        }
        _ => {
            init_stdout_logging();
            Config::load()?
        }
    };

    let pool = connection::get_db_pool(&config.database_url).await?;
    migrate::run_migrations(&pool).await?;

    match command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            info!("Starting backend server");
            backend::run_server(pool, config).await?;
        }
        Command::Tui => {
            info!("Starting terminal client");
            cli::run(pool, &config).await?;
        }
        Command::Export {
            payer,
            category,
            from,
            to,
            out,
        } => {
            let filter = ExpenseFilter {
                payer: payer.filter(|p| !p.trim().is_empty()),
                category: category
                    .map(|c| Category::from_str(&c).map_err(|e| anyhow!(e)))
                    .transpose()?,
                from: parse_day("from", from)?,
                to: parse_day("to", to)?,
            };
            let client = cli::api::Client::new(pool, &config);
            let count = client.export_pdf(&filter, &out).await?;
            println!("Wrote {count} expenses to {}", out.display());
        }
    }
    Ok(())
}
