use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phonebook::error::Result;
use phonebook::server;
use phonebook::store::EntryStore;
use phonebook::settings::{Overrides, Settings, DEFAULT_CONFIG_FILE};
use phonebook::validation::Candidate;

#[derive(Parser)]
#[command(name = "phonebook", about = "A phonebook served over HTTP")]
struct Cli {
    /// Settings file, looked up without extension
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: String,
    #[arg(long, global = true)]
    port: Option<u16>,
    /// memory or sqlite
    #[arg(long, global = true)]
    storage: Option<String>,
    /// Database file for sqlite storage
    #[arg(long, global = true)]
    database: Option<String>,
    /// validated or unvalidated
    #[arg(long, global = true)]
    validation: Option<String>,
    /// Preload sample persons into memory storage
    #[arg(long, global = true)]
    seed: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Print every entry in the phonebook
    List,
    /// Add one entry to the phonebook
    Add { name: String, number: Option<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phonebook=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let overrides = Overrides {
        port: cli.port,
        storage: cli.storage,
        database: cli.database,
        validation: cli.validation,
        seed: cli.seed.then_some(true),
    };
    let settings = Settings::load(Some(cli.config.as_str()), overrides)?;
    let store = settings.open_store()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::serve(settings.port, store).await?,
        Command::List => {
            println!("phonebook:");
            for entry in store.list()? {
                println!("{} {}", entry.name, entry.number);
            }
        }
        Command::Add { name, number } => {
            let number = number.unwrap_or_default();
            let candidate = Candidate {
                name: Some(name),
                number: Some(number),
            };
            let entry = store.insert(candidate)?;
            if entry.number.is_empty() {
                println!("Added {} to phonebook", entry.name);
            } else {
                println!("Added {} number {} to phonebook", entry.name, entry.number);
            }
        }
    }
    Ok(())
}
