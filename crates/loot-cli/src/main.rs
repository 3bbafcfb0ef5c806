mod loot;

use anyhow::Result;
use clap::Parser;
use loot_storage::TrackerConfig;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loot")]
#[command(about = "Import, browse and filter shared loot history", long_about = None)]
struct Cli {
    /// SQLite database holding imported exports.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log at debug level.
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: loot::LootCommand,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut config = TrackerConfig::load();
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }

    loot::handle_loot_command(cli.command, &config)
}

fn init_logging(debug: bool) {
    let level = if debug {
        "debug".to_string()
    } else if let Ok(level) = std::env::var("LOOT_LOG_LEVEL") {
        level
    } else {
        "info".to_string()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
