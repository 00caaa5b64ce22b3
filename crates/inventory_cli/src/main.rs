//! CLI entry point for local inventory checks.
//!
//! # Responsibility
//! - Run one inventory request against a configured store.
//! - Print the reply status and JSON body.

use clap::{Parser, Subcommand};
use inventory_core::{
    core_version, default_log_level, init_logging, ApiReply, InventoryService, PartsRepository,
    SqliteConnectionProvider, StoreConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "inventory_cli", version, about = "Run parts inventory requests against a local store")]
struct Cli {
    /// Store configuration file (JSON)
    config: PathBuf,

    /// Directory for rotating log files; logging stays off when unset
    #[arg(long, env = "INVENTORY_LOG_DIR")]
    log_dir: Option<String>,

    /// Log level used when a log directory is set
    #[arg(long, env = "INVENTORY_LOG_LEVEL", default_value_t = default_log_level().to_string())]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Check that the store answers
    Ping,
    /// List every part
    List,
    /// List parts made by a brand
    Brand { maker: String },
    /// Look up one item of a brand by its item number
    Item { maker: String, code: String },
    /// Add a part from a JSON payload
    Add { json: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(&cli.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let config = match StoreConfig::from_path(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    log::info!(
        "event=cli_start module=cli status=ok version={} target={}",
        core_version(),
        config.describe()
    );

    let service = InventoryService::new(PartsRepository::new(SqliteConnectionProvider::new(
        config,
    )));
    let reply = dispatch(&service, &cli.command);

    println!("{}", reply.status);
    println!("{}", reply.body);
    if reply.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn dispatch(service: &InventoryService<SqliteConnectionProvider>, command: &Command) -> ApiReply {
    match command {
        Command::Ping => service.check_db(),
        Command::List => service.all_parts(),
        Command::Brand { maker } => service.brand_parts(Some(maker.as_str())),
        Command::Item { maker, code } => service.brand_item(maker, code),
        Command::Add { json } => service.add_part(json),
    }
}
