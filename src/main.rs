//! Browse local directories and blob containers through one filesystem interface.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

mod app_config;
mod commands;
mod trc;

use crate::app_config::Config;
use crate::trc::Trc;

#[derive(Parser)]
#[command(
    version,
    about = "One asynchronous filesystem interface over local disk and blob storage."
)]
struct Args {
    #[arg(
        short,
        long,
        value_parser,
        help = "Optional path to an anyfs config TOML."
    )]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a local directory.
    Ls {
        /// Path to list, absolute or relative to the local root.
        #[arg(default_value = ".")]
        path: String,
    },

    /// Print a local file.
    Cat {
        /// Path of the file, absolute or relative to the local root.
        path: String,
    },

    /// Show type, size and modification time of a local entry.
    Stat {
        /// Path of the entry, absolute or relative to the local root.
        path: String,
    },

    /// Download a blob from the configured container to stdout.
    BlobGet {
        /// Object key inside the container.
        key: String,
    },

    /// Show the properties of a blob in the configured container.
    BlobHead {
        /// Object key inside the container.
        key: String,
    },
}

/// Main entry point for the application.
fn main() {
    let args = Args::parse();

    // Errors use eprintln since tracing isn't initialized yet.
    let config = Config::load(args.config_path.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        std::process::exit(1);
    });
    if let Err(error_messages) = config.validate() {
        eprintln!("Configuration is invalid.");
        for msg in &error_messages {
            eprintln!(" - {msg}");
        }
        std::process::exit(1);
    }

    if let Err(e) = Trc::default().init() {
        eprintln!(
            "Failed to initialize logging. Without logging, we can't provide any useful error \
             messages, so we have to exit: {e}"
        );
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create the async runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match &args.command {
            Command::Ls { path } => commands::ls(&config, path).await,
            Command::Cat { path } => commands::cat(&config, path).await,
            Command::Stat { path } => commands::stat(&config, path).await,
            Command::BlobGet { key } => commands::blob_get(&config, key).await,
            Command::BlobHead { key } => commands::blob_head(&config, key).await,
        }
    });

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}
