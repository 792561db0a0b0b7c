// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! vaultapi - a namespaced secret store served over HTTP.
//!
//! This is the binary entry point for the vaultapi server and its client
//! helpers.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod decrypt;
mod serve;
mod shutdown;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use vaultapi_config::model::VaultApiConfig;

/// vaultapi - a namespaced secret store with transit encryption.
#[derive(Parser, Debug)]
#[command(name = "vaultapi", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Load this file instead of the XDG config hierarchy.
        #[arg(long, short, env = "VAULTAPI_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Decrypt a transit envelope returned by the server.
    Decrypt(decrypt::DecryptArgs),
    /// Load and validate configuration, then exit.
    CheckConfig {
        /// Load this file instead of the XDG config hierarchy.
        #[arg(long, short, env = "VAULTAPI_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Load and validate configuration, rendering diagnostics and exiting on failure.
fn load_config_or_exit(path: Option<&Path>) -> VaultApiConfig {
    let loaded = match path {
        Some(path) => vaultapi_config::load_and_validate_path(path),
        None => vaultapi_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            vaultapi_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let config = load_config_or_exit(config.as_deref());
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Decrypt(args) => match decrypt::run_decrypt(&args) {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        Commands::CheckConfig { config } => {
            let config = load_config_or_exit(config.as_deref());
            println!(
                "vaultapi: config OK (listen={}:{}, transit={}, rate_limit_rules={}, database={})",
                config.server.host,
                config.server.port,
                if config.transit.enabled { "on" } else { "off" },
                config.rate_limit.len(),
                config.storage.database_path,
            );
        }
    }
}
