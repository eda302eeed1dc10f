use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5080";
const DEFAULT_DATA_FILE: &str = "Data Source/products.json";

/// Command-line flags. Each one falls back to its environment variable,
/// then to the built-in default.
#[derive(Debug, Parser)]
#[command(name = "product-store", version, about = "Product CRUD API backed by a JSON file")]
pub struct Cli {
    /// Address the HTTP server listens on
    #[arg(long, env = "PRODUCT_STORE_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind: String,

    /// JSON file holding the product collection
    #[arg(long, env = "PRODUCT_STORE_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_file: PathBuf,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> Result<Self> {
        let bind_addr = cli
            .bind
            .parse::<SocketAddr>()
            .context("PRODUCT_STORE_BIND_ADDR must be a valid host:port")?;

        Ok(Self {
            bind_addr,
            data_file: cli.data_file,
        })
    }
}
