//! CLI commands
//!
//! `serve` runs the HTTP API; the other commands work against a registry or
//! a local mirror without starting a server.

mod info;
mod list;
mod predict;
mod pull;
mod serve;

pub use info::info;
pub use list::list;
pub use predict::predict;
pub use pull::pull;
pub use serve::serve;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{PricerConfig, StoreKind};

/// Pricer - car price inference server
#[derive(Parser)]
#[command(name = "pricer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start inference server
    Serve {
        /// Config file (YAML or JSON)
        #[arg(long, short, env = "PRICER_CONFIG")]
        config: Option<PathBuf>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Load from the local artifact mirror instead of the registry
        #[arg(long)]
        local: bool,
    },

    /// Predict prices for a JSON file of records
    Predict {
        /// JSON array of records, or `-` for stdin
        #[arg(long, short)]
        input: PathBuf,

        /// Config file (YAML or JSON)
        #[arg(long, short, env = "PRICER_CONFIG")]
        config: Option<PathBuf>,

        /// Load from the local artifact mirror instead of the registry
        #[arg(long)]
        local: bool,
    },

    /// Show the model the configured alias resolves to
    Info {
        /// Config file (YAML or JSON)
        #[arg(long, short, env = "PRICER_CONFIG")]
        config: Option<PathBuf>,

        /// Load from the local artifact mirror instead of the registry
        #[arg(long)]
        local: bool,
    },

    /// Mirror the configured alias from the registry into a local directory
    Pull {
        /// Config file (YAML or JSON)
        #[arg(long, short, env = "PRICER_CONFIG")]
        config: Option<PathBuf>,

        /// Output directory (default: registry.artifact_dir)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List models and runs in a local mirror
    List {
        /// Mirror directory
        #[arg(long, env = "PRICER_ARTIFACT_DIR", default_value = "./models")]
        dir: PathBuf,
    },
}

/// Load configuration, forcing the local store when asked
fn load_config(path: Option<&Path>, local: bool) -> Result<PricerConfig> {
    let mut config = PricerConfig::load(path)?;
    if local {
        config.registry.store = StoreKind::Local;
    }
    Ok(config)
}
