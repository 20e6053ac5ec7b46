//! Contains functionality of config command
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use libcorral::engine::Engine;

use super::load_container;

/// Read, set or clear items of a container's configuration
#[derive(Parser, Debug)]
pub struct Config {
    pub name: String,
    /// Key to read or write; all keys are listed without one
    pub key: Option<String>,
    /// Value to set
    #[clap(requires = "key")]
    pub value: Option<String>,
    /// Clear the key instead of reading it
    #[clap(short, long, requires = "key", conflicts_with = "value")]
    pub clear: bool,
}

pub fn config(args: Config, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = load_container(engine, lxcpath, &args.name)?;

    let Some(key) = args.key else {
        for key in container.config_keys(None) {
            println!("{key}");
        }
        return Ok(());
    };

    if args.clear {
        container.clear_config_item(&key)?;
        return Ok(());
    }

    match args.value {
        Some(value) => Ok(container.set_config_item(&key, &value)?),
        None => {
            for value in container.config_item(&key) {
                println!("{value}");
            }
            Ok(())
        }
    }
}
