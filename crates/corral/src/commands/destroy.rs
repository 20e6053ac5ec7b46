//! Contains functionality of destroy and rename container commands
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use libcorral::engine::Engine;

use super::load_container;

/// Destroy a container and its root filesystem
#[derive(Parser, Debug)]
pub struct Destroy {
    pub name: String,
    /// Destroy the container's snapshots as well
    #[clap(short, long)]
    pub snapshots: bool,
    /// Kill the container first if it is running
    #[clap(short, long)]
    pub force: bool,
}

/// Rename a stopped container
#[derive(Parser, Debug)]
pub struct Rename {
    pub name: String,
    pub new_name: String,
}

pub fn destroy(args: Destroy, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = load_container(engine, lxcpath, &args.name)?;
    if args.force && container.running() {
        container
            .stop()
            .with_context(|| format!("failed to kill container {}", args.name))?;
    }

    let destroyed = if args.snapshots {
        container.destroy_with_all_snapshots()
    } else {
        container.destroy()
    };
    destroyed.with_context(|| format!("failed to destroy container {}", args.name))
}

pub fn rename(args: Rename, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = load_container(engine, lxcpath, &args.name)?;
    container
        .rename(&args.new_name)
        .with_context(|| format!("failed to rename container {}", args.name))
}
