//! Contains functionality of wait command
use std::path::Path;

use anyhow::{bail, Result};
use clap::Parser;
use libcorral::engine::Engine;
use libcorral::State;

use super::{container_handle, timeout};

/// Block until a container reaches a state
#[derive(Parser, Debug)]
pub struct Wait {
    pub name: String,
    /// State to wait for, e.g. RUNNING or STOPPED
    #[clap(short, long)]
    pub state: State,
    /// Seconds to wait; forever without one
    #[clap(short, long)]
    pub timeout: Option<u64>,
}

pub fn wait(args: Wait, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = container_handle(engine, lxcpath, &args.name)?;
    if !container.wait(args.state, timeout(args.timeout)) {
        bail!("container {} did not reach {}", args.name, args.state);
    }
    Ok(())
}
