//! Contains functionality of freeze and unfreeze container commands
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use libcorral::engine::Engine;

use super::fan_out;

// Freezing suspends every task of the container through the freezer cgroup
// For more information see :
// https://www.kernel.org/doc/Documentation/cgroup-v1/freezer-subsystem.txt

/// Suspend all processes of one or more containers
#[derive(Parser, Debug)]
pub struct Freeze {
    #[clap(required = true)]
    pub names: Vec<String>,
}

/// Resume all processes of one or more frozen containers
#[derive(Parser, Debug)]
pub struct Unfreeze {
    #[clap(required = true)]
    pub names: Vec<String>,
}

pub fn freeze(args: Freeze, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    tracing::debug!(names = ?args.names, "freezing");
    fan_out(engine, lxcpath, &args.names, |container| Ok(container.freeze()?))
}

pub fn unfreeze(args: Unfreeze, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    tracing::debug!(names = ?args.names, "unfreezing");
    fan_out(engine, lxcpath, &args.names, |container| Ok(container.unfreeze()?))
}
