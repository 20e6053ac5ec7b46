//! Contains functionality of cgroup command
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use libcorral::engine::Engine;

use super::load_container;

/// Read or write a cgroup item of a running container
#[derive(Parser, Debug)]
pub struct Cgroup {
    pub name: String,
    /// Controller file, e.g. memory.limit_in_bytes
    pub key: String,
    pub value: Option<String>,
}

pub fn cgroup(args: Cgroup, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = load_container(engine, lxcpath, &args.name)?;
    match args.value {
        Some(value) => container.set_cgroup_item(&args.key, &value)?,
        None => {
            for value in container.cgroup_item(&args.key)? {
                println!("{value}");
            }
        }
    }
    Ok(())
}
