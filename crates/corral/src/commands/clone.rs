//! Contains functionality of clone container command
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use libcorral::engine::Engine;
use libcorral::types::{BackendStore, CloneFlags};

use super::load_container;

/// Copy a stopped container under a new name
#[derive(Parser, Debug)]
pub struct CloneCmd {
    pub name: String,
    pub new_name: String,
    /// Container path for the copy, defaults to the source's
    #[clap(short = 'p', long)]
    pub newpath: Option<PathBuf>,
    #[clap(short = 'B', long, default_value = "dir")]
    pub backend: BackendStore,
    /// Copy-on-write clone where the backend supports it
    #[clap(short, long)]
    pub snapshot: bool,
    /// Keep the source's hostname
    #[clap(short = 'K', long)]
    pub keepname: bool,
    /// Keep the source's MAC addresses
    #[clap(short = 'M', long)]
    pub keepmac: bool,
}

impl CloneCmd {
    fn flags(&self) -> CloneFlags {
        let mut flags = CloneFlags::empty();
        flags.set(CloneFlags::SNAPSHOT, self.snapshot);
        flags.set(CloneFlags::KEEP_NAME, self.keepname);
        flags.set(CloneFlags::KEEP_MAC_ADDR, self.keepmac);
        flags
    }
}

pub fn clone(args: CloneCmd, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = load_container(engine, lxcpath, &args.name)?;
    let flags = args.flags();
    let cloned = match &args.newpath {
        Some(newpath) => container.clone_to_path(&args.new_name, newpath, args.backend, flags),
        None => container.clone_using(&args.new_name, args.backend, flags),
    };
    cloned.with_context(|| format!("failed to clone {} to {}", args.name, args.new_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let args = CloneCmd::parse_from(["clone", "rubik", "cube", "-s", "-K"]);
        assert_eq!(args.flags(), CloneFlags::SNAPSHOT | CloneFlags::KEEP_NAME);
        assert_eq!(args.backend, BackendStore::Directory);
    }
}
