//! Contains functionality of create container command
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use libcorral::engine::Engine;
use libcorral::types::{BackendStore, Verbosity};

use super::container_handle;

/// Create a container from a template
#[derive(Parser, Debug)]
pub struct Create {
    pub name: String,
    /// Template to build the root filesystem with
    #[clap(short, long, default_value = "download")]
    pub template: String,
    /// Backing store for the root filesystem
    #[clap(short = 'B', long, default_value = "dir")]
    pub backend: BackendStore,
    /// Distribution for the download template
    #[clap(short, long)]
    pub distro: Option<String>,
    #[clap(short, long)]
    pub release: Option<String>,
    #[clap(short, long)]
    pub arch: Option<String>,
    /// Let the template print its progress
    #[clap(short, long)]
    pub verbose: bool,
    /// Extra arguments for the template
    #[clap(last = true)]
    pub args: Vec<String>,
}

pub fn create(args: Create, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = container_handle(engine, lxcpath, &args.name)?;
    if args.verbose {
        container.set_verbosity(Verbosity::Verbose);
    }

    match (&args.distro, &args.release, &args.arch) {
        (Some(distro), Some(release), Some(arch)) => container
            .create_as_user(distro, release, arch, &args.args)
            .with_context(|| format!("failed to create container {}", args.name)),
        (None, None, None) => container
            .create_using(&args.template, args.backend, &args.args)
            .with_context(|| format!("failed to create container {}", args.name)),
        _ => bail!("--distro, --release and --arch go together"),
    }
}
