//! # Corral
//! Command line front end for libcorral. Each subcommand drives one or more
//! container handles through the lxc tools.
mod commands;
mod lxcpath;
mod observability;

use std::path::PathBuf;

use anyhow::Result;
use clap::{crate_version, Parser};
use libcorral::engine::CommandEngine;

use crate::commands::{
    attach, cgroup, clone, config, create, destroy, device, freeze, info, list, snapshot, start,
    stats, stop, wait,
};

#[derive(Parser, Debug)]
pub struct GlobalOpts {
    /// Write corral's own logs to this file (default is stderr)
    #[clap(short, long, overrides_with("log"))]
    pub log: Option<PathBuf>,
    /// Shorthand for --log-level debug
    #[clap(long)]
    pub debug: bool,
    /// Log format, "text" or "json"
    #[clap(long)]
    pub log_format: Option<String>,
    /// Minimum level to log: error, warn, info, debug or trace
    #[clap(long)]
    pub log_level: Option<String>,
    /// Directory holding the container configurations
    #[clap(short = 'P', long)]
    pub lxcpath: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[clap(version = crate_version!(), author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    #[clap(flatten)]
    global: GlobalOpts,

    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug)]
enum SubCommand {
    List(list::List),
    Info(info::Info),
    Create(create::Create),
    Start(start::Start),
    Stop(stop::Stop),
    Freeze(freeze::Freeze),
    Unfreeze(freeze::Unfreeze),
    Destroy(destroy::Destroy),
    Rename(destroy::Rename),
    Snapshot(snapshot::Snapshot),
    Clone(clone::CloneCmd),
    Stats(stats::Stats),
    Config(config::Config),
    Cgroup(cgroup::Cgroup),
    Device(device::Device),
    Wait(wait::Wait),
    Attach(attach::Attach),
    Exec(attach::Exec),
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    if let Err(e) = observability::init(&opts) {
        eprintln!("log init failed: {e:?}");
    }

    tracing::debug!(
        "started by user {} with {:?}",
        nix::unistd::geteuid(),
        std::env::args_os()
    );
    let engine = CommandEngine::detect();
    let lxcpath = lxcpath::determine(opts.global.lxcpath, &engine)?;
    tracing::debug!(?lxcpath, "using container path");

    match opts.subcmd {
        SubCommand::List(args) => list::list(args, &engine, &lxcpath),
        SubCommand::Info(args) => info::info(args, &engine, &lxcpath),
        SubCommand::Create(args) => create::create(args, &engine, &lxcpath),
        SubCommand::Start(args) => start::start(args, &engine, &lxcpath),
        SubCommand::Stop(args) => stop::stop(args, &engine, &lxcpath),
        SubCommand::Freeze(args) => freeze::freeze(args, &engine, &lxcpath),
        SubCommand::Unfreeze(args) => freeze::unfreeze(args, &engine, &lxcpath),
        SubCommand::Destroy(args) => destroy::destroy(args, &engine, &lxcpath),
        SubCommand::Rename(args) => destroy::rename(args, &engine, &lxcpath),
        SubCommand::Snapshot(args) => snapshot::snapshot(args, &engine, &lxcpath),
        SubCommand::Clone(args) => clone::clone(args, &engine, &lxcpath),
        SubCommand::Stats(args) => stats::stats(args, &engine, &lxcpath),
        SubCommand::Config(args) => config::config(args, &engine, &lxcpath),
        SubCommand::Cgroup(args) => cgroup::cgroup(args, &engine, &lxcpath),
        SubCommand::Device(args) => device::device(args, &engine, &lxcpath),
        SubCommand::Wait(args) => wait::wait(args, &engine, &lxcpath),
        SubCommand::Attach(args) => attach::attach(args, &engine, &lxcpath),
        SubCommand::Exec(args) => attach::exec(args, &engine, &lxcpath),
    }
}
