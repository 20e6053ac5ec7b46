//! Contains functionality of start container command
use std::path::Path;

use anyhow::{bail, Result};
use clap::Parser;
use libcorral::engine::Engine;
use libcorral::State;

use super::{fan_out, timeout};

/// Start one or more containers, each from its own thread
#[derive(Parser, Debug)]
pub struct Start {
    #[clap(required = true)]
    pub names: Vec<String>,
    /// Keep the container in the foreground instead of daemonizing it
    #[clap(short = 'F', long)]
    pub foreground: bool,
    /// Seconds to wait for each container to reach RUNNING
    #[clap(short, long)]
    pub wait: Option<u64>,
}

pub fn start(args: Start, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    fan_out(engine, lxcpath, &args.names, |container| {
        if args.foreground {
            container.want_daemonize(false)?;
        }
        container.start()?;
        if let Some(secs) = args.wait {
            if !container.wait(State::Running, timeout(Some(secs))) {
                bail!("did not reach RUNNING within {secs}s");
            }
        }
        Ok(())
    })
}
