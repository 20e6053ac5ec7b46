//! Contains functionality of list containers command
use std::fmt::Write as _;
use std::io;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use libcorral::engine::Engine;
use libcorral::host;
use tabwriter::TabWriter;

/// List the containers below the container path
#[derive(Parser, Debug)]
pub struct List {
    /// Only list running containers
    #[clap(long)]
    pub active: bool,
}

pub fn list(args: List, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let mut content = String::new();
    for container in host::containers(engine, Some(lxcpath))? {
        if args.active && !container.running() {
            continue;
        }

        let state = container
            .state()
            .map(|state| state.to_string())
            .unwrap_or_else(|err| {
                tracing::warn!(?err, "failed to query state");
                "UNKNOWN".to_owned()
            });
        let pid = container
            .init_pid()
            .map(|pid| pid.to_string())
            .unwrap_or_default();
        let ipv4 = if container.running() {
            container.ipv4_addresses().unwrap_or_default().join(",")
        } else {
            String::new()
        };

        let _ = writeln!(
            content,
            "{}\t{}\t{}\t{}",
            container.name(),
            state,
            pid,
            ipv4
        );
    }

    let mut tab_writer = TabWriter::new(io::stdout());
    writeln!(&mut tab_writer, "NAME\tSTATE\tPID\tIPV4")?;
    write!(&mut tab_writer, "{content}")?;
    tab_writer.flush()?;

    Ok(())
}
