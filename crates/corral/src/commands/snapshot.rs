//! Contains functionality of snapshot command
use std::fmt::Write as _;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use libcorral::container::Snapshot as SnapshotRecord;
use libcorral::engine::Engine;
use libcorral::{Container, LibcorralError};
use tabwriter::TabWriter;

use super::load_container;

/// Create, list, restore or destroy snapshots of a stopped container
#[derive(Parser, Debug)]
pub struct Snapshot {
    pub name: String,
    /// List the snapshots
    #[clap(short = 'L', long, conflicts_with_all = ["restore", "destroy"])]
    pub list: bool,
    /// Attach a comment file to the new snapshot
    #[clap(short, long)]
    pub comment: Option<PathBuf>,
    /// Restore the named snapshot as a new container
    #[clap(short, long, requires = "new_name")]
    pub restore: Option<String>,
    /// Name of the container a restore creates
    #[clap(short = 'N', long = "newname")]
    pub new_name: Option<String>,
    /// Destroy the named snapshot, or ALL of them
    #[clap(short, long, conflicts_with = "restore")]
    pub destroy: Option<String>,
}

fn find(container: &Container, name: &str) -> Result<SnapshotRecord> {
    let snapshot = container
        .snapshots()?
        .into_iter()
        .find(|snapshot| snapshot.name == name);
    match snapshot {
        Some(snapshot) => Ok(snapshot),
        None => bail!("container {} has no snapshot {}", container.name(), name),
    }
}

fn print_list(container: &Container) -> Result<()> {
    let snapshots = match container.snapshots() {
        Ok(snapshots) => snapshots,
        Err(LibcorralError::NoSnapshot { .. }) => Vec::new(),
        Err(err) => return Err(err.into()),
    };

    let mut content = String::new();
    for snapshot in snapshots {
        let created = snapshot
            .created()
            .map(|created| created.to_string())
            .unwrap_or_else(|| snapshot.timestamp.clone());
        let _ = writeln!(
            content,
            "{}\t{}\t{}",
            snapshot.name,
            created,
            snapshot.comment_path.display()
        );
    }

    let mut tab_writer = TabWriter::new(io::stdout());
    writeln!(&mut tab_writer, "NAME\tCREATED\tCOMMENT")?;
    write!(&mut tab_writer, "{content}")?;
    tab_writer.flush()?;
    Ok(())
}

pub fn snapshot(args: Snapshot, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = load_container(engine, lxcpath, &args.name)?;

    if args.list {
        return print_list(&container);
    }
    if let Some(name) = args.destroy {
        if name == "ALL" {
            return container
                .destroy_all_snapshots()
                .with_context(|| format!("failed to destroy snapshots of {}", args.name));
        }
        let snapshot = find(&container, &name)?;
        return Ok(container.destroy_snapshot(&snapshot)?);
    }
    if let (Some(name), Some(new_name)) = (args.restore, args.new_name) {
        let snapshot = find(&container, &name)?;
        return Ok(container.restore_snapshot(&snapshot, &new_name)?);
    }

    let snapshot = match args.comment {
        Some(comment) => container.create_snapshot_with_comment(&comment)?,
        None => container.create_snapshot()?,
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
