//! Contains functionality of device command
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use libcorral::engine::Engine;

use super::load_container;

/// Pass host devices into a running container, or take them back
#[derive(Parser, Debug)]
pub struct Device {
    pub name: String,
    #[clap(subcommand)]
    pub action: DeviceAction,
}

#[derive(Subcommand, Debug)]
pub enum DeviceAction {
    /// Add a device node
    Add {
        source: String,
        destination: Option<String>,
    },
    /// Remove a device node
    Del {
        source: String,
        destination: Option<String>,
    },
    /// Move a network interface into the container
    AddNic {
        device: String,
        destination: Option<String>,
    },
    /// Move a network interface back to the host
    DelNic {
        device: String,
        destination: Option<String>,
    },
}

pub fn device(args: Device, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = load_container(engine, lxcpath, &args.name)?;
    let done = match &args.action {
        DeviceAction::Add {
            source,
            destination,
        } => container.add_device_node(source, destination.as_deref()),
        DeviceAction::Del {
            source,
            destination,
        } => container.remove_device_node(source, destination.as_deref()),
        DeviceAction::AddNic {
            device,
            destination,
        } => container.attach_interface(device, destination.as_deref()),
        DeviceAction::DelNic {
            device,
            destination,
        } => container.detach_interface(device, destination.as_deref()),
    };
    done.with_context(|| format!("{:?} on container {} failed", args.action, args.name))
}
