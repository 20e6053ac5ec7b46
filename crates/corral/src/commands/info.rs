//! Contains functions related to printing information about containers and
//! the host's container setup
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use libcorral::engine::Engine;
use libcorral::{host, Container, State};
use serde::Serialize;

use super::load_container;

/// Show a container's state as JSON, or the host setup without a name
#[derive(Parser, Debug)]
pub struct Info {
    pub name: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ContainerInfo {
    name: String,
    state: Option<State>,
    pid: Option<i32>,
    config_file: PathBuf,
    daemonize: bool,
    interfaces: Vec<String>,
    ips: Vec<String>,
    snapshots: usize,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct HostInfo {
    version: String,
    lxcpath: PathBuf,
    lvm_vg: Option<String>,
    zfs_root: Option<String>,
    containers: Vec<String>,
}

fn container_info(container: &Container) -> ContainerInfo {
    let running = container.running();
    ContainerInfo {
        name: container.name(),
        state: container.state().ok(),
        pid: container.init_pid(),
        config_file: container.config_file_name(),
        daemonize: container.daemonize(),
        interfaces: if running {
            container.interfaces().unwrap_or_default()
        } else {
            Vec::new()
        },
        ips: if running {
            container.ip_addresses().unwrap_or_default()
        } else {
            Vec::new()
        },
        snapshots: container.snapshots().map(|s| s.len()).unwrap_or(0),
    }
}

pub fn info(args: Info, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let json = match args.name {
        Some(name) => {
            let container = load_container(engine, lxcpath, &name)?;
            serde_json::to_string_pretty(&container_info(&container))?
        }
        None => serde_json::to_string_pretty(&HostInfo {
            version: host::version(engine),
            lxcpath: lxcpath.to_path_buf(),
            lvm_vg: host::default_lvm_vg(engine),
            zfs_root: host::default_zfs_root(engine),
            containers: host::container_names(engine, Some(lxcpath)),
        })?,
    };
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use libcorral::engine::MemoryEngine;

    use super::*;

    #[test]
    fn test_container_info() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;
        container.create("busybox", &[])?;
        container.start()?;
        engine.add_ip("rubik", "eth0", "10.0.3.15");

        let info = serde_json::to_value(container_info(&container))?;
        assert_eq!(info["name"], "rubik");
        assert_eq!(info["state"], "RUNNING");
        assert_eq!(info["configFile"], "/var/lib/lxc/rubik/config");
        assert_eq!(info["ips"][0], "10.0.3.15");
        assert_eq!(info["snapshots"], 0);
        Ok(())
    }
}
