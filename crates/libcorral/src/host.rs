//! Host wide queries that are not tied to one container
use std::path::{Path, PathBuf};

use crate::container::Container;
use crate::engine::Engine;
use crate::error::Result;

const LVM_VG_KEY: &str = "lxc.bdev.lvm.vg";
const ZFS_ROOT_KEY: &str = "lxc.bdev.zfs.root";

/// Version string of the engine.
pub fn version(engine: &dyn Engine) -> String {
    engine.version()
}

/// Where containers live unless told otherwise.
pub fn default_config_path(engine: &dyn Engine) -> PathBuf {
    engine.default_config_path()
}

/// Volume group new LVM backed containers are carved from.
pub fn default_lvm_vg(engine: &dyn Engine) -> Option<String> {
    engine.global_config_item(LVM_VG_KEY)
}

/// Dataset new ZFS backed containers are created below.
pub fn default_zfs_root(engine: &dyn Engine) -> Option<String> {
    engine.global_config_item(ZFS_ROOT_KEY)
}

fn resolve(engine: &dyn Engine, config_path: Option<&Path>) -> PathBuf {
    config_path.map_or_else(|| engine.default_config_path(), Path::to_path_buf)
}

/// Names of all containers with a configuration below `config_path`.
pub fn container_names(engine: &dyn Engine, config_path: Option<&Path>) -> Vec<String> {
    engine.container_names(&resolve(engine, config_path))
}

/// Handles on every container below `config_path`.
pub fn containers(engine: &dyn Engine, config_path: Option<&Path>) -> Result<Vec<Container>> {
    let path = resolve(engine, config_path);
    engine
        .container_names(&path)
        .iter()
        .map(|name| Container::new(engine, name, Some(&path)))
        .collect()
}

fn names_where<F>(engine: &dyn Engine, config_path: Option<&Path>, keep: F) -> Result<Vec<String>>
where
    F: Fn(&Container) -> bool,
{
    let names = containers(engine, config_path)?
        .iter()
        .filter(|container| keep(container))
        .map(Container::name)
        .collect();
    Ok(names)
}

/// Names of the containers below `config_path` that are defined.
pub fn defined_container_names(
    engine: &dyn Engine,
    config_path: Option<&Path>,
) -> Result<Vec<String>> {
    names_where(engine, config_path, Container::defined)
}

/// Names of the containers below `config_path` that are running.
pub fn active_container_names(
    engine: &dyn Engine,
    config_path: Option<&Path>,
) -> Result<Vec<String>> {
    names_where(engine, config_path, Container::running)
}
