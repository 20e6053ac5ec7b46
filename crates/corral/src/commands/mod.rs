use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use libcorral::engine::Engine;
use libcorral::Container;

pub mod attach;
pub mod cgroup;
pub mod clone;
pub mod config;
pub mod create;
pub mod destroy;
pub mod device;
pub mod freeze;
pub mod info;
pub mod list;
pub mod snapshot;
pub mod start;
pub mod stats;
pub mod stop;
pub mod wait;

/// A handle on `name`, defined or not.
fn container_handle(engine: &dyn Engine, lxcpath: &Path, name: &str) -> Result<Container> {
    Container::new(engine, name, Some(lxcpath))
        .with_context(|| format!("could not get a handle on container {name}"))
}

fn load_container(engine: &dyn Engine, lxcpath: &Path, name: &str) -> Result<Container> {
    let container = container_handle(engine, lxcpath, name)?;
    if !container.defined() {
        bail!("container {} does not exist", name)
    }
    Ok(container)
}

fn timeout(secs: Option<u64>) -> Option<Duration> {
    secs.map(Duration::from_secs)
}

/// Runs `op` on every named container, one thread per container, and
/// reports every failure rather than only the first.
fn fan_out<F>(engine: &dyn Engine, lxcpath: &Path, names: &[String], op: F) -> Result<()>
where
    F: Fn(&Container) -> Result<()> + Sync,
{
    let op = &op;
    let failures: Vec<anyhow::Error> = thread::scope(|s| {
        let workers: Vec<_> = names
            .iter()
            .map(|name| {
                s.spawn(move || -> Result<()> {
                    let container = load_container(engine, lxcpath, name)?;
                    op(&container).with_context(|| format!("container {name}"))
                })
            })
            .collect();
        workers
            .into_iter()
            .filter_map(|worker| match worker.join() {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err),
                Err(_) => Some(anyhow!("worker thread panicked")),
            })
            .collect()
    });

    for failure in &failures {
        tracing::error!("{failure:#}");
        eprintln!("{failure:#}");
    }
    if !failures.is_empty() {
        bail!("{} of {} containers failed", failures.len(), names.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use libcorral::engine::MemoryEngine;

    use super::*;

    #[test]
    fn test_load_container_requires_defined() -> Result<()> {
        let engine = MemoryEngine::default();
        let lxcpath = engine.default_config_path();
        assert!(load_container(&engine, &lxcpath, "rubik").is_err());

        container_handle(&engine, &lxcpath, "rubik")?.create("busybox", &[])?;
        assert!(load_container(&engine, &lxcpath, "rubik")?.defined());
        Ok(())
    }

    #[test]
    fn test_fan_out_reports_every_failure() -> Result<()> {
        let engine = MemoryEngine::default();
        let lxcpath = engine.default_config_path();
        container_handle(&engine, &lxcpath, "rubik")?.create("busybox", &[])?;
        let names = vec!["rubik".to_owned(), "ghost".to_owned(), "phantom".to_owned()];

        let err = fan_out(&engine, &lxcpath, &names, |c| Ok(c.start()?)).unwrap_err();
        assert_eq!(err.to_string(), "2 of 3 containers failed");
        assert!(load_container(&engine, &lxcpath, "rubik")?.running());
        Ok(())
    }
}
