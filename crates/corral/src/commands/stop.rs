//! Contains functionality of stop container command
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use libcorral::engine::Engine;
use libcorral::{Container, LibcorralError};

use super::{fan_out, timeout};

/// Shut down, kill or reboot one or more containers
#[derive(Parser, Debug)]
pub struct Stop {
    #[clap(required = true)]
    pub names: Vec<String>,
    /// Kill instead of asking init to shut down
    #[clap(short, long, conflicts_with = "reboot")]
    pub kill: bool,
    /// Reboot instead of shutting down
    #[clap(short, long)]
    pub reboot: bool,
    /// Seconds to wait for a clean shutdown before killing
    #[clap(short, long)]
    pub timeout: Option<u64>,
}

/// Shuts down cleanly, killing the container if it does not comply in time.
fn shutdown_or_kill(container: &Container, secs: Option<u64>) -> libcorral::Result<()> {
    match container.shutdown(timeout(secs)) {
        Err(LibcorralError::ShutdownFailed { name }) => {
            tracing::warn!(name, "clean shutdown failed, killing");
            container.stop()
        }
        other => other,
    }
}

pub fn stop(args: Stop, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    fan_out(engine, lxcpath, &args.names, |container| {
        if args.reboot {
            container.reboot()?;
        } else if args.kill {
            container.stop()?;
        } else {
            shutdown_or_kill(container, args.timeout)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use libcorral::engine::memory::{MemoryEngine, Primitive};

    use super::*;

    #[test]
    fn test_shutdown_falls_back_to_kill() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;
        container.create("busybox", &[])?;
        container.start()?;

        engine.fail_next("rubik", Primitive::Shutdown);
        shutdown_or_kill(&container, Some(1))?;
        assert!(!container.running());
        assert_eq!(engine.calls("rubik", Primitive::Stop), 1);
        Ok(())
    }
}
