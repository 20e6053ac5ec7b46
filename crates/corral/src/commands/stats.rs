//! Contains functionality of stats command
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use libcorral::codec::ByteSize;
use libcorral::engine::Engine;
use libcorral::Container;

use super::fan_out;

/// Print resource usage of one or more running containers
#[derive(Parser, Debug)]
pub struct Stats {
    #[clap(required = true)]
    pub names: Vec<String>,
}

fn show<T, F>(value: libcorral::Result<T>, render: F) -> String
where
    F: FnOnce(T) -> String,
{
    match value {
        Ok(value) => render(value),
        Err(err) if err.is_capability_missing() => "unsupported".to_owned(),
        Err(err) => {
            tracing::warn!(?err, "failed to read metric");
            "n/a".to_owned()
        }
    }
}

fn byte_size(value: ByteSize) -> String {
    value.to_string()
}

fn report(container: &Container) -> Result<String> {
    let mut lines = vec![container.name()];
    let mut push = |label: &str, value: String| lines.push(format!("  {label:<20}{value}"));

    push("memory usage", show(container.memory_usage(), byte_size));
    push("memory limit", show(container.memory_limit(), byte_size));
    push("soft memory limit", show(container.soft_memory_limit(), byte_size));
    push("kmem usage", show(container.kernel_memory_usage(), byte_size));
    push("kmem limit", show(container.kernel_memory_limit(), byte_size));
    push("memory+swap usage", show(container.memory_swap_usage(), byte_size));
    push("memory+swap limit", show(container.memory_swap_limit(), byte_size));
    push("blkio usage", show(container.blkio_usage(), byte_size));
    push(
        "cpu time",
        show(container.cpu_time(), |time| format!("{time:?}")),
    );
    push(
        "cpu time per cpu",
        show(container.cpu_time_per_cpu(), |times| format!("{times:?}")),
    );
    push(
        "cpu stats",
        show(container.cpu_stats(), |stats| {
            format!("user {} system {}", stats.user, stats.system)
        }),
    );
    for (interface, stats) in container.interface_stats()? {
        push(&interface, format!("rx {} tx {}", stats.rx, stats.tx));
    }

    Ok(lines.join("\n"))
}

pub fn stats(args: Stats, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    fan_out(engine, lxcpath, &args.names, |container| {
        println!("{}", report(container)?);
        Ok(())
    })
}
