//! Decoding of resource accounting values read through cgroup items
use std::num::{ParseFloatError, ParseIntError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::ByteSize;

// Current memory usage
pub const MEMORY_USAGE: &str = "memory.usage_in_bytes";
// Hard memory limit
pub const MEMORY_LIMIT: &str = "memory.limit_in_bytes";
// Best effort memory limit applied under pressure
pub const MEMORY_SOFT_LIMIT: &str = "memory.soft_limit_in_bytes";
// Kernel memory usage
pub const KMEM_USAGE: &str = "memory.kmem.usage_in_bytes";
// Kernel memory limit
pub const KMEM_LIMIT: &str = "memory.kmem.limit_in_bytes";
// Memory plus swap usage
pub const MEMSW_USAGE: &str = "memory.memsw.usage_in_bytes";
// Memory plus swap limit
pub const MEMSW_LIMIT: &str = "memory.memsw.limit_in_bytes";
// Contains overall cpu consumption
pub const CPUACCT_USAGE: &str = "cpuacct.usage";
// Contains overall cpu consumption differentiated by core
pub const CPUACCT_USAGE_PERCPU: &str = "cpuacct.usage_percpu";
// Contains user mode and kernel mode cpu consumption
pub const CPUACCT_STAT: &str = "cpuacct.stat";
// Bytes transferred per device and operation
pub const BLKIO_SERVICE_BYTES: &str = "blkio.throttle.io_service_bytes";

/// Controller family a byte valued metric belongs to. A kernel lacking the
/// controller is reported per family.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemoryController {
    Memory,
    SoftMemory,
    KernelMemory,
    MemorySwap,
}

impl MemoryController {
    pub fn for_key(key: &str) -> Option<MemoryController> {
        match key {
            MEMORY_USAGE | MEMORY_LIMIT => Some(MemoryController::Memory),
            MEMORY_SOFT_LIMIT => Some(MemoryController::SoftMemory),
            KMEM_USAGE | KMEM_LIMIT => Some(MemoryController::KernelMemory),
            MEMSW_USAGE | MEMSW_LIMIT => Some(MemoryController::MemorySwap),
            _ => None,
        }
    }
}

/// User and system cpu time in clock ticks, as found in `cpuacct.stat`.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CpuStats {
    pub user: u64,
    pub system: u64,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseMetricError {
    #[error("value {value:?} is not a byte count: {err}")]
    ByteSize { value: String, err: ParseFloatError },
    #[error("value {value:?} is not a counter: {err}")]
    Counter { value: String, err: ParseIntError },
    #[error("missing field {field}")]
    MissingField { field: &'static str },
    #[error("line {line:?} does not conform to 'key value'")]
    DoesNotConform { line: String },
}

impl ParseMetricError {
    /// The value was present but not a number, as opposed to a missing field.
    pub fn value(&self) -> Option<&str> {
        match self {
            ParseMetricError::ByteSize { value, .. } | ParseMetricError::Counter { value, .. } => {
                Some(value)
            }
            ParseMetricError::DoesNotConform { line } => Some(line),
            ParseMetricError::MissingField { .. } => None,
        }
    }
}

fn first(items: &[String]) -> &str {
    items.first().map(|s| s.trim()).unwrap_or_default()
}

fn parse_counter(value: &str) -> Result<u64, ParseMetricError> {
    value.parse().map_err(|err| ParseMetricError::Counter {
        value: value.to_owned(),
        err,
    })
}

/// Decodes element 0 of a byte valued item.
pub fn parse_byte_size(items: &[String]) -> Result<ByteSize, ParseMetricError> {
    let value = first(items);
    value
        .parse::<f64>()
        .map(ByteSize)
        .map_err(|err| ParseMetricError::ByteSize {
            value: value.to_owned(),
            err,
        })
}

/// Decodes `cpuacct.usage`, a nanosecond counter.
pub fn parse_cpu_time(items: &[String]) -> Result<Duration, ParseMetricError> {
    parse_counter(first(items)).map(Duration::from_nanos)
}

/// Decodes `cpuacct.usage_percpu`, one nanosecond counter per cpu on a
/// single whitespace separated line.
pub fn parse_cpu_time_per_cpu(items: &[String]) -> Result<Vec<Duration>, ParseMetricError> {
    first(items)
        .split_ascii_whitespace()
        .map(|v| parse_counter(v).map(Duration::from_nanos))
        .collect()
}

/// Decodes `cpuacct.stat`. Fields are located by label so the engine is free
/// to print them in any order.
pub fn parse_cpu_stats(items: &[String]) -> Result<CpuStats, ParseMetricError> {
    let mut user = None;
    let mut system = None;

    for line in items.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        let fields: Vec<&str> = line.split_ascii_whitespace().collect();
        if fields.len() != 2 {
            return Err(ParseMetricError::DoesNotConform {
                line: line.to_owned(),
            });
        }
        match fields[0] {
            "user" => user = Some(parse_counter(fields[1])?),
            "system" => system = Some(parse_counter(fields[1])?),
            _ => {}
        }
    }

    Ok(CpuStats {
        user: user.ok_or(ParseMetricError::MissingField { field: "user" })?,
        system: system.ok_or(ParseMetricError::MissingField { field: "system" })?,
    })
}

/// Decodes the `Total` line of `blkio.throttle.io_service_bytes`.
pub fn parse_blkio_total(items: &[String]) -> Result<ByteSize, ParseMetricError> {
    let total = items
        .iter()
        .map(|line| line.split_ascii_whitespace().collect::<Vec<_>>())
        .find(|fields| fields.first() == Some(&"Total"))
        .ok_or(ParseMetricError::MissingField { field: "Total" })?;

    let value = total.get(1).copied().unwrap_or_default();
    value
        .parse::<f64>()
        .map(ByteSize)
        .map_err(|err| ParseMetricError::ByteSize {
            value: value.to_owned(),
            err,
        })
}
