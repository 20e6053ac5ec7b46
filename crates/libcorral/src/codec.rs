//! Conversions between the engine's flat string protocol and typed values
use std::fmt::Display;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Splits a possibly multi-valued engine reply into its lines.
///
/// Surrounding whitespace is trimmed first. An absent or empty reply decodes
/// to a single empty element, so `items[0] == ""` means "unset". Empty lines
/// inside the reply are kept, which keeps positional indices stable.
#[tracing::instrument(level = "trace")]
pub fn split_items(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .trim()
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_owned())
        .collect()
}

/// Engine timeouts are whole seconds; -1 waits forever.
pub fn timeout_secs(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        Some(timeout) => i32::try_from(timeout.as_secs()).unwrap_or(i32::MAX),
    }
}

/// A byte count as reported by cgroup accounting files.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct ByteSize(pub f64);

impl ByteSize {
    pub const B: ByteSize = ByteSize(1.0);
    pub const KB: ByteSize = ByteSize((1u64 << 10) as f64);
    pub const MB: ByteSize = ByteSize((1u64 << 20) as f64);
    pub const GB: ByteSize = ByteSize((1u64 << 30) as f64);
    pub const TB: ByteSize = ByteSize((1u64 << 40) as f64);
    pub const PB: ByteSize = ByteSize((1u64 << 50) as f64);
    pub const EB: ByteSize = ByteSize((1u64 << 60) as f64);
    pub const ZB: ByteSize = ByteSize((1u128 << 70) as f64);
    pub const YB: ByteSize = ByteSize((1u128 << 80) as f64);

    pub fn bytes(&self) -> f64 {
        self.0
    }

    /// Parses a decimal byte count, accepting the float notation some
    /// kernels print for very large limits.
    #[tracing::instrument(level = "trace")]
    pub fn parse(value: &str) -> Option<ByteSize> {
        value.trim().parse::<f64>().ok().map(ByteSize)
    }

    /// Whole-byte rendering understood by cgroup limit files.
    pub fn to_engine_value(&self) -> String {
        format!("{:.0}", self.0)
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        ByteSize(bytes as f64)
    }
}

impl Display for ByteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const UNITS: [(ByteSize, &str); 8] = [
            (ByteSize::YB, "YB"),
            (ByteSize::ZB, "ZB"),
            (ByteSize::EB, "EB"),
            (ByteSize::PB, "PB"),
            (ByteSize::TB, "TB"),
            (ByteSize::GB, "GB"),
            (ByteSize::MB, "MB"),
            (ByteSize::KB, "KB"),
        ];

        for (unit, suffix) in UNITS {
            if self.0 >= unit.0 {
                return write!(f, "{:.2}{}", self.0 / unit.0, suffix);
            }
        }
        write!(f, "{:.2}B", self.0)
    }
}
