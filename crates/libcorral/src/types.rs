//! Small closed enumerations exchanged with the engine
use std::fmt::Display;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// How much the engine echoes while creating or cloning.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Quiet,
    Verbose,
}

impl Verbosity {
    /// Bit value the engine expects in its create flags.
    pub fn as_flags(&self) -> i32 {
        match self {
            Verbosity::Quiet => 1,
            Verbosity::Verbose => 2,
        }
    }
}

/// Storage mechanism backing a container's root filesystem.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendStore {
    #[default]
    Directory,
    Btrfs,
    Lvm,
    Zfs,
    Overlay,
    Aufs,
    Loopback,
    /// Lets the engine pick whatever the host supports best.
    Best,
}

impl BackendStore {
    pub const ALL: [BackendStore; 8] = [
        BackendStore::Directory,
        BackendStore::Btrfs,
        BackendStore::Lvm,
        BackendStore::Zfs,
        BackendStore::Overlay,
        BackendStore::Aufs,
        BackendStore::Loopback,
        BackendStore::Best,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendStore::Directory => "dir",
            BackendStore::Btrfs => "btrfs",
            BackendStore::Lvm => "lvm",
            BackendStore::Zfs => "zfs",
            BackendStore::Overlay => "overlay",
            BackendStore::Aufs => "aufs",
            BackendStore::Loopback => "loop",
            BackendStore::Best => "best",
        }
    }
}

impl Display for BackendStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown backend store {0:?}")]
pub struct UnknownBackendStore(pub String);

impl FromStr for BackendStore {
    type Err = UnknownBackendStore;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dir" | "directory" => Ok(BackendStore::Directory),
            "btrfs" => Ok(BackendStore::Btrfs),
            "lvm" => Ok(BackendStore::Lvm),
            "zfs" => Ok(BackendStore::Zfs),
            "overlay" | "overlayfs" => Ok(BackendStore::Overlay),
            "aufs" => Ok(BackendStore::Aufs),
            "loop" | "loopback" => Ok(BackendStore::Loopback),
            "best" => Ok(BackendStore::Best),
            other => Err(UnknownBackendStore(other.to_owned())),
        }
    }
}

bitflags! {
    /// Modifiers for cloning a container.
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CloneFlags: u32 {
        /// Do not rewrite the hostname inside the rootfs.
        const KEEP_NAME = 1 << 0;
        /// Copy hook scripts into the new container directory.
        const COPY_HOOKS = 1 << 1;
        /// Keep the MAC addresses of network interfaces.
        const KEEP_MAC_ADDR = 1 << 2;
        /// Copy-on-write clone where the backend supports it.
        const SNAPSHOT = 1 << 3;
    }
}

/// Verbosity of the engine's own per-container log file (`lxc.log.level`).
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Notice,
    Warn,
    #[default]
    Error,
    Crit,
    Alert,
    Fatal,
}

impl LogLevel {
    pub const ALL: [LogLevel; 9] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Notice,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Crit,
        LogLevel::Alert,
        LogLevel::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Notice => "NOTICE",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Crit => "CRIT",
            LogLevel::Alert => "ALERT",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// The engine stores levels either by name or by their numeric priority.
    pub fn lookup(value: &str) -> Option<LogLevel> {
        let value = value.trim();
        if let Ok(priority) = value.parse::<usize>() {
            return LogLevel::ALL.get(priority).copied();
        }
        LogLevel::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(value))
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
