//! Error taxonomy shared by every container handle operation

use std::path::PathBuf;

/// Failures reported by a container handle.
///
/// Every variant names the container it concerns. Gate rejections
/// (`NotDefined`, `AlreadyDefined`, `NotRunning`, `AlreadyRunning`,
/// `NotFrozen`, `AlreadyFrozen`) are raised before the engine is touched;
/// the `*Failed` variants mean the engine attempted the operation and said no.
#[derive(Debug, thiserror::Error)]
pub enum LibcorralError {
    #[error("container {name} is not defined")]
    NotDefined { name: String },
    #[error("container {name} is already defined")]
    AlreadyDefined { name: String },
    #[error("container {name} is not running")]
    NotRunning { name: String },
    #[error("container {name} is already running")]
    AlreadyRunning { name: String },
    #[error("container {name} is not frozen")]
    NotFrozen { name: String },
    #[error("container {name} is already frozen")]
    AlreadyFrozen { name: String },
    #[error("container {name} reported unknown state {state:?}")]
    UnknownState { name: String, state: String },

    #[error("creating container {name} failed")]
    CreateFailed { name: String },
    #[error("starting container {name} failed")]
    StartFailed { name: String },
    #[error("stopping container {name} failed")]
    StopFailed { name: String },
    #[error("shutting down container {name} failed")]
    ShutdownFailed { name: String },
    #[error("rebooting container {name} failed")]
    RebootFailed { name: String },
    #[error("destroying container {name} failed")]
    DestroyFailed { name: String },
    #[error("destroying container {name} with all snapshots failed")]
    DestroyWithAllSnapshotsFailed { name: String },
    #[error("freezing container {name} failed")]
    FreezeFailed { name: String },
    #[error("unfreezing container {name} failed")]
    UnfreezeFailed { name: String },
    #[error("cloning container {name} to {new_name} failed")]
    CloneFailed { name: String, new_name: String },
    #[error("renaming container {name} to {new_name} failed")]
    RenameFailed { name: String, new_name: String },
    #[error("attaching to container {name} failed")]
    AttachFailed { name: String },
    #[error("executing the command in temporary container {name} failed")]
    ExecuteFailed { name: String },

    #[error("snapshotting container {name} failed")]
    CreateSnapshotFailed { name: String },
    #[error("restoring snapshot {snapshot} of container {name} as {new_name} failed")]
    RestoreSnapshotFailed {
        name: String,
        snapshot: String,
        new_name: String,
    },
    #[error("destroying snapshot {snapshot} of container {name} failed")]
    DestroySnapshotFailed { name: String, snapshot: String },
    #[error("destroying all snapshots of container {name} failed")]
    DestroyAllSnapshotsFailed { name: String },
    #[error("container {name} has no snapshot")]
    NoSnapshot { name: String },

    #[error("setting config item {key}={value} for container {name} failed")]
    SettingConfigItemFailed {
        name: String,
        key: String,
        value: String,
    },
    #[error("clearing config item {key} for container {name} failed")]
    ClearingConfigItemFailed { name: String, key: String },
    #[error("setting config path {path:?} for container {name} failed")]
    SettingConfigPathFailed { name: String, path: PathBuf },
    #[error("loading config file {path:?} for container {name} failed")]
    LoadConfigFailed { name: String, path: PathBuf },
    #[error("saving config file {path:?} for container {name} failed")]
    SaveConfigFailed { name: String, path: PathBuf },
    #[error("setting daemonize flag for container {name} failed")]
    DaemonizeFailed { name: String },
    #[error("setting close_all_fds flag for container {name} failed")]
    CloseAllFdsFailed { name: String },

    #[error("setting cgroup item {key}={value} for container {name} failed")]
    SettingCgroupItemFailed {
        name: String,
        key: String,
        value: String,
    },
    #[error("clearing cgroup item {key} for container {name} failed")]
    ClearingCgroupItemFailed { name: String, key: String },
    #[error("failed to parse cgroup item {key}={value:?} of container {name}")]
    CgroupItemParse {
        name: String,
        key: String,
        value: String,
    },

    #[error("kernel does not support cgroup memory controller ({key} of container {name})")]
    MemLimitUnsupported { name: String, key: String },
    #[error("kernel does not support cgroup memory controller ({key} of container {name})")]
    SoftMemLimitUnsupported { name: String, key: String },
    #[error("kernel does not support cgroup swap controller ({key} of container {name})")]
    SwapLimitUnsupported { name: String, key: String },
    #[error("kernel does not support cgroup kernel memory controller ({key} of container {name})")]
    KMemLimitUnsupported { name: String, key: String },
    #[error("setting memory limit {value} for container {name} failed")]
    SettingMemoryLimitFailed { name: String, value: String },
    #[error("setting soft memory limit {value} for container {name} failed")]
    SettingSoftMemoryLimitFailed { name: String, value: String },
    #[error("setting memory+swap limit {value} for container {name} failed")]
    SettingMemorySwapLimitFailed { name: String, value: String },
    #[error("setting kernel memory limit {value} for container {name} failed")]
    SettingKMemoryLimitFailed { name: String, value: String },
    #[error("block io usage of container {name} is unavailable")]
    BlkioUsageUnavailable { name: String },

    #[error("getting interface names of container {name} failed")]
    InterfacesUnavailable { name: String },
    #[error("getting IP addresses of container {name} failed (interface {interface:?}, family {family:?})")]
    IpAddressesUnavailable {
        name: String,
        interface: Option<String>,
        family: Option<String>,
    },
    #[error("reading statistics of interface {interface} of container {name} failed")]
    InterfaceStats {
        name: String,
        interface: String,
        source: std::io::Error,
    },
    #[error("attaching network device {device} to container {name} failed")]
    AttachInterfaceFailed { name: String, device: String },
    #[error("detaching network device {device} from container {name} failed")]
    DetachInterfaceFailed { name: String, device: String },
    #[error("adding device {source_path} to container {name} failed")]
    AddDeviceNodeFailed { name: String, source_path: String },
    #[error("removing device {source_path} from container {name} failed")]
    RemoveDeviceNodeFailed { name: String, source_path: String },

    #[error("insufficient number of arguments were supplied for container {name}")]
    InsufficientArguments { name: String },
    #[error("allocating engine resources for container {name} failed")]
    AllocationFailed { name: String },
    #[error("allocating container {name} failed")]
    NewFailed { name: String },
    #[error("releasing container {name} failed")]
    ReleaseFailed { name: String },
}

pub type Result<T> = std::result::Result<T, LibcorralError>;

impl LibcorralError {
    /// Name of the container the failure concerns.
    pub fn container_name(&self) -> &str {
        use LibcorralError::*;
        match self {
            NotDefined { name }
            | AlreadyDefined { name }
            | NotRunning { name }
            | AlreadyRunning { name }
            | NotFrozen { name }
            | AlreadyFrozen { name }
            | UnknownState { name, .. }
            | CreateFailed { name }
            | StartFailed { name }
            | StopFailed { name }
            | ShutdownFailed { name }
            | RebootFailed { name }
            | DestroyFailed { name }
            | DestroyWithAllSnapshotsFailed { name }
            | FreezeFailed { name }
            | UnfreezeFailed { name }
            | CloneFailed { name, .. }
            | RenameFailed { name, .. }
            | AttachFailed { name }
            | ExecuteFailed { name }
            | CreateSnapshotFailed { name }
            | RestoreSnapshotFailed { name, .. }
            | DestroySnapshotFailed { name, .. }
            | DestroyAllSnapshotsFailed { name }
            | NoSnapshot { name }
            | SettingConfigItemFailed { name, .. }
            | ClearingConfigItemFailed { name, .. }
            | SettingConfigPathFailed { name, .. }
            | LoadConfigFailed { name, .. }
            | SaveConfigFailed { name, .. }
            | DaemonizeFailed { name }
            | CloseAllFdsFailed { name }
            | SettingCgroupItemFailed { name, .. }
            | ClearingCgroupItemFailed { name, .. }
            | CgroupItemParse { name, .. }
            | MemLimitUnsupported { name, .. }
            | SoftMemLimitUnsupported { name, .. }
            | SwapLimitUnsupported { name, .. }
            | KMemLimitUnsupported { name, .. }
            | SettingMemoryLimitFailed { name, .. }
            | SettingSoftMemoryLimitFailed { name, .. }
            | SettingMemorySwapLimitFailed { name, .. }
            | SettingKMemoryLimitFailed { name, .. }
            | BlkioUsageUnavailable { name }
            | InterfacesUnavailable { name }
            | IpAddressesUnavailable { name, .. }
            | InterfaceStats { name, .. }
            | AttachInterfaceFailed { name, .. }
            | DetachInterfaceFailed { name, .. }
            | AddDeviceNodeFailed { name, .. }
            | RemoveDeviceNodeFailed { name, .. }
            | InsufficientArguments { name }
            | AllocationFailed { name }
            | NewFailed { name }
            | ReleaseFailed { name } => name,
        }
    }

    /// The kernel lacks the cgroup controller backing a metric. Retrying will
    /// not help; callers usually skip the feature.
    pub fn is_capability_missing(&self) -> bool {
        matches!(
            self,
            LibcorralError::MemLimitUnsupported { .. }
                | LibcorralError::SoftMemLimitUnsupported { .. }
                | LibcorralError::SwapLimitUnsupported { .. }
                | LibcorralError::KMemLimitUnsupported { .. }
        )
    }

    /// The operation was rejected by a lifecycle check before any engine call.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            LibcorralError::NotDefined { .. }
                | LibcorralError::AlreadyDefined { .. }
                | LibcorralError::NotRunning { .. }
                | LibcorralError::AlreadyRunning { .. }
                | LibcorralError::NotFrozen { .. }
                | LibcorralError::AlreadyFrozen { .. }
        )
    }

    /// The engine attempted the operation and reported failure.
    ///
    /// Two handles on the same container can both pass the gate; the loser of
    /// such a race lands here, so callers should treat it as possibly benign.
    pub fn is_engine_failure(&self) -> bool {
        !self.is_precondition()
            && !self.is_capability_missing()
            && !matches!(
                self,
                LibcorralError::InsufficientArguments { .. }
                    | LibcorralError::NoSnapshot { .. }
                    | LibcorralError::CgroupItemParse { .. }
                    | LibcorralError::InterfaceStats { .. }
                    | LibcorralError::UnknownState { .. }
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_name() {
        let err = LibcorralError::RestoreSnapshotFailed {
            name: "rubik".into(),
            snapshot: "snap0".into(),
            new_name: "rubik-restored".into(),
        };
        assert_eq!(err.container_name(), "rubik");
    }

    #[test]
    fn test_classification() {
        let gate = LibcorralError::AlreadyRunning {
            name: "rubik".into(),
        };
        assert!(gate.is_precondition());
        assert!(!gate.is_engine_failure());

        let missing = LibcorralError::MemLimitUnsupported {
            name: "rubik".into(),
            key: "memory.limit_in_bytes".into(),
        };
        assert!(missing.is_capability_missing());
        assert!(!missing.is_engine_failure());

        let parse = LibcorralError::CgroupItemParse {
            name: "rubik".into(),
            key: "cpuacct.usage".into(),
            value: "".into(),
        };
        assert!(!parse.is_capability_missing());
        assert!(!parse.is_engine_failure());

        let start = LibcorralError::StartFailed {
            name: "rubik".into(),
        };
        assert!(start.is_engine_failure());
    }

    #[test]
    fn test_display_carries_key_and_value() {
        let err = LibcorralError::SettingConfigItemFailed {
            name: "rubik".into(),
            key: "lxc.uts.name".into(),
            value: "cube".into(),
        };
        assert_eq!(
            err.to_string(),
            "setting config item lxc.uts.name=cube for container rubik failed"
        );
    }
}
