//! Lifecycle state of a container as reported by the engine
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Run state of a defined container.
///
/// The engine is the only source of truth; a handle never caches this value.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    // The container is not running
    Stopped,
    // The container is being started
    Starting,
    // The container init process is running
    Running,
    // The container is being stopped
    Stopping,
    // The container start is being aborted
    Aborting,
    // The freezer is suspending all tasks
    Freezing,
    // All tasks are suspended
    Frozen,
    // Tasks were resumed after a freeze
    Thawed,
}

impl State {
    pub const ALL: [State; 8] = [
        State::Stopped,
        State::Starting,
        State::Running,
        State::Stopping,
        State::Aborting,
        State::Freezing,
        State::Frozen,
        State::Thawed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Stopped => "STOPPED",
            State::Starting => "STARTING",
            State::Running => "RUNNING",
            State::Stopping => "STOPPING",
            State::Aborting => "ABORTING",
            State::Freezing => "FREEZING",
            State::Frozen => "FROZEN",
            State::Thawed => "THAWED",
        }
    }

    /// Running and not suspended. Thawed counts as running.
    pub fn is_running_unfrozen(&self) -> bool {
        matches!(self, State::Running | State::Thawed)
    }

    pub fn can_start(&self) -> bool {
        matches!(self, State::Stopped)
    }

    pub fn can_freeze(&self) -> bool {
        self.is_running_unfrozen()
    }

    pub fn can_unfreeze(&self) -> bool {
        matches!(self, State::Frozen)
    }

    /// Destroy, rename, clone and snapshot all need a quiesced container.
    pub fn can_destroy(&self) -> bool {
        matches!(self, State::Stopped)
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown container state {0:?}")]
pub struct UnknownState(pub String);

impl FromStr for State {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        State::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownState(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_str() {
        for state in State::ALL {
            assert_eq!(State::from_str(state.as_str()), Ok(state));
        }
        assert_eq!("FROZEN\n".parse::<State>(), Ok(State::Frozen));
        assert_eq!(
            "running".parse::<State>(),
            Err(UnknownState("running".to_owned()))
        );
    }

    #[test]
    fn test_transitions() {
        assert!(State::Stopped.can_start());
        assert!(!State::Running.can_start());

        assert!(State::Running.can_freeze());
        assert!(State::Thawed.can_freeze());
        assert!(!State::Frozen.can_freeze());
        assert!(!State::Freezing.can_freeze());

        assert!(State::Frozen.can_unfreeze());
        assert!(!State::Running.can_unfreeze());

        assert!(State::Stopped.can_destroy());
        assert!(!State::Frozen.can_destroy());
    }

    #[test]
    fn test_display_matches_engine_names() {
        assert_eq!(State::Frozen.to_string(), "FROZEN");
        assert_eq!(State::Thawed.to_string(), "THAWED");
    }
}
