//! Precondition checks run before every state-sensitive operation
use bitflags::bitflags;

use crate::error::{LibcorralError, Result};

bitflags! {
    /// Lifecycle requirements an operation declares before it may reach the engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Precondition: u8 {
        const DEFINED = 1 << 0;
        const NOT_DEFINED = 1 << 1;
        const RUNNING = 1 << 2;
        const NOT_RUNNING = 1 << 3;
    }
}

/// Evaluates `required` against live observations.
///
/// Observations are taken lazily and only for the axes `required` mentions.
/// Definedness is always decided before run state, so an undefined container
/// reports `NotDefined` even when the operation also requires it to be running.
pub fn check<D, R>(required: Precondition, name: &str, defined: D, running: R) -> Result<()>
where
    D: FnOnce() -> bool,
    R: FnOnce() -> bool,
{
    if required.intersects(Precondition::DEFINED | Precondition::NOT_DEFINED) {
        let defined = defined();
        if required.contains(Precondition::DEFINED) && !defined {
            return Err(LibcorralError::NotDefined { name: name.into() });
        }
        if required.contains(Precondition::NOT_DEFINED) && defined {
            return Err(LibcorralError::AlreadyDefined { name: name.into() });
        }
    }

    if required.intersects(Precondition::RUNNING | Precondition::NOT_RUNNING) {
        let running = running();
        if required.contains(Precondition::RUNNING) && !running {
            return Err(LibcorralError::NotRunning { name: name.into() });
        }
        if required.contains(Precondition::NOT_RUNNING) && running {
            return Err(LibcorralError::AlreadyRunning { name: name.into() });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn run(required: Precondition, defined: bool, running: bool) -> Result<()> {
        check(required, "rubik", || defined, || running)
    }

    #[test]
    fn test_empty_precondition_always_passes() {
        for (d, r) in [(false, false), (true, false), (true, true)] {
            assert!(run(Precondition::empty(), d, r).is_ok());
        }
    }

    #[test]
    fn test_defined_checked_before_running() {
        let err = run(Precondition::DEFINED | Precondition::RUNNING, false, false).unwrap_err();
        assert!(matches!(err, LibcorralError::NotDefined { .. }));
    }

    #[test]
    fn test_each_flag() {
        assert!(matches!(
            run(Precondition::NOT_DEFINED, true, false),
            Err(LibcorralError::AlreadyDefined { .. })
        ));
        assert!(matches!(
            run(Precondition::DEFINED | Precondition::RUNNING, true, false),
            Err(LibcorralError::NotRunning { .. })
        ));
        assert!(matches!(
            run(Precondition::DEFINED | Precondition::NOT_RUNNING, true, true),
            Err(LibcorralError::AlreadyRunning { .. })
        ));
        assert!(run(Precondition::DEFINED | Precondition::NOT_RUNNING, true, false).is_ok());
        assert!(run(Precondition::DEFINED | Precondition::RUNNING, true, true).is_ok());
    }

    #[test]
    fn test_observations_are_lazy() {
        let defined_calls = Cell::new(0);
        let running_calls = Cell::new(0);

        check(
            Precondition::NOT_DEFINED,
            "rubik",
            || {
                defined_calls.set(defined_calls.get() + 1);
                false
            },
            || {
                running_calls.set(running_calls.get() + 1);
                false
            },
        )
        .unwrap();

        assert_eq!(defined_calls.get(), 1);
        assert_eq!(running_calls.get(), 0);
    }

    #[test]
    fn test_rejection_carries_name() {
        let err = run(Precondition::DEFINED, false, false).unwrap_err();
        assert_eq!(err.container_name(), "rubik");
    }
}
