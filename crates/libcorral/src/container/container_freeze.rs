use super::Container;
use crate::error::{LibcorralError, Result};
use crate::gate::Precondition;

impl Container {
    /// Suspends every task in the container.
    pub fn freeze(&self) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let state = self.state()?;
        if !state.can_freeze() {
            return Err(LibcorralError::AlreadyFrozen { name: self.name() });
        }

        let inner = self.write();
        tracing::debug!(name = %inner.name(), "freezing container");
        if !inner.engine().freeze() {
            tracing::error!(name = %inner.name(), %state, "engine failed to freeze container");
            return Err(LibcorralError::FreezeFailed { name: inner.name() });
        }
        Ok(())
    }

    /// Resumes the tasks of a frozen container.
    pub fn unfreeze(&self) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        if !self.state()?.can_unfreeze() {
            return Err(LibcorralError::NotFrozen { name: self.name() });
        }

        let inner = self.write();
        tracing::debug!(name = %inner.name(), "unfreezing container");
        if !inner.engine().unfreeze() {
            tracing::error!(name = %inner.name(), "engine failed to unfreeze container");
            return Err(LibcorralError::UnfreezeFailed { name: inner.name() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::engine::memory::{MemoryEngine, Primitive};
    use crate::state::State;

    fn running(engine: &MemoryEngine) -> Result<Container> {
        let container = Container::new(engine, "rubik", None)?;
        container.create("busybox", &[])?;
        container.start()?;
        Ok(container)
    }

    #[test]
    fn test_freeze_round_trip() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = running(&engine)?;

        container.freeze()?;
        assert_eq!(container.state()?, State::Frozen);
        assert!(container.running());

        container.unfreeze()?;
        assert_eq!(container.state()?, State::Running);
        Ok(())
    }

    #[test]
    fn test_freeze_twice() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = running(&engine)?;

        container.freeze()?;
        assert!(matches!(
            container.freeze(),
            Err(LibcorralError::AlreadyFrozen { .. })
        ));
        assert_eq!(engine.calls("rubik", Primitive::Freeze), 1);
        Ok(())
    }

    #[test]
    fn test_unfreeze_requires_frozen() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = running(&engine)?;

        assert!(matches!(
            container.unfreeze(),
            Err(LibcorralError::NotFrozen { .. })
        ));
        assert_eq!(engine.calls("rubik", Primitive::Unfreeze), 0);
        Ok(())
    }

    #[test]
    fn test_freeze_stopped_container() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;
        container.create("busybox", &[])?;

        assert!(matches!(
            container.freeze(),
            Err(LibcorralError::NotRunning { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_freeze_failure() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = running(&engine)?;

        engine.fail_next("rubik", Primitive::Freeze);
        assert!(matches!(
            container.freeze(),
            Err(LibcorralError::FreezeFailed { .. })
        ));
        assert_eq!(container.state()?, State::Running);
        Ok(())
    }
}
