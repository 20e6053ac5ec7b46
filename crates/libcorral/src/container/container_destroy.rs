use super::Container;
use crate::error::{LibcorralError, Result};
use crate::gate::Precondition;

impl Container {
    /// Removes the container's configuration and root filesystem.
    ///
    /// Snapshots are left behind; use
    /// [`Container::destroy_with_all_snapshots`] to free their space too.
    pub fn destroy(&self) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::NOT_RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), "destroying container");
        if !inner.engine().destroy() {
            tracing::error!(name = %inner.name(), "engine failed to destroy container");
            return Err(LibcorralError::DestroyFailed { name: inner.name() });
        }
        Ok(())
    }

    pub fn destroy_with_all_snapshots(&self) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::NOT_RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), "destroying container and its snapshots");
        if !inner.engine().destroy_with_snapshots() {
            tracing::error!(name = %inner.name(), "engine failed to destroy container with snapshots");
            return Err(LibcorralError::DestroyWithAllSnapshotsFailed { name: inner.name() });
        }
        Ok(())
    }

    /// Renames the container. The handle follows the new name.
    pub fn rename(&self, new_name: &str) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::NOT_RUNNING)?;

        let inner = self.write();
        let name = inner.name();
        tracing::debug!(name, new_name, "renaming container");
        if !inner.engine().rename(new_name) {
            tracing::error!(name, new_name, "engine failed to rename container");
            return Err(LibcorralError::RenameFailed {
                name,
                new_name: new_name.into(),
            });
        }
        Ok(())
    }
}
