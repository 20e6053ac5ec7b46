use std::path::Path;

use super::Container;
use crate::error::{LibcorralError, Result};
use crate::gate::Precondition;
use crate::types::{BackendStore, CloneFlags};

impl Container {
    /// Copies the container to `new_name` below the same config path.
    ///
    /// With [`CloneFlags::SNAPSHOT`] the copy shares storage copy-on-write
    /// where `backend` supports it.
    pub fn clone_using(
        &self,
        new_name: &str,
        backend: BackendStore,
        flags: CloneFlags,
    ) -> Result<()> {
        self.clone_into(new_name, None, backend, flags)
    }

    /// Full directory copy without modifiers.
    pub fn clone(&self, new_name: &str) -> Result<()> {
        self.clone_into(new_name, None, BackendStore::Directory, CloneFlags::empty())
    }

    /// Copies the container to `new_name` below another config path.
    pub fn clone_to_path(
        &self,
        new_name: &str,
        config_path: &Path,
        backend: BackendStore,
        flags: CloneFlags,
    ) -> Result<()> {
        self.clone_into(new_name, Some(config_path), backend, flags)
    }

    fn clone_into(
        &self,
        new_name: &str,
        config_path: Option<&Path>,
        backend: BackendStore,
        flags: CloneFlags,
    ) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::NOT_RUNNING)?;

        let inner = self.write();
        let name = inner.name();
        tracing::debug!(name, new_name, ?config_path, %backend, ?flags, "cloning container");
        if !inner
            .engine()
            .clone_to(new_name, config_path, flags, backend)
        {
            tracing::error!(name, new_name, %backend, "engine failed to clone container");
            return Err(LibcorralError::CloneFailed {
                name,
                new_name: new_name.into(),
            });
        }
        Ok(())
    }
}
