use super::Container;
use crate::error::{LibcorralError, Result};
use crate::gate::Precondition;

impl Container {
    /// Makes the host device node `source` available inside the running
    /// container, at `destination` or at the same path.
    pub fn add_device_node(&self, source: &str, destination: Option<&str>) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), source, ?destination, "adding device node");
        if !inner.engine().add_device_node(source, destination) {
            tracing::error!(name = %inner.name(), source, "engine failed to add device node");
            return Err(LibcorralError::AddDeviceNodeFailed {
                name: inner.name(),
                source_path: source.into(),
            });
        }
        Ok(())
    }

    pub fn remove_device_node(&self, source: &str, destination: Option<&str>) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), source, ?destination, "removing device node");
        if !inner.engine().remove_device_node(source, destination) {
            return Err(LibcorralError::RemoveDeviceNodeFailed {
                name: inner.name(),
                source_path: source.into(),
            });
        }
        Ok(())
    }
}
