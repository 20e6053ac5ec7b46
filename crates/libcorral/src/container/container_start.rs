use std::time::Duration;

use super::Container;
use crate::codec::timeout_secs;
use crate::error::{LibcorralError, Result};
use crate::gate::Precondition;
use crate::state::State;

impl Container {
    /// Starts the container's configured init.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use libcorral::container::Container;
    /// use libcorral::engine::CommandEngine;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let engine = CommandEngine::default();
    /// let container = Container::new(&engine, "rubik", None)?;
    /// container.start()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn start(&self) -> Result<()> {
        self.start_with_args(&[])
    }

    /// Starts the container running `args` as its init instead of the
    /// configured one.
    pub fn start_with_args(&self, args: &[String]) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::NOT_RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), ?args, "starting container");
        if !inner.engine().start(!args.is_empty(), args) {
            tracing::error!(name = %inner.name(), "engine failed to start container");
            return Err(LibcorralError::StartFailed { name: inner.name() });
        }
        Ok(())
    }

    /// Kills the container without giving its init a chance to clean up.
    pub fn stop(&self) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), "stopping container");
        if !inner.engine().stop() {
            tracing::error!(name = %inner.name(), "engine failed to stop container");
            return Err(LibcorralError::StopFailed { name: inner.name() });
        }
        Ok(())
    }

    /// Asks init to power off and blocks until it does or `timeout` passes.
    /// `None` waits forever. A timeout is reported as `ShutdownFailed`; it is
    /// up to the caller to fall back to [`Container::stop`].
    pub fn shutdown(&self, timeout: Option<Duration>) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        let secs = timeout_secs(timeout);
        tracing::debug!(name = %inner.name(), timeout = secs, "shutting down container");
        if !inner.engine().shutdown(secs) {
            tracing::warn!(name = %inner.name(), timeout = secs, "container did not shut down");
            return Err(LibcorralError::ShutdownFailed { name: inner.name() });
        }
        Ok(())
    }

    pub fn reboot(&self) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), "rebooting container");
        if !inner.engine().reboot() {
            tracing::error!(name = %inner.name(), "engine failed to reboot container");
            return Err(LibcorralError::RebootFailed { name: inner.name() });
        }
        Ok(())
    }

    /// Blocks until the container reaches `state` or `timeout` passes.
    ///
    /// `false` does not tell a timeout apart from an engine that refused to
    /// wait; re-check [`Container::state`] afterwards.
    pub fn wait(&self, state: State, timeout: Option<Duration>) -> bool {
        let inner = self.write();
        let secs = timeout_secs(timeout);
        tracing::debug!(name = %inner.name(), %state, timeout = secs, "waiting for state");
        inner.engine().wait(state.as_str(), secs)
    }
}
