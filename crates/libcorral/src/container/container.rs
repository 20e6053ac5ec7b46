use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::{Engine, EngineContainer, EngineRef};
use crate::error::{LibcorralError, Result};
use crate::gate::{self, Precondition};
use crate::state::State;
use crate::types::Verbosity;

pub(super) struct Inner {
    engine: EngineRef,
    pub(super) verbosity: Verbosity,
}

impl Inner {
    pub(super) fn engine(&self) -> &dyn EngineContainer {
        self.engine.get()
    }

    pub(super) fn name(&self) -> String {
        self.engine().name()
    }
}

/// Handle on one named container.
///
/// The handle holds one engine reference and gives it back exactly once, on
/// [`Container::release`] or on drop. Its lock serializes operations issued
/// through this handle only; two handles on the same name race at the engine.
pub struct Container {
    inner: RwLock<Inner>,
}

impl Container {
    /// Allocates a handle for `name` below `config_path`, or below the
    /// engine's default path.
    pub fn new(engine: &dyn Engine, name: &str, config_path: Option<&Path>) -> Result<Self> {
        let inner = engine.new_container(name, config_path).ok_or_else(|| {
            tracing::error!(name, ?config_path, "engine failed to allocate container");
            LibcorralError::NewFailed { name: name.into() }
        })?;

        Ok(Self::from_engine_ref(EngineRef::adopt(inner)))
    }

    fn from_engine_ref(engine: EngineRef) -> Self {
        Self {
            inner: RwLock::new(Inner {
                engine,
                verbosity: Verbosity::Quiet,
            }),
        }
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs the lifecycle gate. Each observation takes the read lock on its
    /// own and drops it before the caller takes the write lock.
    pub(super) fn make_sure(&self, required: Precondition) -> Result<()> {
        let name = self.name();
        gate::check(required, &name, || self.defined(), || self.running())
    }

    /// A second handle holding its own engine reference on the same object.
    pub fn acquire(&self) -> Result<Container> {
        let inner = self.read();
        let engine = inner.engine.acquire().ok_or_else(|| {
            tracing::error!(name = %inner.name(), "failed to take engine reference");
            LibcorralError::AllocationFailed { name: inner.name() }
        })?;

        let acquired = Self::from_engine_ref(engine);
        acquired.write().verbosity = inner.verbosity;
        Ok(acquired)
    }

    /// Gives the engine reference back. Returns whether the engine freed
    /// the underlying object.
    pub fn release(self) -> Result<bool> {
        let inner = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        let name = inner.name();
        match inner.engine.release() {
            ret if ret < 0 => {
                tracing::error!(name, ret, "failed to release container");
                Err(LibcorralError::ReleaseFailed { name })
            }
            ret => Ok(ret == 1),
        }
    }

    pub fn name(&self) -> String {
        self.read().name()
    }

    /// The root directory the container's configuration lives below.
    pub fn config_path(&self) -> PathBuf {
        self.read().engine().config_path()
    }

    pub fn set_config_path(&self, path: &Path) -> Result<()> {
        let inner = self.write();
        if !inner.engine().set_config_path(path) {
            return Err(LibcorralError::SettingConfigPathFailed {
                name: inner.name(),
                path: path.to_owned(),
            });
        }
        Ok(())
    }

    pub fn config_file_name(&self) -> PathBuf {
        self.read().engine().config_file_name()
    }

    pub fn defined(&self) -> bool {
        self.read().engine().is_defined()
    }

    pub fn running(&self) -> bool {
        self.read().engine().is_running()
    }

    /// Whether the caller has the privileges to control the container.
    pub fn controllable(&self) -> bool {
        self.read().engine().may_control()
    }

    pub fn state(&self) -> Result<State> {
        let inner = self.read();
        let raw = inner.engine().state();
        raw.parse().map_err(|_| LibcorralError::UnknownState {
            name: inner.name(),
            state: raw,
        })
    }

    /// Pid of the container's init process as seen from the host.
    pub fn init_pid(&self) -> Option<i32> {
        let pid = self.read().engine().init_pid();
        (pid > 0).then_some(pid)
    }

    pub fn daemonize(&self) -> bool {
        self.read().engine().daemonize()
    }

    pub fn want_daemonize(&self, state: bool) -> Result<()> {
        let inner = self.write();
        if !inner.engine().want_daemonize(state) {
            return Err(LibcorralError::DaemonizeFailed { name: inner.name() });
        }
        Ok(())
    }

    pub fn want_close_all_fds(&self, state: bool) -> Result<()> {
        let inner = self.write();
        if !inner.engine().want_close_all_fds(state) {
            return Err(LibcorralError::CloseAllFdsFailed { name: inner.name() });
        }
        Ok(())
    }

    pub fn verbosity(&self) -> Verbosity {
        self.read().verbosity
    }

    pub fn set_verbosity(&self, verbosity: Verbosity) {
        self.write().verbosity = verbosity;
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("Container")
            .field("engine", &inner.engine)
            .field("verbosity", &inner.verbosity)
            .finish()
    }
}
