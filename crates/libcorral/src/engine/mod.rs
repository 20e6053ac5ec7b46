//! An interface trait so that the container handle can drive the
//! container engine without knowing how primitives are carried out
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::container::{AttachOptions, ConsoleOptions};
use crate::types::{BackendStore, CloneFlags, Verbosity};

pub mod command;
pub mod config_file;
pub mod memory;

pub use command::CommandEngine;
pub use memory::MemoryEngine;

/// A snapshot as listed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub name: String,
    pub comment_path: PathBuf,
    pub timestamp: String,
    pub path: PathBuf,
}

/// Factory and host wide queries of a container engine.
pub trait Engine: Send + Sync {
    /// Allocates an engine side object for `name`. `None` when the engine
    /// cannot allocate one; the reference count of a fresh object is one.
    fn new_container(
        &self,
        name: &str,
        config_path: Option<&Path>,
    ) -> Option<Arc<dyn EngineContainer>>;
    fn version(&self) -> String;
    fn default_config_path(&self) -> PathBuf;
    /// Host level configuration such as `lxc.bdev.lvm.vg`.
    fn global_config_item(&self, key: &str) -> Option<String>;
    /// Names of the containers that have a configuration under
    /// `config_path`, sorted.
    fn container_names(&self, config_path: &Path) -> Vec<String>;
}

/// Primitive operations on one engine side container object.
///
/// Pass/fail primitives return `bool`, reads return `None` when the engine
/// has nothing to say, and primitives returning an index, fd or pid use a
/// negative value for failure.
pub trait EngineContainer: Send + Sync {
    fn name(&self) -> String;
    fn config_path(&self) -> PathBuf;
    fn set_config_path(&self, path: &Path) -> bool;
    fn config_file_name(&self) -> PathBuf;

    fn is_defined(&self) -> bool;
    fn is_running(&self) -> bool;
    fn may_control(&self) -> bool;
    fn state(&self) -> String;
    fn init_pid(&self) -> i32;
    fn daemonize(&self) -> bool;
    fn want_daemonize(&self, state: bool) -> bool;
    fn want_close_all_fds(&self, state: bool) -> bool;

    fn start(&self, use_init: bool, args: &[String]) -> bool;
    fn stop(&self) -> bool;
    fn shutdown(&self, timeout_secs: i32) -> bool;
    fn reboot(&self) -> bool;
    fn create(
        &self,
        template: &str,
        backend: BackendStore,
        verbosity: Verbosity,
        args: &[String],
    ) -> bool;
    fn destroy(&self) -> bool;
    fn destroy_with_snapshots(&self) -> bool;
    fn rename(&self, new_name: &str) -> bool;
    fn freeze(&self) -> bool;
    fn unfreeze(&self) -> bool;
    fn wait(&self, state: &str, timeout_secs: i32) -> bool;

    fn get_config_item(&self, key: &str) -> Option<String>;
    fn set_config_item(&self, key: &str, value: &str) -> bool;
    fn clear_config_item(&self, key: &str) -> bool;
    fn clear_config(&self);
    fn get_keys(&self, prefix: Option<&str>) -> Option<String>;
    fn get_running_config_item(&self, key: &str) -> Option<String>;
    fn load_config(&self, path: &Path) -> bool;
    fn save_config(&self, path: &Path) -> bool;

    fn get_cgroup_item(&self, key: &str) -> Option<String>;
    fn set_cgroup_item(&self, key: &str, value: &str) -> bool;

    fn snapshot(&self, comment_file: Option<&Path>) -> i32;
    fn snapshot_list(&self) -> Option<Vec<SnapshotRecord>>;
    fn snapshot_restore(&self, snapshot: &str, new_name: &str) -> bool;
    fn snapshot_destroy(&self, snapshot: &str) -> bool;
    fn snapshot_destroy_all(&self) -> bool;
    fn clone_to(
        &self,
        new_name: &str,
        config_path: Option<&Path>,
        flags: CloneFlags,
        backend: BackendStore,
    ) -> bool;

    fn get_interfaces(&self) -> Option<Vec<String>>;
    fn get_ips(&self, interface: Option<&str>, family: Option<&str>, scope: i32)
        -> Option<Vec<String>>;
    fn attach_interface(&self, device: &str, destination: Option<&str>) -> bool;
    fn detach_interface(&self, device: &str, destination: Option<&str>) -> bool;
    fn add_device_node(&self, source: &str, destination: Option<&str>) -> bool;
    fn remove_device_node(&self, source: &str, destination: Option<&str>) -> bool;

    fn attach_shell(&self, options: &AttachOptions) -> i32;
    /// Runs `args` inside the container and returns its exit status.
    fn attach_run_wait(&self, options: &AttachOptions, args: &[String]) -> i32;
    fn console_getfd(&self, ttynum: i32) -> i32;
    fn console(&self, options: &ConsoleOptions) -> bool;
    /// Runs `args` in a temporary container and returns the combined output.
    fn execute(&self, args: &[String]) -> Option<Vec<u8>>;

    /// Takes one more reference on the engine object.
    fn get(&self) -> bool;
    /// Drops one reference; 1 when the object was freed, 0 when references
    /// remain and negative on error.
    fn put(&self) -> i32;
}

/// Owned reference on an engine side container object.
///
/// The reference is put back exactly once: either through [`EngineRef::release`]
/// or when the value is dropped.
pub struct EngineRef {
    inner: Arc<dyn EngineContainer>,
    released: bool,
}

impl EngineRef {
    /// Adopts a reference the caller already holds.
    pub fn adopt(inner: Arc<dyn EngineContainer>) -> Self {
        Self {
            inner,
            released: false,
        }
    }

    /// Takes an additional reference on the same engine object.
    pub fn acquire(&self) -> Option<EngineRef> {
        if !self.inner.get() {
            return None;
        }
        Some(Self::adopt(Arc::clone(&self.inner)))
    }

    /// Gives the reference back, reporting the engine's verdict.
    pub fn release(mut self) -> i32 {
        self.released = true;
        self.inner.put()
    }

    pub fn get(&self) -> &dyn EngineContainer {
        self.inner.as_ref()
    }
}

impl Drop for EngineRef {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let ret = self.inner.put();
        if ret < 0 {
            tracing::warn!(name = %self.inner.name(), ret, "failed to put engine reference");
        }
    }
}

impl std::fmt::Debug for EngineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRef")
            .field("name", &self.inner.name())
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::{MemoryEngine, Primitive};

    #[test]
    fn test_release_puts_once() {
        let engine = MemoryEngine::default();
        let inner = engine.new_container("rubik", None).unwrap();
        let engine_ref = EngineRef::adopt(inner);
        assert_eq!(engine.refcount("rubik"), 1);

        assert_eq!(engine_ref.release(), 1);
        assert_eq!(engine.refcount("rubik"), 0);
        assert_eq!(engine.calls("rubik", Primitive::Put), 1);
    }

    #[test]
    fn test_drop_puts_once() {
        let engine = MemoryEngine::default();
        {
            let engine_ref = EngineRef::adopt(engine.new_container("rubik", None).unwrap());
            let second = engine_ref.acquire().unwrap();
            assert_eq!(engine.refcount("rubik"), 2);
            drop(second);
            assert_eq!(engine.refcount("rubik"), 1);
        }
        assert_eq!(engine.refcount("rubik"), 0);
        assert_eq!(engine.calls("rubik", Primitive::Put), 2);
    }

    #[test]
    fn test_acquire_fails_when_get_fails() {
        let engine = MemoryEngine::default();
        let engine_ref = EngineRef::adopt(engine.new_container("rubik", None).unwrap());
        engine.fail_next("rubik", Primitive::Get);
        assert!(engine_ref.acquire().is_none());
        assert_eq!(engine.refcount("rubik"), 1);
    }
}
