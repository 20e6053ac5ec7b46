use std::path::{Path, PathBuf};

use super::Container;
use crate::codec::split_items;
use crate::error::{LibcorralError, Result};
use crate::types::LogLevel;

const LOG_FILE_KEY: &str = "lxc.log.file";
const LOG_LEVEL_KEY: &str = "lxc.log.level";

impl Container {
    /// Every value of `key`. An unset key yields a single empty string.
    pub fn config_item(&self, key: &str) -> Vec<String> {
        let inner = self.read();
        split_items(inner.engine().get_config_item(key).as_deref())
    }

    /// Sets `key`. List valued keys such as `lxc.mount.entry` gain one more
    /// value; every other key is replaced.
    pub fn set_config_item(&self, key: &str, value: &str) -> Result<()> {
        let inner = self.write();
        tracing::debug!(name = %inner.name(), key, value, "setting config item");
        if !inner.engine().set_config_item(key, value) {
            tracing::error!(name = %inner.name(), key, value, "engine refused config item");
            return Err(LibcorralError::SettingConfigItemFailed {
                name: inner.name(),
                key: key.into(),
                value: value.into(),
            });
        }
        Ok(())
    }

    /// Removes every value of `key` and of the keys below it.
    pub fn clear_config_item(&self, key: &str) -> Result<()> {
        let inner = self.write();
        tracing::debug!(name = %inner.name(), key, "clearing config item");
        if !inner.engine().clear_config_item(key) {
            return Err(LibcorralError::ClearingConfigItemFailed {
                name: inner.name(),
                key: key.into(),
            });
        }
        Ok(())
    }

    /// Drops the whole in-memory configuration.
    pub fn clear_config(&self) {
        let inner = self.write();
        tracing::debug!(name = %inner.name(), "clearing config");
        inner.engine().clear_config();
    }

    /// Names of the configured keys, optionally only those below `prefix`.
    pub fn config_keys(&self, prefix: Option<&str>) -> Vec<String> {
        let inner = self.read();
        split_items(inner.engine().get_keys(prefix).as_deref())
    }

    /// Value of `key` as applied to the running container.
    pub fn running_config_item(&self, key: &str) -> Vec<String> {
        let inner = self.read();
        split_items(inner.engine().get_running_config_item(key).as_deref())
    }

    pub fn load_config_file(&self, path: &Path) -> Result<()> {
        let inner = self.write();
        tracing::debug!(name = %inner.name(), ?path, "loading config file");
        if !inner.engine().load_config(path) {
            return Err(LibcorralError::LoadConfigFailed {
                name: inner.name(),
                path: path.to_owned(),
            });
        }
        Ok(())
    }

    pub fn save_config_file(&self, path: &Path) -> Result<()> {
        let inner = self.write();
        tracing::debug!(name = %inner.name(), ?path, "saving config file");
        if !inner.engine().save_config(path) {
            return Err(LibcorralError::SaveConfigFailed {
                name: inner.name(),
                path: path.to_owned(),
            });
        }
        Ok(())
    }

    /// File the engine logs this container's activity to, if one is set.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.config_item(LOG_FILE_KEY)
            .into_iter()
            .next()
            .filter(|file| !file.is_empty())
            .map(PathBuf::from)
    }

    pub fn set_log_file(&self, path: &Path) -> Result<()> {
        self.set_config_item(LOG_FILE_KEY, &path.to_string_lossy())
    }

    /// Level of the engine's log file; `None` if unset or unrecognized.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.config_item(LOG_LEVEL_KEY)
            .first()
            .and_then(|level| LogLevel::lookup(level))
    }

    pub fn set_log_level(&self, level: LogLevel) -> Result<()> {
        self.set_config_item(LOG_LEVEL_KEY, level.as_str())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::engine::memory::{MemoryEngine, Primitive};

    #[test]
    fn test_config_round_trip_on_undefined_container() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;

        container.set_config_item("lxc.uts.name", "cube")?;
        assert_eq!(container.config_item("lxc.uts.name"), vec!["cube"]);
        assert!(!container.defined());
        Ok(())
    }

    #[test]
    fn test_unset_key_is_single_empty_item() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;

        assert_eq!(container.config_item("lxc.apparmor.profile"), vec![""]);
        Ok(())
    }

    #[test]
    fn test_multi_valued_item() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;

        container.set_config_item("lxc.cap.drop", "sys_module")?;
        container.set_config_item("lxc.cap.drop", "mac_admin")?;
        assert_eq!(
            container.config_item("lxc.cap.drop"),
            vec!["sys_module", "mac_admin"]
        );

        container.clear_config_item("lxc.cap.drop")?;
        assert_eq!(container.config_item("lxc.cap.drop"), vec![""]);
        Ok(())
    }

    #[test]
    fn test_set_config_item_failure_carries_key_and_value() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;

        engine.fail_next("rubik", Primitive::SetConfigItem);
        let err = container
            .set_config_item("lxc.uts.name", "cube")
            .unwrap_err();
        assert!(matches!(
            err,
            LibcorralError::SettingConfigItemFailed { ref key, ref value, .. }
                if key == "lxc.uts.name" && value == "cube"
        ));
        Ok(())
    }

    #[test]
    fn test_config_keys() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;
        container.set_config_item("lxc.net.0.type", "veth")?;
        container.set_config_item("lxc.net.0.link", "lxcbr0")?;
        container.set_config_item("lxc.arch", "x86_64")?;

        assert_eq!(
            container.config_keys(Some("lxc.net")),
            vec!["lxc.net.0.type", "lxc.net.0.link"]
        );
        container.clear_config();
        assert_eq!(container.config_keys(None), vec![""]);
        Ok(())
    }

    #[test]
    fn test_save_and_load_config_file() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("rubik.conf");
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;
        container.set_config_item("lxc.uts.name", "rubik")?;

        container.save_config_file(&path)?;
        container.clear_config();
        container.load_config_file(&path)?;
        assert_eq!(container.config_item("lxc.uts.name"), vec!["rubik"]);

        let missing = tmp.path().join("missing.conf");
        assert!(matches!(
            container.load_config_file(&missing),
            Err(LibcorralError::LoadConfigFailed { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_log_file_and_level() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;
        assert_eq!(container.log_file(), None);
        assert_eq!(container.log_level(), None);

        container.set_log_file(Path::new("/var/log/lxc/rubik.log"))?;
        container.set_log_level(LogLevel::Debug)?;
        assert_eq!(
            container.log_file(),
            Some(PathBuf::from("/var/log/lxc/rubik.log"))
        );
        assert_eq!(container.log_level(), Some(LogLevel::Debug));

        container.set_config_item(LOG_LEVEL_KEY, "4")?;
        assert_eq!(container.log_level(), Some(LogLevel::Warn));
        Ok(())
    }
}
