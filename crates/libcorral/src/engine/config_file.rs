//! Ordered `key = value` container configuration
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::Path;

// Keys that may appear any number of times; setting them appends.
const LIST_KEYS: &[&str] = &[
    "lxc.mount.entry",
    "lxc.cap.drop",
    "lxc.cap.keep",
    "lxc.environment",
    "lxc.idmap",
    "lxc.include",
    "lxc.group",
];
const LIST_PREFIXES: &[&str] = &["lxc.hook."];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Item { key: String, value: String },
    Other(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    lines: Vec<Line>,
}

fn is_list_key(key: &str) -> bool {
    LIST_KEYS.contains(&key) || LIST_PREFIXES.iter().any(|p| key.starts_with(p))
}

// `lxc.net` covers `lxc.net.0.type` but not `lxc.network`.
fn is_below(key: &str, parent: &str) -> bool {
    key == parent
        || key
            .strip_prefix(parent)
            .is_some_and(|rest| rest.starts_with('.'))
}

impl ConfigFile {
    pub fn parse(content: &str) -> Self {
        let lines = content
            .lines()
            .map(|raw| {
                let trimmed = raw.trim();
                if trimmed.starts_with('#') {
                    return Line::Other(raw.to_owned());
                }
                match trimmed.split_once('=') {
                    Some((key, value)) if !key.trim().is_empty() => Line::Item {
                        key: key.trim().to_owned(),
                        value: value.trim().to_owned(),
                    },
                    _ => Line::Other(raw.to_owned()),
                }
            })
            .collect();

        Self { lines }
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        fs::read_to_string(path).map(|content| Self::parse(&content))
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_string())
    }

    fn items(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Item { key, value } => Some((key.as_str(), value.as_str())),
            Line::Other(_) => None,
        })
    }

    /// Every value of `key` joined with newlines, or `None` if it is unset.
    ///
    /// A parent key such as `lxc.net` lists the indices configured below it,
    /// one per line.
    pub fn get(&self, key: &str) -> Option<String> {
        let values: Vec<&str> = self
            .items()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .collect();
        if !values.is_empty() {
            return Some(values.join("\n"));
        }

        let mut children: Vec<&str> = Vec::new();
        for (k, _) in self.items() {
            if let Some(child) = k
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('.'))
                .and_then(|rest| rest.split('.').next())
            {
                if !children.contains(&child) {
                    children.push(child);
                }
            }
        }
        if children.is_empty() {
            None
        } else {
            Some(children.join("\n"))
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        let item = Line::Item {
            key: key.to_owned(),
            value: value.to_owned(),
        };
        if is_list_key(key) {
            self.lines.push(item);
            return;
        }

        match self
            .lines
            .iter()
            .position(|line| matches!(line, Line::Item { key: k, .. } if k == key))
        {
            Some(pos) => {
                self.lines[pos] = item;
                let mut index = 0;
                self.lines.retain(|line| {
                    let keep = index <= pos
                        || !matches!(line, Line::Item { key: k, .. } if k == key);
                    index += 1;
                    keep
                });
            }
            None => self.lines.push(item),
        }
    }

    /// Removes `key` and every key below it. Returns whether anything was removed.
    pub fn clear(&mut self, key: &str) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|line| !matches!(line, Line::Item { key: k, .. } if is_below(k, key)));
        before != self.lines.len()
    }

    pub fn clear_all(&mut self) {
        self.lines.clear();
    }

    /// Distinct keys starting with `prefix`, in order of first appearance.
    pub fn keys(&self, prefix: Option<&str>) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for (key, _) in self.items() {
            if prefix.is_some_and(|p| !key.starts_with(p)) {
                continue;
            }
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_owned());
            }
        }
        keys
    }
}

impl Display for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.lines {
            match line {
                Line::Item { key, value } => writeln!(f, "{key} = {value}")?,
                Line::Other(raw) => writeln!(f, "{raw}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    const SAMPLE: &str = "\
# Distribution configuration
lxc.include = /usr/share/lxc/config/common.conf
lxc.arch = linux64

lxc.rootfs.path = dir:/var/lib/lxc/rubik/rootfs
lxc.uts.name = rubik
lxc.net.0.type = veth
lxc.net.0.link = lxcbr0
lxc.net.1.type = empty
lxc.mount.entry = proc proc proc nodev,noexec,nosuid 0 0
lxc.mount.entry = sysfs sys sysfs defaults 0 0
";

    #[test]
    fn test_get_multi_valued() {
        let config = ConfigFile::parse(SAMPLE);
        assert_eq!(config.get("lxc.uts.name").as_deref(), Some("rubik"));
        assert_eq!(
            config.get("lxc.mount.entry").as_deref(),
            Some("proc proc proc nodev,noexec,nosuid 0 0\nsysfs sys sysfs defaults 0 0")
        );
        assert_eq!(config.get("lxc.net").as_deref(), Some("0\n1"));
        assert_eq!(config.get("lxc.apparmor.profile"), None);
    }

    #[test]
    fn test_set_replaces_scalar_and_appends_list() {
        let mut config = ConfigFile::parse(SAMPLE);
        config.set("lxc.uts.name", "cube");
        config.set("lxc.cap.drop", "sys_module");
        config.set("lxc.cap.drop", "mac_admin");

        assert_eq!(config.get("lxc.uts.name").as_deref(), Some("cube"));
        assert_eq!(
            config.get("lxc.cap.drop").as_deref(),
            Some("sys_module\nmac_admin")
        );
    }

    #[test]
    fn test_set_collapses_duplicate_scalars() {
        let mut config = ConfigFile::parse("lxc.arch = i686\nlxc.arch = x86_64\n");
        config.set("lxc.arch", "aarch64");
        assert_eq!(config.to_string(), "lxc.arch = aarch64\n");
    }

    #[test]
    fn test_clear_removes_subkeys() {
        let mut config = ConfigFile::parse(SAMPLE);
        assert!(config.clear("lxc.net"));
        assert_eq!(config.get("lxc.net.0.type"), None);
        assert_eq!(config.get("lxc.net"), None);
        assert!(!config.clear("lxc.net"));
        assert_eq!(config.get("lxc.uts.name").as_deref(), Some("rubik"));
    }

    #[test]
    fn test_keys_in_first_appearance_order() {
        let config = ConfigFile::parse(SAMPLE);
        assert_eq!(
            config.keys(Some("lxc.net")),
            vec!["lxc.net.0.type", "lxc.net.0.link", "lxc.net.1.type"]
        );
        assert_eq!(config.keys(None).len(), 8);
    }

    #[test]
    fn test_save_and_load_preserve_comments() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("rubik").join("config");

        ConfigFile::parse(SAMPLE).save(&path)?;
        let loaded = ConfigFile::load(&path)?;

        assert_eq!(loaded, ConfigFile::parse(SAMPLE));
        assert!(fs::read_to_string(&path)?.starts_with("# Distribution configuration\n"));
        Ok(())
    }
}
