use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use libcorral::engine::Engine;
use nix::unistd::geteuid;

fn create_dir_all(path: &Path) -> Result<()> {
    DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(path)
        .with_context(|| format!("failed to create {path:?}"))
}

/// Resolves the directory holding container configurations.
///
/// An explicit path wins. Root uses the engine's default path; other users
/// get a per-user directory below `$XDG_DATA_HOME` or `$HOME/.local/share`.
pub fn determine(lxcpath: Option<PathBuf>, engine: &dyn Engine) -> Result<PathBuf> {
    if let Some(path) = lxcpath {
        if !path.exists() {
            create_dir_all(&path)?;
        }
        let path = path.canonicalize()?;
        return Ok(path);
    }

    if geteuid().is_root() {
        return Ok(engine.default_config_path());
    }

    // see https://specifications.freedesktop.org/basedir-spec/basedir-spec-latest.html
    if let Ok(path) = std::env::var("XDG_DATA_HOME") {
        let path = Path::new(&path).join("lxc");
        if create_dir_all(&path).is_ok() {
            return Ok(path);
        }
    }

    if let Ok(path) = std::env::var("HOME") {
        let path = Path::new(&path).join(".local/share/lxc");
        if create_dir_all(&path).is_ok() {
            return Ok(path);
        }
    }

    bail!("could not find a container path with suitable permissions for the current user");
}
