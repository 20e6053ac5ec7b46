//! Engine backed by the lxc command line tools
use std::fs;
use std::io;
use std::os::fd::{BorrowedFd, RawFd};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nix::unistd::{access, AccessFlags};

use super::config_file::ConfigFile;
use super::{Engine, EngineContainer, SnapshotRecord};
use crate::container::{AttachOptions, ConsoleOptions};
use crate::state::State;
use crate::types::{BackendStore, CloneFlags, Verbosity};

const DEFAULT_CONFIG_PATH: &str = "/var/lib/lxc";
const CONFIG_FILE: &str = "config";
const SCOPE_GLOBAL: i32 = 0;

/// Drives containers through `lxc-start`, `lxc-info` and friends.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    default_path: PathBuf,
}

impl Default for CommandEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl CommandEngine {
    pub fn new<P: Into<PathBuf>>(default_path: P) -> Self {
        Self {
            default_path: default_path.into(),
        }
    }

    /// Uses the container path the installed tools are configured with,
    /// falling back to the stock location.
    pub fn detect() -> Self {
        match lxc_config("lxc.lxcpath") {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::default(),
        }
    }
}

fn lxc_config(key: &str) -> Option<String> {
    let output = run("lxc-config", &[key.to_owned()])?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

fn run(tool: &str, args: &[String]) -> Option<Output> {
    tracing::debug!(tool, ?args, "running");
    match Command::new(tool).args(args).output() {
        Ok(output) => {
            if !output.status.success() {
                tracing::debug!(
                    tool,
                    status = ?output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "tool failed"
                );
            }
            Some(output)
        }
        Err(err) => {
            tracing::error!(tool, ?err, "failed to spawn");
            None
        }
    }
}

fn succeeds(tool: &str, args: &[String]) -> bool {
    run(tool, args).is_some_and(|output| output.status.success())
}

fn stdout_of(tool: &str, args: &[String]) -> Option<String> {
    let output = run(tool, args)?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}

fn stdio(fd: Option<RawFd>) -> io::Result<Stdio> {
    match fd {
        None => Ok(Stdio::inherit()),
        Some(fd) => {
            // SAFETY: the caller keeps `fd` open for the duration of the call
            // and keeps ownership of it; the child gets a duplicate.
            let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
            Ok(Stdio::from(borrowed.try_clone_to_owned()?))
        }
    }
}

fn target(name: &str, path: &Path) -> Vec<String> {
    vec![
        "-n".to_owned(),
        name.to_owned(),
        "-P".to_owned(),
        path.to_string_lossy().into_owned(),
    ]
}

fn start_args(
    name: &str,
    path: &Path,
    daemonize: bool,
    close_all_fds: bool,
    args: &[String],
) -> Vec<String> {
    let mut cmd = target(name, path);
    cmd.push(if daemonize { "-d" } else { "-F" }.to_owned());
    if close_all_fds {
        cmd.push("-C".to_owned());
    }
    if !args.is_empty() {
        cmd.push("--".to_owned());
        cmd.extend(args.iter().cloned());
    }
    cmd
}

fn create_args(
    name: &str,
    path: &Path,
    template: &str,
    backend: BackendStore,
    verbosity: Verbosity,
    config: Option<&Path>,
    args: &[String],
) -> Vec<String> {
    let mut cmd = target(name, path);
    cmd.extend([
        "-t".to_owned(),
        template.to_owned(),
        "-B".to_owned(),
        backend.to_string(),
    ]);
    if verbosity == Verbosity::Quiet {
        cmd.push("-q".to_owned());
    }
    if let Some(config) = config {
        cmd.push("-f".to_owned());
        cmd.push(config.to_string_lossy().into_owned());
    }
    if !args.is_empty() {
        cmd.push("--".to_owned());
        cmd.extend(args.iter().cloned());
    }
    cmd
}

fn clone_args(
    name: &str,
    path: &Path,
    new_name: &str,
    new_path: Option<&Path>,
    flags: CloneFlags,
    backend: BackendStore,
) -> Vec<String> {
    let mut cmd = target(name, path);
    cmd.extend(["-N".to_owned(), new_name.to_owned()]);
    if let Some(new_path) = new_path {
        cmd.push("-p".to_owned());
        cmd.push(new_path.to_string_lossy().into_owned());
    }
    cmd.extend(["-B".to_owned(), backend.to_string()]);
    if flags.contains(CloneFlags::SNAPSHOT) {
        cmd.push("-s".to_owned());
    }
    if flags.contains(CloneFlags::KEEP_NAME) {
        cmd.push("-K".to_owned());
    }
    if flags.contains(CloneFlags::KEEP_MAC_ADDR) {
        cmd.push("-M".to_owned());
    }
    cmd
}

fn attach_args(name: &str, path: &Path, options: &AttachOptions, args: &[String]) -> Vec<String> {
    let mut cmd = target(name, path);
    cmd.push(if options.clear_env { "--clear-env" } else { "--keep-env" }.to_owned());
    for var in &options.env {
        cmd.push("-v".to_owned());
        cmd.push(var.clone());
    }
    if !args.is_empty() {
        cmd.push("--".to_owned());
        cmd.extend(args.iter().cloned());
    }
    cmd
}

fn ip_args(interface: Option<&str>, family: Option<&str>, scope: i32) -> Vec<String> {
    let mut cmd = vec!["ip".to_owned(), "-o".to_owned()];
    match family {
        Some("inet") => cmd.push("-4".to_owned()),
        Some("inet6") => cmd.push("-6".to_owned()),
        _ => {}
    }
    cmd.extend(["addr".to_owned(), "show".to_owned()]);
    if let Some(interface) = interface {
        cmd.extend(["dev".to_owned(), interface.to_owned()]);
    }
    if scope == SCOPE_GLOBAL {
        cmd.extend(["scope".to_owned(), "global".to_owned()]);
    }
    cmd
}

/// Addresses from `ip -o addr` output, prefix lengths stripped.
///
/// ```text
/// 2: eth0    inet 10.0.3.15/24 brd 10.0.3.255 scope global eth0\       valid_lft forever
/// ```
fn parse_ip_addr(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace().skip(2);
            match fields.next() {
                Some("inet") | Some("inet6") => fields.next(),
                _ => None,
            }
        })
        .map(|cidr| cidr.split('/').next().unwrap_or(cidr).to_owned())
        .collect()
}

/// Snapshots from `lxc-snapshot -L` output.
///
/// ```text
/// snap0 (/var/lib/lxc/rubik/snaps) 2024:03:01 10:15:42
/// ```
fn parse_snapshot_list(output: &str) -> Vec<SnapshotRecord> {
    output
        .lines()
        .filter_map(|line| {
            let (name, rest) = line.trim().split_once(' ')?;
            let rest = rest.trim_start().strip_prefix('(')?;
            let (path, timestamp) = rest.split_once(')')?;
            let path = PathBuf::from(path);
            let comment_path = path.join(name).join("comment");
            Some(SnapshotRecord {
                name: name.to_owned(),
                comment_path: if comment_path.exists() {
                    comment_path
                } else {
                    PathBuf::new()
                },
                timestamp: timestamp.trim().to_owned(),
                path,
            })
        })
        .collect()
}

fn snapshot_index(name: &str) -> Option<i32> {
    name.strip_prefix("snap")?.parse().ok()
}

/// Value part of `lxc-info -c` output, `key = value` per line.
fn parse_info_config(output: &str) -> Option<String> {
    let values: Vec<&str> = output
        .lines()
        .filter_map(|line| line.split_once('=').map(|(_, value)| value.trim()))
        .collect();
    (!values.is_empty()).then(|| values.join("\n"))
}

#[derive(Debug)]
struct Object {
    name: String,
    path: PathBuf,
    config: Option<ConfigFile>,
    daemonize: bool,
    close_all_fds: bool,
    refs: i32,
}

impl Object {
    fn target(&self) -> Vec<String> {
        target(&self.name, &self.path)
    }

    fn config_file_name(&self) -> PathBuf {
        self.path.join(&self.name).join(CONFIG_FILE)
    }

    fn is_defined(&self) -> bool {
        self.config_file_name().is_file()
    }

    /// The configuration, read from disk on first use.
    fn config(&mut self) -> &mut ConfigFile {
        let path = self.config_file_name();
        self.config
            .get_or_insert_with(|| ConfigFile::load(&path).unwrap_or_default())
    }

    /// Writes the configuration through to disk once the container is
    /// defined. Before that it is staged for `lxc-create`.
    fn write_through(&mut self) -> bool {
        if !self.is_defined() {
            return true;
        }
        let path = self.config_file_name();
        match self.config().save(&path) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(?path, ?err, "failed to write config");
                false
            }
        }
    }

    fn with_args(&self, extra: &[&str]) -> Vec<String> {
        let mut args = self.target();
        args.extend(extra.iter().map(|arg| arg.to_string()));
        args
    }

    fn state(&self) -> String {
        if !self.is_defined() {
            return State::Stopped.to_string();
        }
        stdout_of("lxc-info", &self.with_args(&["-s", "-H"]))
            .map(|state| state.trim().to_owned())
            .unwrap_or_else(|| State::Stopped.to_string())
    }
}

struct CommandContainer {
    object: Mutex<Object>,
}

impl CommandContainer {
    fn object(&self) -> MutexGuard<'_, Object> {
        self.object.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tool(&self, tool: &str, extra: &[&str]) -> bool {
        let args = self.object().with_args(extra);
        succeeds(tool, &args)
    }

    fn attach_output(&self, args: &[String]) -> Option<String> {
        let options = AttachOptions::default();
        let object = self.object();
        stdout_of("lxc-attach", &attach_args(&object.name, &object.path, &options, args))
    }
}

impl Engine for CommandEngine {
    fn new_container(
        &self,
        name: &str,
        config_path: Option<&Path>,
    ) -> Option<Arc<dyn EngineContainer>> {
        if name.is_empty() || name.contains('/') {
            tracing::error!(name, "invalid container name");
            return None;
        }
        Some(Arc::new(CommandContainer {
            object: Mutex::new(Object {
                name: name.to_owned(),
                path: config_path.map_or_else(|| self.default_path.clone(), Path::to_path_buf),
                config: None,
                daemonize: true,
                close_all_fds: false,
                refs: 1,
            }),
        }))
    }

    fn version(&self) -> String {
        stdout_of("lxc-info", &["--version".to_owned()])
            .map(|version| version.trim().to_owned())
            .unwrap_or_default()
    }

    fn default_config_path(&self) -> PathBuf {
        self.default_path.clone()
    }

    fn global_config_item(&self, key: &str) -> Option<String> {
        lxc_config(key).filter(|value| !value.is_empty())
    }

    fn container_names(&self, config_path: &Path) -> Vec<String> {
        let entries = match fs::read_dir(config_path) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(?config_path, ?err, "cannot list containers");
                return Vec::new();
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join(CONFIG_FILE).is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }
}

impl EngineContainer for CommandContainer {
    fn name(&self) -> String {
        self.object().name.clone()
    }

    fn config_path(&self) -> PathBuf {
        self.object().path.clone()
    }

    fn set_config_path(&self, path: &Path) -> bool {
        let mut object = self.object();
        object.path = path.to_path_buf();
        object.config = None;
        true
    }

    fn config_file_name(&self) -> PathBuf {
        self.object().config_file_name()
    }

    fn is_defined(&self) -> bool {
        self.object().is_defined()
    }

    fn is_running(&self) -> bool {
        self.state() != State::Stopped.as_str()
    }

    fn may_control(&self) -> bool {
        access(&self.object().path, AccessFlags::W_OK).is_ok()
    }

    fn state(&self) -> String {
        self.object().state()
    }

    fn init_pid(&self) -> i32 {
        let args = self.object().with_args(&["-p", "-H"]);
        stdout_of("lxc-info", &args)
            .and_then(|pid| pid.trim().parse().ok())
            .unwrap_or(-1)
    }

    fn daemonize(&self) -> bool {
        self.object().daemonize
    }

    fn want_daemonize(&self, state: bool) -> bool {
        self.object().daemonize = state;
        true
    }

    fn want_close_all_fds(&self, state: bool) -> bool {
        self.object().close_all_fds = state;
        true
    }

    fn start(&self, _use_init: bool, args: &[String]) -> bool {
        let object = self.object();
        let cmd = start_args(
            &object.name,
            &object.path,
            object.daemonize,
            object.close_all_fds,
            args,
        );
        succeeds("lxc-start", &cmd)
    }

    fn stop(&self) -> bool {
        self.tool("lxc-stop", &["-k"])
    }

    fn shutdown(&self, timeout_secs: i32) -> bool {
        self.tool("lxc-stop", &["-t", timeout_secs.to_string().as_str()])
    }

    fn reboot(&self) -> bool {
        self.tool("lxc-stop", &["-r"])
    }

    fn create(
        &self,
        template: &str,
        backend: BackendStore,
        verbosity: Verbosity,
        args: &[String],
    ) -> bool {
        let mut object = self.object();
        // Items set before creation are handed over as the initial config.
        let staged = match object.config.as_ref() {
            Some(config) if !config.keys(None).is_empty() => {
                let path = std::env::temp_dir()
                    .join(format!("corral-{}-{}.conf", object.name, std::process::id()));
                if let Err(err) = config.save(&path) {
                    tracing::error!(?path, ?err, "failed to stage config");
                    return false;
                }
                Some(path)
            }
            _ => None,
        };

        let cmd = create_args(
            &object.name,
            &object.path,
            template,
            backend,
            verbosity,
            staged.as_deref(),
            args,
        );
        let created = succeeds("lxc-create", &cmd);
        if let Some(path) = staged {
            let _ = fs::remove_file(path);
        }
        if created {
            object.config = None;
        }
        created
    }

    fn destroy(&self) -> bool {
        self.tool("lxc-destroy", &[])
    }

    fn destroy_with_snapshots(&self) -> bool {
        self.tool("lxc-destroy", &["-s"])
    }

    fn rename(&self, new_name: &str) -> bool {
        let mut object = self.object();
        if !succeeds("lxc-copy", &object.with_args(&["-N", new_name, "-R"])) {
            return false;
        }
        object.name = new_name.to_owned();
        object.config = None;
        true
    }

    fn freeze(&self) -> bool {
        self.tool("lxc-freeze", &[])
    }

    fn unfreeze(&self) -> bool {
        self.tool("lxc-unfreeze", &[])
    }

    fn wait(&self, state: &str, timeout_secs: i32) -> bool {
        self.tool("lxc-wait", &["-s", state, "-t", timeout_secs.to_string().as_str()])
    }

    fn get_config_item(&self, key: &str) -> Option<String> {
        self.object().config().get(key)
    }

    fn set_config_item(&self, key: &str, value: &str) -> bool {
        let mut object = self.object();
        object.config().set(key, value);
        object.write_through()
    }

    fn clear_config_item(&self, key: &str) -> bool {
        let mut object = self.object();
        object.config().clear(key);
        object.write_through()
    }

    fn clear_config(&self) {
        let mut object = self.object();
        object.config().clear_all();
        object.write_through();
    }

    fn get_keys(&self, prefix: Option<&str>) -> Option<String> {
        let keys = self.object().config().keys(prefix);
        (!keys.is_empty()).then(|| keys.join("\n"))
    }

    fn get_running_config_item(&self, key: &str) -> Option<String> {
        let args = self.object().with_args(&["-c", key]);
        stdout_of("lxc-info", &args).and_then(|output| parse_info_config(&output))
    }

    fn load_config(&self, path: &Path) -> bool {
        match ConfigFile::load(path) {
            Ok(config) => {
                self.object().config = Some(config);
                true
            }
            Err(err) => {
                tracing::debug!(?path, ?err, "failed to load config");
                false
            }
        }
    }

    fn save_config(&self, path: &Path) -> bool {
        match self.object().config().save(path) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(?path, ?err, "failed to save config");
                false
            }
        }
    }

    fn get_cgroup_item(&self, key: &str) -> Option<String> {
        let args = self.object().with_args(&[key]);
        stdout_of("lxc-cgroup", &args)
    }

    fn set_cgroup_item(&self, key: &str, value: &str) -> bool {
        self.tool("lxc-cgroup", &[key, value])
    }

    fn snapshot(&self, comment_file: Option<&Path>) -> i32 {
        let before = self.snapshot_list().unwrap_or_default();
        let comment = comment_file.map(|path| path.to_string_lossy().into_owned());
        let created = match comment.as_deref() {
            Some(comment) => self.tool("lxc-snapshot", &["-c", comment]),
            None => self.tool("lxc-snapshot", &[]),
        };
        if !created {
            return -1;
        }
        self.snapshot_list()
            .unwrap_or_default()
            .into_iter()
            .filter(|snap| !before.iter().any(|old| old.name == snap.name))
            .find_map(|snap| snapshot_index(&snap.name))
            .unwrap_or(-1)
    }

    fn snapshot_list(&self) -> Option<Vec<SnapshotRecord>> {
        let args = self.object().with_args(&["-L"]);
        stdout_of("lxc-snapshot", &args).map(|output| parse_snapshot_list(&output))
    }

    fn snapshot_restore(&self, snapshot: &str, new_name: &str) -> bool {
        self.tool("lxc-snapshot", &["-r", snapshot, "-N", new_name])
    }

    fn snapshot_destroy(&self, snapshot: &str) -> bool {
        self.tool("lxc-snapshot", &["-d", snapshot])
    }

    fn snapshot_destroy_all(&self) -> bool {
        self.tool("lxc-snapshot", &["-d", "ALL"])
    }

    fn clone_to(
        &self,
        new_name: &str,
        config_path: Option<&Path>,
        flags: CloneFlags,
        backend: BackendStore,
    ) -> bool {
        let object = self.object();
        let cmd = clone_args(&object.name, &object.path, new_name, config_path, flags, backend);
        succeeds("lxc-copy", &cmd)
    }

    fn get_interfaces(&self) -> Option<Vec<String>> {
        let output = self.attach_output(&["ls".to_owned(), "/sys/class/net".to_owned()])?;
        Some(output.split_whitespace().map(String::from).collect())
    }

    fn get_ips(
        &self,
        interface: Option<&str>,
        family: Option<&str>,
        scope: i32,
    ) -> Option<Vec<String>> {
        let output = self.attach_output(&ip_args(interface, family, scope))?;
        Some(parse_ip_addr(&output))
    }

    fn attach_interface(&self, device: &str, destination: Option<&str>) -> bool {
        let mut extra = vec!["add", device];
        extra.extend(destination);
        self.tool("lxc-device", &extra)
    }

    fn detach_interface(&self, device: &str, destination: Option<&str>) -> bool {
        let mut extra = vec!["del", device];
        extra.extend(destination);
        self.tool("lxc-device", &extra)
    }

    fn add_device_node(&self, source: &str, destination: Option<&str>) -> bool {
        let mut extra = vec!["add", source];
        extra.extend(destination);
        self.tool("lxc-device", &extra)
    }

    fn remove_device_node(&self, source: &str, destination: Option<&str>) -> bool {
        let mut extra = vec!["del", source];
        extra.extend(destination);
        self.tool("lxc-device", &extra)
    }

    fn attach_shell(&self, options: &AttachOptions) -> i32 {
        self.attach_run_wait(options, &[])
    }

    fn attach_run_wait(&self, options: &AttachOptions, args: &[String]) -> i32 {
        let cmd = {
            let object = self.object();
            attach_args(&object.name, &object.path, options, args)
        };
        if options.cwd.is_some() {
            tracing::warn!(cwd = ?options.cwd, "lxc-attach cannot change directory, ignoring");
        }

        let spawn = || -> io::Result<i32> {
            let status = Command::new("lxc-attach")
                .args(&cmd)
                .stdin(stdio(options.stdin)?)
                .stdout(stdio(options.stdout)?)
                .stderr(stdio(options.stderr)?)
                .status()?;
            Ok(status.code().unwrap_or(-1))
        };
        match spawn() {
            Ok(code) => code,
            Err(err) => {
                tracing::error!(?err, "failed to run lxc-attach");
                -1
            }
        }
    }

    fn console_getfd(&self, ttynum: i32) -> i32 {
        tracing::warn!(ttynum, "the command line tools cannot hand out console descriptors");
        -1
    }

    fn console(&self, options: &ConsoleOptions) -> bool {
        let cmd = {
            let object = self.object();
            let mut cmd = object.target();
            cmd.extend([
                "-t".to_owned(),
                options.ttynum.to_string(),
                "-e".to_owned(),
                format!("^{}", options.escape_char()),
            ]);
            cmd
        };
        let status = (|| -> io::Result<bool> {
            Ok(Command::new("lxc-console")
                .args(&cmd)
                .stdin(stdio(Some(options.stdin))?)
                .stdout(stdio(Some(options.stdout))?)
                .stderr(stdio(Some(options.stderr))?)
                .status()?
                .success())
        })();
        status.unwrap_or_else(|err| {
            tracing::error!(?err, "failed to run lxc-console");
            false
        })
    }

    fn execute(&self, args: &[String]) -> Option<Vec<u8>> {
        let mut cmd = self.object().target();
        cmd.push("--".to_owned());
        cmd.extend(args.iter().cloned());
        let output = run("lxc-execute", &cmd)?;
        if !output.status.success() {
            return None;
        }
        let mut combined = output.stdout;
        combined.extend(output.stderr);
        Some(combined)
    }

    fn get(&self) -> bool {
        let mut object = self.object();
        if object.refs <= 0 {
            return false;
        }
        object.refs += 1;
        true
    }

    fn put(&self) -> i32 {
        let mut object = self.object();
        if object.refs <= 0 {
            return -1;
        }
        object.refs -= 1;
        i32::from(object.refs == 0)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::TempDir;

    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_start_args() {
        let path = Path::new("/var/lib/lxc");
        assert_eq!(
            start_args("rubik", path, true, false, &[]),
            strings(&["-n", "rubik", "-P", "/var/lib/lxc", "-d"])
        );
        assert_eq!(
            start_args("rubik", path, false, true, &strings(&["/bin/sh"])),
            strings(&["-n", "rubik", "-P", "/var/lib/lxc", "-F", "-C", "--", "/bin/sh"])
        );
    }

    #[test]
    fn test_create_args() {
        let args = create_args(
            "rubik",
            Path::new("/var/lib/lxc"),
            "download",
            BackendStore::Zfs,
            Verbosity::Quiet,
            None,
            &strings(&["-d", "ubuntu"]),
        );
        assert_eq!(
            args,
            strings(&[
                "-n", "rubik", "-P", "/var/lib/lxc", "-t", "download", "-B", "zfs", "-q", "--",
                "-d", "ubuntu"
            ])
        );

        let args = create_args(
            "rubik",
            Path::new("/var/lib/lxc"),
            "busybox",
            BackendStore::Directory,
            Verbosity::Verbose,
            Some(Path::new("/tmp/staged.conf")),
            &[],
        );
        assert_eq!(
            args,
            strings(&[
                "-n", "rubik", "-P", "/var/lib/lxc", "-t", "busybox", "-B", "dir", "-f",
                "/tmp/staged.conf"
            ])
        );
    }

    #[test]
    fn test_clone_args() {
        let args = clone_args(
            "rubik",
            Path::new("/var/lib/lxc"),
            "cube",
            Some(Path::new("/srv/lxc")),
            CloneFlags::SNAPSHOT | CloneFlags::KEEP_NAME,
            BackendStore::Overlay,
        );
        assert_eq!(
            args,
            strings(&[
                "-n", "rubik", "-P", "/var/lib/lxc", "-N", "cube", "-p", "/srv/lxc", "-B",
                "overlay", "-s", "-K"
            ])
        );
    }

    #[test]
    fn test_attach_args() {
        let options = AttachOptions {
            env: vec!["TERM=xterm".to_owned()],
            ..Default::default()
        }
        .with_clear_env();
        assert_eq!(
            attach_args("rubik", Path::new("/var/lib/lxc"), &options, &strings(&["uname"])),
            strings(&[
                "-n", "rubik", "-P", "/var/lib/lxc", "--clear-env", "-v", "TERM=xterm", "--",
                "uname"
            ])
        );
    }

    #[test]
    fn test_ip_args() {
        assert_eq!(
            ip_args(Some("eth0"), Some("inet6"), SCOPE_GLOBAL),
            strings(&["ip", "-o", "-6", "addr", "show", "dev", "eth0", "scope", "global"])
        );
        assert_eq!(ip_args(None, None, 1), strings(&["ip", "-o", "addr", "show"]));
    }

    #[test]
    fn test_parse_ip_addr() {
        let output = "\
2: eth0    inet 10.0.3.15/24 brd 10.0.3.255 scope global eth0\\       valid_lft forever preferred_lft forever
2: eth0    inet6 fd42::15/64 scope global \\       valid_lft forever preferred_lft forever
";
        assert_eq!(parse_ip_addr(output), vec!["10.0.3.15", "fd42::15"]);
        assert!(parse_ip_addr("").is_empty());
    }

    #[test]
    fn test_parse_snapshot_list() -> Result<()> {
        let tmp = TempDir::new()?;
        let snaps = tmp.path().join("rubik/snaps");
        fs::create_dir_all(snaps.join("snap1"))?;
        fs::write(snaps.join("snap1/comment"), "before upgrade")?;
        let output = format!(
            "snap0 ({0}) 2024:03:01 10:15:42\nsnap1 ({0}) 2024:03:02 08:00:00\n",
            snaps.display()
        );

        let list = parse_snapshot_list(&output);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "snap0");
        assert_eq!(list[0].timestamp, "2024:03:01 10:15:42");
        assert_eq!(list[0].path, snaps);
        assert_eq!(list[0].comment_path, PathBuf::new());
        assert_eq!(list[1].comment_path, snaps.join("snap1/comment"));
        assert!(parse_snapshot_list("No snapshots\n").is_empty());
        Ok(())
    }

    #[test]
    fn test_snapshot_index() {
        assert_eq!(snapshot_index("snap12"), Some(12));
        assert_eq!(snapshot_index("base"), None);
    }

    #[test]
    fn test_parse_info_config() {
        assert_eq!(
            parse_info_config("lxc.net.0.veth.pair = vethA1B2\n").as_deref(),
            Some("vethA1B2")
        );
        assert_eq!(parse_info_config(""), None);
    }

    #[test]
    fn test_container_names() -> Result<()> {
        let tmp = TempDir::new()?;
        for name in ["zeta", "alpha"] {
            fs::create_dir_all(tmp.path().join(name))?;
            fs::write(tmp.path().join(name).join(CONFIG_FILE), "lxc.uts.name = x\n")?;
        }
        fs::create_dir_all(tmp.path().join("half-created"))?;

        let engine = CommandEngine::new(tmp.path());
        assert_eq!(engine.container_names(tmp.path()), vec!["alpha", "zeta"]);
        assert!(engine.container_names(&tmp.path().join("missing")).is_empty());
        Ok(())
    }

    #[test]
    fn test_config_read_from_disk() -> Result<()> {
        let tmp = TempDir::new()?;
        fs::create_dir_all(tmp.path().join("rubik"))?;
        fs::write(
            tmp.path().join("rubik/config"),
            "lxc.uts.name = rubik\nlxc.arch = x86_64\n",
        )?;

        let engine = CommandEngine::new(tmp.path());
        let container = engine.new_container("rubik", None).unwrap();
        assert!(container.is_defined());
        assert_eq!(container.get_config_item("lxc.arch").as_deref(), Some("x86_64"));
        assert!(container.set_config_item("lxc.arch", "aarch64"));
        assert!(fs::read_to_string(tmp.path().join("rubik/config"))?.contains("lxc.arch = aarch64"));
        let saved = tmp.path().join("saved.conf");
        assert!(container.save_config(&saved));
        assert!(fs::read_to_string(saved)?.contains("lxc.arch = aarch64"));
        Ok(())
    }

    #[test]
    fn test_config_edits_written_through() -> Result<()> {
        let tmp = TempDir::new()?;
        fs::create_dir_all(tmp.path().join("rubik"))?;
        fs::write(tmp.path().join("rubik/config"), "lxc.uts.name = rubik\n")?;
        let engine = CommandEngine::new(tmp.path());
        let container = crate::Container::new(&engine, "rubik", None)?;

        container.set_config_item("lxc.uts.name", "cube")?;
        container.set_config_item("lxc.cap.drop", "sys_module")?;
        let written = fs::read_to_string(tmp.path().join("rubik/config"))?;
        assert!(written.contains("lxc.uts.name = cube"));
        assert!(written.contains("lxc.cap.drop = sys_module"));

        container.clear_config_item("lxc.cap.drop")?;
        let written = fs::read_to_string(tmp.path().join("rubik/config"))?;
        assert!(!written.contains("lxc.cap.drop"));
        assert_eq!(container.config_item("lxc.uts.name"), vec!["cube"]);
        Ok(())
    }

    #[test]
    fn test_config_of_undefined_container_stays_in_memory() -> Result<()> {
        let tmp = TempDir::new()?;
        let engine = CommandEngine::new(tmp.path());
        let container = crate::Container::new(&engine, "rubik", None)?;

        container.set_config_item("lxc.arch", "x86_64")?;
        assert_eq!(container.config_item("lxc.arch"), vec!["x86_64"]);
        assert!(!tmp.path().join("rubik/config").exists());
        Ok(())
    }
}
