//! In-process engine that keeps every container in memory
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::config_file::ConfigFile;
use super::{Engine, EngineContainer, SnapshotRecord};
use crate::container::{AttachOptions, ConsoleOptions};
use crate::state::State;
use crate::types::{BackendStore, CloneFlags, Verbosity};

const DEFAULT_CONFIG_PATH: &str = "/var/lib/lxc";
const DOWNLOAD_TEMPLATE: &str = "download";
const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Primitives the engine records and can be told to fail.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum Primitive {
    New,
    SetConfigPath,
    WantDaemonize,
    WantCloseAllFds,
    Start,
    Stop,
    Shutdown,
    Reboot,
    Create,
    Destroy,
    DestroyWithSnapshots,
    Rename,
    Freeze,
    Unfreeze,
    Wait,
    GetConfigItem,
    SetConfigItem,
    ClearConfigItem,
    LoadConfig,
    SaveConfig,
    GetCgroupItem,
    SetCgroupItem,
    Snapshot,
    SnapshotList,
    SnapshotRestore,
    SnapshotDestroy,
    SnapshotDestroyAll,
    Clone,
    GetInterfaces,
    GetIps,
    AttachInterface,
    DetachInterface,
    AddDeviceNode,
    RemoveDeviceNode,
    AttachShell,
    AttachRunWait,
    ConsoleGetfd,
    Console,
    Execute,
    Get,
    Put,
}

type Key = (PathBuf, String);

#[derive(Debug, Clone)]
struct Record {
    defined: bool,
    state: String,
    daemonize: bool,
    close_all_fds: bool,
    init_pid: i32,
    config: ConfigFile,
    cgroup: HashMap<String, String>,
    snapshots: Vec<SnapshotRecord>,
    next_snapshot: usize,
    interfaces: Vec<String>,
    ips: Vec<(String, String)>,
    devices: Vec<String>,
    last_create: Option<(String, BackendStore, Verbosity)>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            defined: false,
            state: State::Stopped.to_string(),
            daemonize: true,
            close_all_fds: false,
            init_pid: -1,
            config: ConfigFile::default(),
            cgroup: HashMap::new(),
            snapshots: Vec::new(),
            next_snapshot: 0,
            interfaces: Vec::new(),
            ips: Vec::new(),
            devices: Vec::new(),
            last_create: None,
        }
    }
}

impl Record {
    fn is_running(&self) -> bool {
        self.defined && self.state != State::Stopped.as_str()
    }

    fn is_stopped(&self) -> bool {
        self.defined && !self.is_running()
    }

    fn in_state(&self, state: State) -> bool {
        self.state == state.as_str()
    }

    fn set_state(&mut self, state: State) {
        self.state = state.to_string();
    }

    /// A fresh, stopped copy carrying only the configuration.
    fn copy_as(&self, new_name: &str, keep_name: bool) -> Record {
        let mut config = self.config.clone();
        if !keep_name && config.get("lxc.uts.name").is_some() {
            config.set("lxc.uts.name", new_name);
        }
        Record {
            defined: true,
            config,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct Object {
    key: Key,
    refs: i32,
}

#[derive(Debug, Default)]
struct World {
    records: HashMap<Key, Record>,
    objects: HashMap<u64, Object>,
    next_object: u64,
    next_pid: i32,
    calls: Vec<(String, Primitive)>,
    failures: Vec<(String, Primitive)>,
}

impl World {
    /// Logs the call and reports whether an injected failure consumed it.
    fn act(&mut self, name: &str, primitive: Primitive) -> bool {
        self.calls.push((name.to_owned(), primitive));
        match self
            .failures
            .iter()
            .position(|(n, p)| n == name && *p == primitive)
        {
            Some(pos) => {
                self.failures.remove(pos);
                tracing::debug!(name, ?primitive, "injected failure");
                false
            }
            None => true,
        }
    }

    fn record(&mut self, key: &Key) -> &mut Record {
        self.records.entry(key.clone()).or_default()
    }

    fn is_defined(&self, key: &Key) -> bool {
        self.records.get(key).is_some_and(|r| r.defined)
    }

    fn spawn_init(&mut self) -> i32 {
        self.next_pid += 1;
        1000 + self.next_pid
    }
}

/// Thread safe simulation of a container engine.
///
/// Clones share one world, so every handle on the same (config path, name)
/// observes the same container. Mainly useful as a test double: it logs the
/// primitives it runs and can be told to fail the next call of a primitive.
#[derive(Clone, Debug)]
pub struct MemoryEngine {
    world: Arc<Mutex<World>>,
    default_path: PathBuf,
    unprivileged: bool,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl MemoryEngine {
    pub fn new<P: Into<PathBuf>>(default_path: P) -> Self {
        Self {
            world: Arc::new(Mutex::new(World::default())),
            default_path: default_path.into(),
            unprivileged: false,
        }
    }

    /// An engine that only lets callers create from the download template.
    pub fn unprivileged() -> Self {
        Self {
            unprivileged: true,
            ..Self::default()
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(&self, name: &str) -> Key {
        (self.default_path.clone(), name.to_owned())
    }

    /// Fails the next call of `primitive` on any container named `name`.
    pub fn fail_next(&self, name: &str, primitive: Primitive) {
        self.world().failures.push((name.to_owned(), primitive));
    }

    /// How often `primitive` was invoked on containers named `name`.
    pub fn calls(&self, name: &str, primitive: Primitive) -> usize {
        self.world()
            .calls
            .iter()
            .filter(|(n, p)| n == name && *p == primitive)
            .count()
    }

    /// Outstanding engine references on objects named `name`.
    pub fn refcount(&self, name: &str) -> i32 {
        self.world()
            .objects
            .values()
            .filter(|object| object.key.1 == name)
            .map(|object| object.refs)
            .sum()
    }

    pub fn set_raw_state(&self, name: &str, state: &str) {
        let key = self.key(name);
        self.world().record(&key).state = state.to_owned();
    }

    pub fn set_cgroup_item(&self, name: &str, key: &str, value: &str) {
        let record_key = self.key(name);
        self.world()
            .record(&record_key)
            .cgroup
            .insert(key.to_owned(), value.to_owned());
    }

    pub fn add_ip(&self, name: &str, interface: &str, address: &str) {
        let key = self.key(name);
        self.world()
            .record(&key)
            .ips
            .push((interface.to_owned(), address.to_owned()));
    }

    pub fn devices(&self, name: &str) -> Vec<String> {
        let key = self.key(name);
        self.world().record(&key).devices.clone()
    }

    pub fn snapshot_count(&self, name: &str) -> usize {
        let key = self.key(name);
        self.world().record(&key).snapshots.len()
    }

    pub fn last_create(&self, name: &str) -> Option<(String, BackendStore, Verbosity)> {
        let key = self.key(name);
        self.world().record(&key).last_create.clone()
    }
}

impl Engine for MemoryEngine {
    fn new_container(
        &self,
        name: &str,
        config_path: Option<&Path>,
    ) -> Option<Arc<dyn EngineContainer>> {
        let mut world = self.world();
        if !world.act(name, Primitive::New) {
            return None;
        }

        let key = (
            config_path.map_or_else(|| self.default_path.clone(), Path::to_path_buf),
            name.to_owned(),
        );
        let id = world.next_object;
        world.next_object += 1;
        world.objects.insert(id, Object { key, refs: 1 });

        Some(Arc::new(MemoryContainer {
            world: Arc::clone(&self.world),
            id,
            unprivileged: self.unprivileged,
        }))
    }

    fn version(&self) -> String {
        format!("{}-memory", env!("CARGO_PKG_VERSION"))
    }

    fn default_config_path(&self) -> PathBuf {
        self.default_path.clone()
    }

    fn global_config_item(&self, key: &str) -> Option<String> {
        match key {
            "lxc.lxcpath" => Some(self.default_path.to_string_lossy().into_owned()),
            "lxc.bdev.lvm.vg" => Some("lxc".to_owned()),
            "lxc.bdev.zfs.root" => Some("lxc".to_owned()),
            _ => None,
        }
    }

    fn container_names(&self, config_path: &Path) -> Vec<String> {
        let world = self.world();
        let mut names: Vec<String> = world
            .records
            .iter()
            .filter(|((path, _), record)| path == config_path && record.defined)
            .map(|((_, name), _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

struct MemoryContainer {
    world: Arc<Mutex<World>>,
    id: u64,
    unprivileged: bool,
}

/// World lock plus the key of the object a primitive runs on.
struct Session<'a> {
    world: MutexGuard<'a, World>,
    key: Key,
}

impl Session<'_> {
    fn record(&mut self) -> &mut Record {
        let key = self.key.clone();
        self.world.record(&key)
    }
}

impl MemoryContainer {
    fn session(&self) -> Session<'_> {
        let world = self.world.lock().unwrap_or_else(PoisonError::into_inner);
        let key = world
            .objects
            .get(&self.id)
            .map(|object| object.key.clone())
            .unwrap_or_default();
        Session { world, key }
    }

    /// Session for `primitive`, or `None` if an injected failure hit it.
    fn act(&self, primitive: Primitive) -> Option<Session<'_>> {
        let mut session = self.session();
        let name = session.key.1.clone();
        session.world.act(&name, primitive).then_some(session)
    }

    fn rekey(&self, session: &mut Session<'_>, key: Key) {
        if let Some(object) = session.world.objects.get_mut(&self.id) {
            object.key = key.clone();
        }
        session.key = key;
    }
}

impl EngineContainer for MemoryContainer {
    fn name(&self) -> String {
        self.session().key.1
    }

    fn config_path(&self) -> PathBuf {
        self.session().key.0
    }

    fn set_config_path(&self, path: &Path) -> bool {
        let Some(mut s) = self.act(Primitive::SetConfigPath) else {
            return false;
        };
        let key = (path.to_path_buf(), s.key.1.clone());
        self.rekey(&mut s, key);
        true
    }

    fn config_file_name(&self) -> PathBuf {
        let (path, name) = self.session().key;
        path.join(name).join("config")
    }

    fn is_defined(&self) -> bool {
        let s = self.session();
        s.world.is_defined(&s.key)
    }

    fn is_running(&self) -> bool {
        self.session().record().is_running()
    }

    fn may_control(&self) -> bool {
        true
    }

    fn state(&self) -> String {
        self.session().record().state.clone()
    }

    fn init_pid(&self) -> i32 {
        let mut s = self.session();
        let record = s.record();
        if record.is_running() {
            record.init_pid
        } else {
            -1
        }
    }

    fn daemonize(&self) -> bool {
        self.session().record().daemonize
    }

    fn want_daemonize(&self, state: bool) -> bool {
        let Some(mut s) = self.act(Primitive::WantDaemonize) else {
            return false;
        };
        s.record().daemonize = state;
        true
    }

    fn want_close_all_fds(&self, state: bool) -> bool {
        let Some(mut s) = self.act(Primitive::WantCloseAllFds) else {
            return false;
        };
        s.record().close_all_fds = state;
        true
    }

    fn start(&self, _use_init: bool, _args: &[String]) -> bool {
        let Some(mut s) = self.act(Primitive::Start) else {
            return false;
        };
        if !s.record().is_stopped() {
            return false;
        }
        let pid = s.world.spawn_init();
        let record = s.record();
        record.set_state(State::Running);
        record.init_pid = pid;
        record.interfaces = vec!["eth0".to_owned(), "lo".to_owned()];
        true
    }

    fn stop(&self) -> bool {
        let Some(mut s) = self.act(Primitive::Stop) else {
            return false;
        };
        let record = s.record();
        if !record.is_running() {
            return false;
        }
        record.set_state(State::Stopped);
        record.init_pid = -1;
        record.interfaces.clear();
        true
    }

    fn shutdown(&self, _timeout_secs: i32) -> bool {
        let Some(mut s) = self.act(Primitive::Shutdown) else {
            return false;
        };
        let record = s.record();
        if !record.is_running() || record.in_state(State::Frozen) {
            return false;
        }
        record.set_state(State::Stopped);
        record.init_pid = -1;
        record.interfaces.clear();
        true
    }

    fn reboot(&self) -> bool {
        let Some(mut s) = self.act(Primitive::Reboot) else {
            return false;
        };
        if !s.record().is_running() {
            return false;
        }
        let pid = s.world.spawn_init();
        let record = s.record();
        record.set_state(State::Running);
        record.init_pid = pid;
        true
    }

    fn create(
        &self,
        template: &str,
        backend: BackendStore,
        verbosity: Verbosity,
        _args: &[String],
    ) -> bool {
        let Some(mut s) = self.act(Primitive::Create) else {
            return false;
        };
        if self.unprivileged && template != DOWNLOAD_TEMPLATE {
            tracing::warn!(template, "unprivileged callers may only use the download template");
            return false;
        }
        let (path, name) = s.key.clone();
        let record = s.record();
        if record.defined {
            return false;
        }
        record.defined = true;
        record.set_state(State::Stopped);
        record.last_create = Some((template.to_owned(), backend, verbosity));
        if record.config.get("lxc.uts.name").is_none() {
            record.config.set("lxc.uts.name", &name);
        }
        let rootfs = path.join(&name).join("rootfs");
        record
            .config
            .set("lxc.rootfs.path", &format!("{backend}:{}", rootfs.display()));
        true
    }

    fn destroy(&self) -> bool {
        let Some(mut s) = self.act(Primitive::Destroy) else {
            return false;
        };
        let record = s.record();
        if !record.is_stopped() {
            return false;
        }
        *record = Record {
            snapshots: std::mem::take(&mut record.snapshots),
            next_snapshot: record.next_snapshot,
            ..Default::default()
        };
        true
    }

    fn destroy_with_snapshots(&self) -> bool {
        let Some(mut s) = self.act(Primitive::DestroyWithSnapshots) else {
            return false;
        };
        let record = s.record();
        if !record.is_stopped() {
            return false;
        }
        *record = Record::default();
        true
    }

    fn rename(&self, new_name: &str) -> bool {
        let Some(mut s) = self.act(Primitive::Rename) else {
            return false;
        };
        let new_key = (s.key.0.clone(), new_name.to_owned());
        if !s.record().is_stopped() || s.world.is_defined(&new_key) {
            return false;
        }
        let key = s.key.clone();
        let Some(mut record) = s.world.records.remove(&key) else {
            return false;
        };
        if record.config.get("lxc.uts.name").as_deref() == Some(key.1.as_str()) {
            record.config.set("lxc.uts.name", new_name);
        }
        s.world.records.insert(new_key.clone(), record);
        self.rekey(&mut s, new_key);
        true
    }

    fn freeze(&self) -> bool {
        let Some(mut s) = self.act(Primitive::Freeze) else {
            return false;
        };
        let record = s.record();
        if !record.defined || !(record.in_state(State::Running) || record.in_state(State::Thawed))
        {
            return false;
        }
        record.set_state(State::Frozen);
        true
    }

    fn unfreeze(&self) -> bool {
        let Some(mut s) = self.act(Primitive::Unfreeze) else {
            return false;
        };
        let record = s.record();
        if !record.defined || !record.in_state(State::Frozen) {
            return false;
        }
        record.set_state(State::Running);
        true
    }

    fn wait(&self, state: &str, _timeout_secs: i32) -> bool {
        let Some(mut s) = self.act(Primitive::Wait) else {
            return false;
        };
        s.record().state == state
    }

    fn get_config_item(&self, key: &str) -> Option<String> {
        let mut s = self.act(Primitive::GetConfigItem)?;
        s.record().config.get(key)
    }

    fn set_config_item(&self, key: &str, value: &str) -> bool {
        let Some(mut s) = self.act(Primitive::SetConfigItem) else {
            return false;
        };
        s.record().config.set(key, value);
        true
    }

    fn clear_config_item(&self, key: &str) -> bool {
        let Some(mut s) = self.act(Primitive::ClearConfigItem) else {
            return false;
        };
        s.record().config.clear(key);
        true
    }

    fn clear_config(&self) {
        self.session().record().config.clear_all();
    }

    fn get_keys(&self, prefix: Option<&str>) -> Option<String> {
        let keys = self.session().record().config.keys(prefix);
        (!keys.is_empty()).then(|| keys.join("\n"))
    }

    fn get_running_config_item(&self, key: &str) -> Option<String> {
        let mut s = self.session();
        let record = s.record();
        if !record.is_running() {
            return None;
        }
        record.config.get(key)
    }

    fn load_config(&self, path: &Path) -> bool {
        let Some(mut s) = self.act(Primitive::LoadConfig) else {
            return false;
        };
        match ConfigFile::load(path) {
            Ok(config) => {
                s.record().config = config;
                true
            }
            Err(err) => {
                tracing::debug!(?path, ?err, "failed to load config");
                false
            }
        }
    }

    fn save_config(&self, path: &Path) -> bool {
        let Some(mut s) = self.act(Primitive::SaveConfig) else {
            return false;
        };
        s.record().config.save(path).is_ok()
    }

    fn get_cgroup_item(&self, key: &str) -> Option<String> {
        let mut s = self.act(Primitive::GetCgroupItem)?;
        let record = s.record();
        if !record.is_running() {
            return None;
        }
        record.cgroup.get(key).cloned()
    }

    fn set_cgroup_item(&self, key: &str, value: &str) -> bool {
        let Some(mut s) = self.act(Primitive::SetCgroupItem) else {
            return false;
        };
        let record = s.record();
        if !record.is_running() {
            return false;
        }
        record.cgroup.insert(key.to_owned(), value.to_owned());
        true
    }

    fn snapshot(&self, comment_file: Option<&Path>) -> i32 {
        let Some(mut s) = self.act(Primitive::Snapshot) else {
            return -1;
        };
        let (path, name) = s.key.clone();
        let record = s.record();
        if !record.is_stopped() {
            return -1;
        }
        let index = record.next_snapshot;
        record.next_snapshot += 1;
        record.snapshots.push(SnapshotRecord {
            name: format!("snap{index}"),
            comment_path: comment_file.map(Path::to_path_buf).unwrap_or_default(),
            timestamp: chrono::Local::now()
                .format(SNAPSHOT_TIMESTAMP_FORMAT)
                .to_string(),
            path: path.join(name).join("snaps"),
        });
        i32::try_from(index).unwrap_or(-1)
    }

    fn snapshot_list(&self) -> Option<Vec<SnapshotRecord>> {
        let mut s = self.act(Primitive::SnapshotList)?;
        Some(s.record().snapshots.clone())
    }

    fn snapshot_restore(&self, snapshot: &str, new_name: &str) -> bool {
        let Some(mut s) = self.act(Primitive::SnapshotRestore) else {
            return false;
        };
        let new_key = (s.key.0.clone(), new_name.to_owned());
        if s.world.is_defined(&new_key) {
            return false;
        }
        let record = s.record();
        if !record.snapshots.iter().any(|snap| snap.name == snapshot) {
            return false;
        }
        let restored = record.copy_as(new_name, false);
        s.world.records.insert(new_key, restored);
        true
    }

    fn snapshot_destroy(&self, snapshot: &str) -> bool {
        let Some(mut s) = self.act(Primitive::SnapshotDestroy) else {
            return false;
        };
        let snapshots = &mut s.record().snapshots;
        match snapshots.iter().position(|snap| snap.name == snapshot) {
            Some(pos) => {
                snapshots.remove(pos);
                true
            }
            None => false,
        }
    }

    fn snapshot_destroy_all(&self) -> bool {
        let Some(mut s) = self.act(Primitive::SnapshotDestroyAll) else {
            return false;
        };
        s.record().snapshots.clear();
        true
    }

    fn clone_to(
        &self,
        new_name: &str,
        config_path: Option<&Path>,
        flags: CloneFlags,
        _backend: BackendStore,
    ) -> bool {
        let Some(mut s) = self.act(Primitive::Clone) else {
            return false;
        };
        let new_key = (
            config_path.map_or_else(|| s.key.0.clone(), Path::to_path_buf),
            new_name.to_owned(),
        );
        if new_key == s.key || s.world.is_defined(&new_key) {
            return false;
        }
        let record = s.record();
        if !record.is_stopped() {
            return false;
        }
        let copy = record.copy_as(new_name, flags.contains(CloneFlags::KEEP_NAME));
        s.world.records.insert(new_key, copy);
        true
    }

    fn get_interfaces(&self) -> Option<Vec<String>> {
        let mut s = self.act(Primitive::GetInterfaces)?;
        let record = s.record();
        record.is_running().then(|| record.interfaces.clone())
    }

    fn get_ips(
        &self,
        interface: Option<&str>,
        family: Option<&str>,
        _scope: i32,
    ) -> Option<Vec<String>> {
        let mut s = self.act(Primitive::GetIps)?;
        let record = s.record();
        if !record.is_running() {
            return None;
        }
        let ips = record
            .ips
            .iter()
            .filter(|(iface, _)| interface.map_or(true, |i| i == iface))
            .filter(|(_, address)| match family {
                Some("inet") => !address.contains(':'),
                Some("inet6") => address.contains(':'),
                _ => true,
            })
            .map(|(_, address)| address.clone())
            .collect();
        Some(ips)
    }

    fn attach_interface(&self, device: &str, destination: Option<&str>) -> bool {
        let Some(mut s) = self.act(Primitive::AttachInterface) else {
            return false;
        };
        let record = s.record();
        if !record.is_running() {
            return false;
        }
        record
            .interfaces
            .push(destination.unwrap_or(device).to_owned());
        true
    }

    fn detach_interface(&self, device: &str, _destination: Option<&str>) -> bool {
        let Some(mut s) = self.act(Primitive::DetachInterface) else {
            return false;
        };
        let interfaces = &mut s.record().interfaces;
        match interfaces.iter().position(|iface| iface == device) {
            Some(pos) => {
                interfaces.remove(pos);
                true
            }
            None => false,
        }
    }

    fn add_device_node(&self, source: &str, destination: Option<&str>) -> bool {
        let Some(mut s) = self.act(Primitive::AddDeviceNode) else {
            return false;
        };
        let record = s.record();
        if !record.is_running() {
            return false;
        }
        record.devices.push(destination.unwrap_or(source).to_owned());
        true
    }

    fn remove_device_node(&self, source: &str, destination: Option<&str>) -> bool {
        let Some(mut s) = self.act(Primitive::RemoveDeviceNode) else {
            return false;
        };
        let path = destination.unwrap_or(source);
        let devices = &mut s.record().devices;
        match devices.iter().position(|device| device == path) {
            Some(pos) => {
                devices.remove(pos);
                true
            }
            None => false,
        }
    }

    fn attach_shell(&self, _options: &AttachOptions) -> i32 {
        let Some(mut s) = self.act(Primitive::AttachShell) else {
            return -1;
        };
        if s.record().is_running() {
            0
        } else {
            -1
        }
    }

    fn attach_run_wait(&self, _options: &AttachOptions, args: &[String]) -> i32 {
        let Some(mut s) = self.act(Primitive::AttachRunWait) else {
            return -1;
        };
        if !s.record().is_running() {
            return -1;
        }
        match args.first().map(String::as_str) {
            Some("false") => 1,
            _ => 0,
        }
    }

    fn console_getfd(&self, ttynum: i32) -> i32 {
        let Some(mut s) = self.act(Primitive::ConsoleGetfd) else {
            return -1;
        };
        if !s.record().is_running() {
            return -1;
        }
        // Descriptors handed out are fake; tty numbers map above stdio.
        3 + ttynum.max(0)
    }

    fn console(&self, _options: &ConsoleOptions) -> bool {
        let Some(mut s) = self.act(Primitive::Console) else {
            return false;
        };
        s.record().is_running()
    }

    fn execute(&self, args: &[String]) -> Option<Vec<u8>> {
        let mut s = self.act(Primitive::Execute)?;
        if s.record().defined {
            return None;
        }
        match args.split_first() {
            Some((cmd, rest)) if cmd == "echo" => Some(format!("{}\n", rest.join(" ")).into_bytes()),
            Some(_) => Some(Vec::new()),
            None => None,
        }
    }

    fn get(&self) -> bool {
        let Some(mut s) = self.act(Primitive::Get) else {
            return false;
        };
        match s.world.objects.get_mut(&self.id) {
            Some(object) if object.refs > 0 => {
                object.refs += 1;
                true
            }
            _ => false,
        }
    }

    fn put(&self) -> i32 {
        let Some(mut s) = self.act(Primitive::Put) else {
            return -1;
        };
        match s.world.objects.get_mut(&self.id) {
            Some(object) if object.refs > 0 => {
                object.refs -= 1;
                i32::from(object.refs == 0)
            }
            _ => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_share_one_world() {
        let engine = MemoryEngine::default();
        let first = engine.new_container("rubik", None).unwrap();
        let second = engine.new_container("rubik", None).unwrap();

        assert!(first.create("busybox", BackendStore::Directory, Verbosity::Quiet, &[]));
        assert!(second.is_defined());
        assert!(second.start(false, &[]));
        assert!(first.is_running());
        assert!(!first.start(false, &[]));
    }

    #[test]
    fn test_config_paths_are_separate() {
        let engine = MemoryEngine::default();
        let default = engine.new_container("rubik", None).unwrap();
        let other = engine
            .new_container("rubik", Some(Path::new("/srv/lxc")))
            .unwrap();

        assert!(default.create("busybox", BackendStore::Directory, Verbosity::Quiet, &[]));
        assert!(!other.is_defined());
        assert_eq!(engine.container_names(Path::new(DEFAULT_CONFIG_PATH)), vec!["rubik"]);
        assert!(engine.container_names(Path::new("/srv/lxc")).is_empty());
    }

    #[test]
    fn test_injected_failure_is_one_shot() {
        let engine = MemoryEngine::default();
        let container = engine.new_container("rubik", None).unwrap();
        engine.fail_next("rubik", Primitive::SetConfigItem);

        assert!(!container.set_config_item("lxc.arch", "x86_64"));
        assert!(container.set_config_item("lxc.arch", "x86_64"));
        assert_eq!(engine.calls("rubik", Primitive::SetConfigItem), 2);
    }

    #[test]
    fn test_double_put() {
        let engine = MemoryEngine::default();
        let container = engine.new_container("rubik", None).unwrap();

        assert_eq!(container.put(), 1);
        assert_eq!(container.put(), -1);
        assert!(!container.get());
    }

    #[test]
    fn test_create_sets_rootfs() {
        let engine = MemoryEngine::default();
        let container = engine.new_container("rubik", None).unwrap();

        assert!(container.create("busybox", BackendStore::Btrfs, Verbosity::Quiet, &[]));
        assert_eq!(
            container.get_config_item("lxc.rootfs.path").as_deref(),
            Some("btrfs:/var/lib/lxc/rubik/rootfs")
        );
        assert_eq!(container.get_config_item("lxc.uts.name").as_deref(), Some("rubik"));
    }
}
