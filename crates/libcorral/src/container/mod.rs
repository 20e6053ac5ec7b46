//! Container handles
/// A [`Container`] wraps one reference on an engine side container object.
/// Every state sensitive operation first passes the lifecycle gate, then takes
/// the handle's write lock for the duration of the engine call. Operations are
/// split by concern into the `container_*` files, each extending `Container`.
#[allow(clippy::module_inception)]
mod container;
mod container_attach;
mod container_cgroup;
mod container_clone;
mod container_config;
mod container_create;
mod container_destroy;
mod container_device;
mod container_freeze;
mod container_network;
mod container_snapshot;
mod container_start;

pub use container::Container;
pub use container_attach::{AttachOptions, ConsoleOptions};
pub use container_network::InterfaceStats;
pub use container_snapshot::Snapshot;
