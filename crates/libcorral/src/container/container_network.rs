use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Container;
use crate::codec::ByteSize;
use crate::error::{LibcorralError, Result};
use crate::gate::Precondition;

const SYSFS: &str = "/sys";
// Only addresses with global scope are reported.
const SCOPE_GLOBAL: i32 = 0;

/// Traffic counters of one host side interface.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct InterfaceStats {
    pub rx: ByteSize,
    pub tx: ByteSize,
}

fn read_counter(path: &Path) -> io::Result<ByteSize> {
    let content = fs::read_to_string(path)?;
    content
        .trim()
        .parse::<u64>()
        .map(ByteSize::from)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn read_interface_stats(sysfs: &Path, interface: &str) -> io::Result<InterfaceStats> {
    let statistics = sysfs
        .join("class/net")
        .join(interface)
        .join("statistics");
    Ok(InterfaceStats {
        rx: read_counter(&statistics.join("rx_bytes"))?,
        tx: read_counter(&statistics.join("tx_bytes"))?,
    })
}

impl Container {
    /// Names of the network interfaces inside the container.
    pub fn interfaces(&self) -> Result<Vec<String>> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.read();
        inner
            .engine()
            .get_interfaces()
            .ok_or_else(|| LibcorralError::InterfacesUnavailable { name: inner.name() })
    }

    fn ips(&self, interface: Option<&str>, family: Option<&str>) -> Result<Vec<String>> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.read();
        inner
            .engine()
            .get_ips(interface, family, SCOPE_GLOBAL)
            .ok_or_else(|| LibcorralError::IpAddressesUnavailable {
                name: inner.name(),
                interface: interface.map(String::from),
                family: family.map(String::from),
            })
    }

    /// Addresses configured on `interface`.
    pub fn ip_address(&self, interface: &str) -> Result<Vec<String>> {
        self.ips(Some(interface), None)
    }

    pub fn ip_addresses(&self) -> Result<Vec<String>> {
        self.ips(None, None)
    }

    pub fn ipv4_addresses(&self) -> Result<Vec<String>> {
        self.ips(None, Some("inet"))
    }

    pub fn ipv6_addresses(&self) -> Result<Vec<String>> {
        self.ips(None, Some("inet6"))
    }

    /// Traffic counters of every configured network, keyed by the host side
    /// interface name and read from the host's sysfs.
    pub fn interface_stats(&self) -> Result<BTreeMap<String, InterfaceStats>> {
        self.interface_stats_in(Path::new(SYSFS))
    }

    fn interface_stats_in(&self, sysfs: &Path) -> Result<BTreeMap<String, InterfaceStats>> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let mut statistics = BTreeMap::new();
        for index in self.config_item("lxc.net") {
            if index.is_empty() {
                continue;
            }
            let kind = self.running_config_item(&format!("lxc.net.{index}.type"));
            let link_key = match kind[0].as_str() {
                "" => continue,
                "veth" => format!("lxc.net.{index}.veth.pair"),
                _ => format!("lxc.net.{index}.link"),
            };
            let Some(interface) = self
                .running_config_item(&link_key)
                .into_iter()
                .next()
                .filter(|name| !name.is_empty())
            else {
                tracing::debug!(name = %self.name(), index, "network has no host side interface");
                continue;
            };

            let stats = read_interface_stats(sysfs, &interface).map_err(|source| {
                LibcorralError::InterfaceStats {
                    name: self.name(),
                    interface: interface.clone(),
                    source,
                }
            })?;
            statistics.insert(interface, stats);
        }

        Ok(statistics)
    }

    /// Moves the host network device `device` into the container, optionally
    /// renaming it to `destination`.
    pub fn attach_interface(&self, device: &str, destination: Option<&str>) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), device, ?destination, "attaching interface");
        if !inner.engine().attach_interface(device, destination) {
            return Err(LibcorralError::AttachInterfaceFailed {
                name: inner.name(),
                device: device.into(),
            });
        }
        Ok(())
    }

    /// Moves `device` out of the container back to the host.
    pub fn detach_interface(&self, device: &str, destination: Option<&str>) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), device, ?destination, "detaching interface");
        if !inner.engine().detach_interface(device, destination) {
            return Err(LibcorralError::DetachInterfaceFailed {
                name: inner.name(),
                device: device.into(),
            });
        }
        Ok(())
    }
}
