use std::time::Duration;

use super::container::Inner;
use super::Container;
use crate::cgroups::{self, CpuStats, MemoryController, ParseMetricError};
use crate::codec::{split_items, ByteSize};
use crate::error::{LibcorralError, Result};
use crate::gate::Precondition;

fn unsupported(controller: MemoryController, name: String, key: &str) -> LibcorralError {
    let key = key.to_owned();
    match controller {
        MemoryController::Memory => LibcorralError::MemLimitUnsupported { name, key },
        MemoryController::SoftMemory => LibcorralError::SoftMemLimitUnsupported { name, key },
        MemoryController::KernelMemory => LibcorralError::KMemLimitUnsupported { name, key },
        MemoryController::MemorySwap => LibcorralError::SwapLimitUnsupported { name, key },
    }
}

fn parse_error(name: String, key: &str, err: ParseMetricError) -> LibcorralError {
    tracing::warn!(name, key, %err, "unexpected cgroup item value");
    LibcorralError::CgroupItemParse {
        name,
        key: key.into(),
        value: err.value().unwrap_or_default().into(),
    }
}

impl Inner {
    fn cgroup_item(&self, key: &str) -> Vec<String> {
        split_items(self.engine().get_cgroup_item(key).as_deref())
    }
}

impl Container {
    /// Every value of the cgroup item `key` of the running container.
    pub fn cgroup_item(&self, key: &str) -> Result<Vec<String>> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;
        Ok(self.read().cgroup_item(key))
    }

    pub fn set_cgroup_item(&self, key: &str, value: &str) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), key, value, "setting cgroup item");
        if !inner.engine().set_cgroup_item(key, value) {
            tracing::error!(name = %inner.name(), key, value, "engine refused cgroup item");
            return Err(LibcorralError::SettingCgroupItemFailed {
                name: inner.name(),
                key: key.into(),
                value: value.into(),
            });
        }
        Ok(())
    }

    // A kernel without the controller yields an empty or garbled value, so
    // any parse failure means the controller is missing.
    fn byte_size_item(&self, key: &str, controller: MemoryController) -> Result<ByteSize> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.read();
        cgroups::parse_byte_size(&inner.cgroup_item(key)).map_err(|err| {
            tracing::debug!(name = %inner.name(), key, %err, "cgroup controller missing");
            unsupported(controller, inner.name(), key)
        })
    }

    fn set_byte_size_item(
        &self,
        key: &str,
        limit: ByteSize,
        failed: fn(String, String) -> LibcorralError,
    ) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        let value = limit.to_engine_value();
        tracing::debug!(name = %inner.name(), key, value, "setting limit");
        if !inner.engine().set_cgroup_item(key, &value) {
            tracing::error!(name = %inner.name(), key, value, "engine refused limit");
            return Err(failed(inner.name(), value));
        }
        Ok(())
    }

    pub fn memory_usage(&self) -> Result<ByteSize> {
        self.byte_size_item(cgroups::MEMORY_USAGE, MemoryController::Memory)
    }

    pub fn memory_limit(&self) -> Result<ByteSize> {
        self.byte_size_item(cgroups::MEMORY_LIMIT, MemoryController::Memory)
    }

    pub fn set_memory_limit(&self, limit: ByteSize) -> Result<()> {
        self.set_byte_size_item(cgroups::MEMORY_LIMIT, limit, |name, value| {
            LibcorralError::SettingMemoryLimitFailed { name, value }
        })
    }

    pub fn soft_memory_limit(&self) -> Result<ByteSize> {
        self.byte_size_item(cgroups::MEMORY_SOFT_LIMIT, MemoryController::SoftMemory)
    }

    pub fn set_soft_memory_limit(&self, limit: ByteSize) -> Result<()> {
        self.set_byte_size_item(cgroups::MEMORY_SOFT_LIMIT, limit, |name, value| {
            LibcorralError::SettingSoftMemoryLimitFailed { name, value }
        })
    }

    pub fn kernel_memory_usage(&self) -> Result<ByteSize> {
        self.byte_size_item(cgroups::KMEM_USAGE, MemoryController::KernelMemory)
    }

    pub fn kernel_memory_limit(&self) -> Result<ByteSize> {
        self.byte_size_item(cgroups::KMEM_LIMIT, MemoryController::KernelMemory)
    }

    pub fn set_kernel_memory_limit(&self, limit: ByteSize) -> Result<()> {
        self.set_byte_size_item(cgroups::KMEM_LIMIT, limit, |name, value| {
            LibcorralError::SettingKMemoryLimitFailed { name, value }
        })
    }

    pub fn memory_swap_usage(&self) -> Result<ByteSize> {
        self.byte_size_item(cgroups::MEMSW_USAGE, MemoryController::MemorySwap)
    }

    pub fn memory_swap_limit(&self) -> Result<ByteSize> {
        self.byte_size_item(cgroups::MEMSW_LIMIT, MemoryController::MemorySwap)
    }

    pub fn set_memory_swap_limit(&self, limit: ByteSize) -> Result<()> {
        self.set_byte_size_item(cgroups::MEMSW_LIMIT, limit, |name, value| {
            LibcorralError::SettingMemorySwapLimitFailed { name, value }
        })
    }

    /// Bytes moved by block devices, from the `Total` line of the throttle
    /// accounting.
    pub fn blkio_usage(&self) -> Result<ByteSize> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.read();
        let key = cgroups::BLKIO_SERVICE_BYTES;
        cgroups::parse_blkio_total(&inner.cgroup_item(key)).map_err(|err| match err {
            ParseMetricError::MissingField { .. } => {
                LibcorralError::BlkioUsageUnavailable { name: inner.name() }
            }
            err => parse_error(inner.name(), key, err),
        })
    }

    /// Cpu time consumed by all tasks in the container.
    pub fn cpu_time(&self) -> Result<Duration> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.read();
        let key = cgroups::CPUACCT_USAGE;
        cgroups::parse_cpu_time(&inner.cgroup_item(key))
            .map_err(|err| parse_error(inner.name(), key, err))
    }

    /// Cpu time per cpu, indexed by cpu number.
    pub fn cpu_time_per_cpu(&self) -> Result<Vec<Duration>> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.read();
        let key = cgroups::CPUACCT_USAGE_PERCPU;
        cgroups::parse_cpu_time_per_cpu(&inner.cgroup_item(key))
            .map_err(|err| parse_error(inner.name(), key, err))
    }

    /// User and system time in clock ticks.
    pub fn cpu_stats(&self) -> Result<CpuStats> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.read();
        let key = cgroups::CPUACCT_STAT;
        cgroups::parse_cpu_stats(&inner.cgroup_item(key))
            .map_err(|err| parse_error(inner.name(), key, err))
    }
}
