use std::time::Duration;

use anyhow::Result;
use libcorral::cgroups::{CpuStats, CPUACCT_STAT, MEMORY_LIMIT};
use libcorral::engine::memory::{MemoryEngine, Primitive};
use libcorral::{Container, LibcorralError, State};

fn defined(engine: &MemoryEngine, name: &str) -> Result<Container> {
    let container = Container::new(engine, name, None)?;
    container.create("busybox", &[])?;
    Ok(container)
}

fn running(engine: &MemoryEngine, name: &str) -> Result<Container> {
    let container = defined(engine, name)?;
    container.start()?;
    Ok(container)
}

#[test]
fn create_destroy_round_trip() -> Result<()> {
    let engine = MemoryEngine::default();
    let container = Container::new(&engine, "rubik", None)?;
    assert!(!container.defined());
    assert!(!container.running());

    container.create("busybox", &[])?;
    assert!(container.defined());
    assert_eq!(container.state()?, State::Stopped);

    container.destroy()?;
    assert!(!container.defined());
    Ok(())
}

#[test]
fn undefined_container_rejects_running_operations() -> Result<()> {
    let engine = MemoryEngine::default();
    let container = Container::new(&engine, "rubik", None)?;

    let results = [
        container.start().err(),
        container.stop().err(),
        container.freeze().err(),
        container.unfreeze().err(),
        container.shutdown(Some(Duration::from_secs(1))).err(),
        container.interfaces().err(),
        container.memory_usage().err(),
    ];
    for err in results {
        let err = err.expect("operation on an undefined container must fail");
        assert!(err.is_precondition(), "{err}");
        assert!(matches!(err, LibcorralError::NotDefined { .. }), "{err}");
        assert_eq!(err.container_name(), "rubik");
    }

    for primitive in [
        Primitive::Start,
        Primitive::Stop,
        Primitive::Freeze,
        Primitive::Unfreeze,
        Primitive::Shutdown,
        Primitive::GetInterfaces,
        Primitive::GetCgroupItem,
    ] {
        assert_eq!(engine.calls("rubik", primitive), 0, "{primitive:?}");
    }
    Ok(())
}

#[test]
fn second_start_is_rejected() -> Result<()> {
    let engine = MemoryEngine::default();
    let container = running(&engine, "rubik")?;

    assert!(matches!(
        container.start(),
        Err(LibcorralError::AlreadyRunning { .. })
    ));
    assert_eq!(engine.calls("rubik", Primitive::Start), 1);
    Ok(())
}

#[test]
fn freeze_unfreeze_round_trip() -> Result<()> {
    let engine = MemoryEngine::default();
    let container = running(&engine, "rubik")?;

    container.freeze()?;
    assert_eq!(container.state()?, State::Frozen);
    assert!(matches!(
        container.freeze(),
        Err(LibcorralError::AlreadyFrozen { .. })
    ));

    container.unfreeze()?;
    assert_eq!(container.state()?, State::Running);
    assert!(matches!(
        container.unfreeze(),
        Err(LibcorralError::NotFrozen { .. })
    ));
    Ok(())
}

#[test]
fn config_item_round_trip() -> Result<()> {
    let engine = MemoryEngine::default();
    let container = defined(&engine, "rubik")?;

    container.set_config_item("lxc.arch", "x86_64")?;
    assert_eq!(container.config_item("lxc.arch")[0], "x86_64");
    container.set_config_item("lxc.arch", "aarch64")?;
    assert_eq!(container.config_item("lxc.arch"), vec!["aarch64"]);
    Ok(())
}

#[test]
fn snapshot_round_trip() -> Result<()> {
    let engine = MemoryEngine::default();
    let container = defined(&engine, "rubik")?;

    let snapshot = container.create_snapshot()?;
    assert!(container
        .snapshots()?
        .iter()
        .any(|listed| listed.name == snapshot.name));
    assert!(snapshot.created().is_some());

    container.destroy_snapshot(&snapshot)?;
    assert!(matches!(
        container.snapshots(),
        Err(LibcorralError::NoSnapshot { .. })
    ));
    Ok(())
}

#[test]
fn cpu_stats_in_either_order() -> Result<()> {
    let engine = MemoryEngine::default();
    let container = running(&engine, "rubik")?;
    let expected = CpuStats {
        user: 100,
        system: 50,
    };

    engine.set_cgroup_item("rubik", CPUACCT_STAT, "user 100\nsystem 50\n");
    assert_eq!(container.cpu_stats()?, expected);

    engine.set_cgroup_item("rubik", CPUACCT_STAT, "system 50\nuser 100\n");
    assert_eq!(container.cpu_stats()?, expected);
    Ok(())
}

#[test]
fn memory_limit_without_controller() -> Result<()> {
    let engine = MemoryEngine::default();
    let container = running(&engine, "rubik")?;

    let err = container.memory_limit().unwrap_err();
    assert!(matches!(err, LibcorralError::MemLimitUnsupported { .. }));
    assert!(err.is_capability_missing());

    engine.set_cgroup_item("rubik", MEMORY_LIMIT, "");
    assert!(container.memory_limit().unwrap_err().is_capability_missing());
    Ok(())
}

#[test]
fn engine_failure_is_surfaced_once() -> Result<()> {
    let engine = MemoryEngine::default();
    let container = running(&engine, "rubik")?;

    engine.fail_next("rubik", Primitive::Stop);
    let err = container.stop().unwrap_err();
    assert!(matches!(err, LibcorralError::StopFailed { .. }));
    assert!(err.is_engine_failure());
    assert!(container.running());

    container.stop()?;
    assert!(!container.running());
    assert_eq!(engine.calls("rubik", Primitive::Stop), 2);
    Ok(())
}

#[test]
fn shutdown_falls_back_to_stop() -> Result<()> {
    let engine = MemoryEngine::default();
    let container = running(&engine, "rubik")?;

    engine.fail_next("rubik", Primitive::Shutdown);
    if let Err(err) = container.shutdown(Some(Duration::from_secs(30))) {
        assert!(matches!(err, LibcorralError::ShutdownFailed { .. }));
        container.stop()?;
    }
    assert!(container.wait(State::Stopped, Some(Duration::ZERO)));
    Ok(())
}
