// src/registry/tests.rs

use super::*;
use crate::config::HeadlessDisplayConfig;
use crate::driver::HeadlessDisplayDriver;
use crate::resolution::Resolution;
use anyhow::Result;

fn display(id: &str, bounds: Rect, primary: bool) -> HeadlessDisplayConfig {
    let current = Resolution::new(0, 0, bounds.width, bounds.height, 32, 60.0).unwrap();
    HeadlessDisplayConfig {
        id: id.to_string(),
        bounds: Some(bounds),
        current,
        modes: Vec::new(),
        primary,
    }
}

fn registry_with(
    displays: &[HeadlessDisplayConfig],
    config: RegistryConfig,
) -> (Arc<HeadlessDisplayDriver>, DisplayRegistry) {
    let driver = Arc::new(HeadlessDisplayDriver::new(displays));
    let registry = DisplayRegistry::new(driver.clone(), config);
    (driver, registry)
}

/// Two side-by-side 1920x1080 displays, the left one primary.
fn dual_head() -> (Arc<HeadlessDisplayDriver>, DisplayRegistry) {
    registry_with(
        &[
            display("LEFT", Rect::new(0, 0, 1920, 1080), true),
            display("RIGHT", Rect::new(1920, 0, 1920, 1080), false),
        ],
        RegistryConfig::default(),
    )
}

fn ids(devices: &[Device]) -> Vec<&str> {
    devices.iter().map(|d| d.id().as_str()).collect()
}

#[test_log::test]
fn it_should_list_devices_in_enumeration_order() -> Result<()> {
    let (_driver, registry) = dual_head();
    let devices = registry.devices()?;
    assert_eq!(ids(&devices), vec!["LEFT", "RIGHT"]);
    assert!(devices[0].is_primary());
    assert!(!devices[1].is_primary());
    Ok(())
}

#[test_log::test]
fn it_should_look_devices_up_by_index() -> Result<()> {
    let (_driver, registry) = dual_head();
    assert_eq!(registry.get_device(1)?.unwrap().id().as_str(), "RIGHT");
    assert!(registry.get_device(2)?.is_none());
    assert_eq!(
        registry.display(DisplayIndex::FIRST)?.unwrap().id().as_str(),
        "LEFT"
    );
    assert!(registry.display(DisplayIndex::SIXTH)?.is_none());
    Ok(())
}

#[test_log::test]
fn it_should_resolve_the_primary_lazily_on_first_lookup() -> Result<()> {
    let (_driver, registry) = dual_head();
    assert_eq!(registry.primary_id(), None);
    let right = registry.get_device(1)?.unwrap();
    assert_eq!(registry.primary_id(), Some(DeviceId::new("LEFT")));
    assert!(!right.is_primary());
    Ok(())
}

#[test_log::test]
fn it_should_return_the_primary_device() -> Result<()> {
    let (_driver, registry) = dual_head();
    let primary = registry.display(DisplayIndex::Primary)?.unwrap();
    assert_eq!(primary.id().as_str(), "LEFT");
    assert!(primary.is_primary());
    Ok(())
}

#[test_log::test]
fn it_should_demote_the_previous_primary() -> Result<()> {
    let (_driver, registry) = dual_head();
    let a = registry.get_device(0)?.unwrap();
    let b = registry.get_device(1)?.unwrap();
    assert!(a.is_primary());

    let demoted = registry.set_primary(b.id())?;
    assert_eq!(demoted, Some(DeviceId::new("LEFT")));
    assert!(!a.is_primary());
    assert!(b.is_primary());
    assert_eq!(registry.primary_device()?.unwrap().id().as_str(), "RIGHT");
    Ok(())
}

#[test_log::test]
fn it_should_reject_a_primary_the_driver_does_not_report() -> Result<()> {
    let (driver, registry) = dual_head();
    registry.devices()?;

    let missing = DeviceId::new("NOPE");
    assert_eq!(
        registry.set_primary(&missing),
        Err(DisplayError::UnknownDevice(missing))
    );
    assert_eq!(registry.primary_id(), Some(DeviceId::new("LEFT")));
    assert!(registry.get_device(0)?.unwrap().is_primary());
    assert!(!registry.get_device(1)?.unwrap().is_primary());

    driver.set_fail_enumeration(true);
    assert!(matches!(
        registry.set_primary(&DeviceId::new("RIGHT")),
        Err(DisplayError::PlatformQueryFailed(_))
    ));
    assert_eq!(registry.primary_id(), Some(DeviceId::new("LEFT")));
    Ok(())
}

#[test_log::test]
fn it_should_allow_no_primary_after_clearing() -> Result<()> {
    let (_driver, registry) = dual_head();
    registry.devices()?;
    assert_eq!(registry.clear_primary(), Some(DeviceId::new("LEFT")));
    assert!(registry.primary_device()?.is_none());
    assert!(registry.devices()?.iter().all(|d| !d.is_primary()));
    Ok(())
}

#[test_log::test]
fn it_should_only_follow_out_of_band_changes_on_refresh() -> Result<()> {
    let (driver, registry) = dual_head();
    registry.devices()?;
    driver.set_native_primary(&DeviceId::new("RIGHT"));

    assert_eq!(registry.primary_device()?.unwrap().id().as_str(), "LEFT");
    registry.refresh()?;
    assert_eq!(registry.primary_device()?.unwrap().id().as_str(), "RIGHT");
    Ok(())
}

#[test_log::test]
fn it_should_follow_out_of_band_changes_on_every_query_when_configured() -> Result<()> {
    let (driver, registry) = registry_with(
        &[
            display("LEFT", Rect::new(0, 0, 1920, 1080), true),
            display("RIGHT", Rect::new(1920, 0, 1920, 1080), false),
        ],
        RegistryConfig {
            primary_resync: PrimaryResync::EveryQuery,
            ..RegistryConfig::default()
        },
    );
    let left = registry.get_device(0)?.unwrap();
    assert!(left.is_primary());

    driver.set_native_primary(&DeviceId::new("RIGHT"));
    let right = registry.get_device(1)?.unwrap();
    assert!(right.is_primary());
    assert!(!left.is_primary());
    Ok(())
}

#[test_log::test]
fn it_should_find_the_device_containing_a_point() -> Result<()> {
    let (_driver, registry) = dual_head();
    assert_eq!(
        registry.find_device_containing_point(10, 10)?.unwrap().id().as_str(),
        "LEFT"
    );
    assert_eq!(
        registry.find_device_containing_point(1920, 500)?.unwrap().id().as_str(),
        "RIGHT"
    );
    assert!(registry.find_device_containing_point(5000, 0)?.is_none());
    assert!(registry.find_device_containing_point(-1, 0)?.is_none());
    Ok(())
}

#[test_log::test]
fn it_should_only_probe_the_configured_number_of_indices() -> Result<()> {
    let (_driver, registry) = registry_with(
        &[
            display("A", Rect::new(0, 0, 100, 100), true),
            display("B", Rect::new(100, 0, 100, 100), false),
        ],
        RegistryConfig {
            max_point_search: 1,
            ..RegistryConfig::default()
        },
    );
    assert!(registry.find_device_containing_point(50, 50)?.is_some());
    assert!(registry.find_device_containing_point(150, 50)?.is_none());
    Ok(())
}

#[test_log::test]
fn it_should_pick_the_device_with_the_largest_overlap() -> Result<()> {
    let (_driver, registry) = dual_head();
    let window = Rect::new(1800, 100, 800, 600);
    assert_eq!(
        registry
            .find_device_with_largest_overlap(window)?
            .unwrap()
            .id()
            .as_str(),
        "RIGHT"
    );
    assert!(registry
        .find_device_with_largest_overlap(Rect::new(-500, -500, 100, 100))?
        .is_none());
    Ok(())
}

#[test_log::test]
fn it_should_break_overlap_ties_by_enumeration_order() -> Result<()> {
    let (_driver, registry) = registry_with(
        &[
            display("A", Rect::new(0, 0, 100, 100), false),
            display("B", Rect::new(100, 0, 100, 100), true),
        ],
        RegistryConfig::default(),
    );
    let straddling = Rect::new(50, 0, 100, 100);
    assert_eq!(
        registry
            .find_device_with_largest_overlap(straddling)?
            .unwrap()
            .id()
            .as_str(),
        "A"
    );
    Ok(())
}

#[test_log::test]
fn it_should_prefer_the_larger_overlap_over_enumeration_order() -> Result<()> {
    let (_driver, registry) = registry_with(
        &[
            display("A", Rect::new(0, 0, 100, 100), true),
            display("B", Rect::new(50, 50, 200, 200), false),
        ],
        RegistryConfig::default(),
    );
    let query = Rect::new(40, 40, 80, 80);
    assert_eq!(Rect::new(0, 0, 100, 100).intersection(&query).unwrap().area(), 3600);
    assert_eq!(Rect::new(50, 50, 200, 200).intersection(&query).unwrap().area(), 4900);
    assert_eq!(
        registry
            .find_device_with_largest_overlap(query)?
            .unwrap()
            .id()
            .as_str(),
        "B"
    );
    Ok(())
}

#[test_log::test]
fn it_should_surface_enumeration_failures() {
    let (driver, registry) = dual_head();
    driver.set_fail_enumeration(true);
    assert!(matches!(
        registry.devices(),
        Err(DisplayError::PlatformQueryFailed(_))
    ));
    assert!(registry.get_device(0).is_err());
    assert!(registry.find_device_containing_point(0, 0).is_err());
    assert!(registry.find_device_with_largest_overlap(Rect::new(0, 0, 10, 10)).is_err());
    assert!(registry.refresh().is_err());
}

#[test_log::test]
fn it_should_keep_exactly_one_primary_under_concurrent_setters() -> Result<()> {
    let (_driver, registry) = registry_with(
        &[
            display("A", Rect::new(0, 0, 100, 100), true),
            display("B", Rect::new(100, 0, 100, 100), false),
            display("C", Rect::new(200, 0, 100, 100), false),
            display("D", Rect::new(300, 0, 100, 100), false),
        ],
        RegistryConfig::default(),
    );
    let devices = registry.devices()?;

    std::thread::scope(|scope| {
        for device in &devices {
            let registry = &registry;
            scope.spawn(move || {
                for _ in 0..200 {
                    registry.set_primary(device.id()).unwrap();
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..200 {
                let primary = registry.primary_id();
                assert!(primary.is_some());
                assert!(devices.iter().any(|d| Some(d.id()) == primary.as_ref()));
            }
        });
    });

    assert_eq!(devices.iter().filter(|d| d.is_primary()).count(), 1);
    Ok(())
}
