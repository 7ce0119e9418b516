use std::collections::HashSet;
use std::time::Duration;

use camfleet_common::credentials::Credentials;
use camfleet_common::device::Device;
use camfleet_common::discovery::{DiscoveryRecord, keys};
use camfleet_core::FleetEvent;
use tokio::time::timeout;

use crate::support::{WAIT, camera, events_until_end, fleet};

/// Repeated probe answers for the same endpoint collapse into a single device.
#[tokio::test]
async fn duplicate_answers_admit_one_device_per_endpoint() {
    let records = vec![
        camera("urn:uuid:cam-1", "10.0.0.5"),
        camera("urn:uuid:cam-2", "10.0.0.6"),
        camera("urn:uuid:cam-1", "10.0.0.5"),
        camera("urn:uuid:cam-3", "10.0.0.7"),
        camera("urn:uuid:cam-2", "10.0.0.6"),
        camera("urn:uuid:cam-1", "10.0.0.5"),
    ];
    let (manager, factory) = fleet(records, Duration::ZERO);
    let mut rx = manager.subscribe();

    let generation = manager.start_discovery().await.unwrap();
    let events = events_until_end(&mut rx, generation).await.unwrap();

    let found: Vec<String> = events
        .iter()
        .filter_map(|event| match event {
            FleetEvent::DeviceFound { device, .. } => Some(device.endpoint_address().to_string()),
            _ => None,
        })
        .collect();
    let distinct: HashSet<&String> = found.iter().collect();

    assert_eq!(found.len(), 3, "one notification per endpoint: {found:?}");
    assert_eq!(distinct.len(), 3);
    assert_eq!(manager.device_count().await, 3);
    assert_eq!(factory.opened(), 3);
}

/// The end of a cycle is only announced after every record of that cycle was admitted.
#[tokio::test]
async fn end_of_cycle_follows_all_admissions() {
    let records: Vec<DiscoveryRecord> = (1..=8)
        .map(|n| camera(&format!("urn:uuid:cam-{n}"), &format!("10.0.0.{n}")))
        .collect();
    let (manager, _factory) = fleet(records, Duration::from_millis(2));
    let mut rx = manager.subscribe();

    let generation = manager.start_discovery().await.unwrap();
    let events = events_until_end(&mut rx, generation).await.unwrap();

    let (last, admissions) = events.split_last().unwrap();
    assert!(matches!(
        last,
        FleetEvent::DiscoveryEnded { devices: 8, .. }
    ));
    assert_eq!(admissions.len(), 8);
    assert!(admissions
        .iter()
        .all(|event| matches!(event, FleetEvent::DeviceFound { .. })));
}

/// Malformed answers are dropped without disturbing the rest of the cycle.
#[tokio::test]
async fn records_without_endpoint_are_ignored() {
    let mut nameless = camera("", "10.0.0.9");
    nameless.insert(keys::ENDPOINT_ADDRESS, "  ");
    let records = vec![
        nameless,
        DiscoveryRecord::new(),
        camera("urn:uuid:cam-1", "10.0.0.5"),
    ];
    let (manager, factory) = fleet(records, Duration::ZERO);
    let mut rx = manager.subscribe();

    let generation = manager.start_discovery().await.unwrap();
    events_until_end(&mut rx, generation).await.unwrap();

    assert_eq!(manager.device_count().await, 1);
    assert_eq!(factory.opened(), 1);
    assert!(manager.exists("urn:uuid:cam-1").await);
}

/// Changing credentials mid-cycle drops every device and ignores the old cycle's
/// stragglers; the fleet is rebuilt with the new credentials.
#[tokio::test]
async fn credential_change_rebuilds_the_fleet() {
    let records: Vec<DiscoveryRecord> = (1..=6)
        .map(|n| camera(&format!("urn:uuid:cam-{n}"), &format!("10.0.0.{n}")))
        .collect();
    let (manager, factory) = fleet(records, Duration::from_millis(15));
    let mut rx = manager.subscribe();

    let first = manager.start_discovery().await.unwrap();
    loop {
        let event = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        if matches!(event, FleetEvent::DeviceFound { generation, .. } if generation == first) {
            break;
        }
    }

    let second = manager
        .set_credentials(Credentials::new("u2", "p2"))
        .await
        .unwrap();
    assert!(manager.lookup("urn:uuid:cam-1").await.is_none());

    events_until_end(&mut rx, second).await.unwrap();

    let old: Vec<_> = factory
        .devices()
        .into_iter()
        .filter(|device| device.credentials().username() == "admin")
        .collect();
    assert!(!old.is_empty());
    assert!(old.iter().all(|device| device.is_disposed()));

    assert_eq!(manager.device_count().await, 6);
    for (address, _) in manager.devices().await {
        let device = factory.device(&address).unwrap();
        assert_eq!(device.credentials(), &Credentials::new("u2", "p2"));
        assert!(!device.is_disposed());
    }
}

/// Restarting discovery twice in a row leaves only the newest cycle's devices.
#[tokio::test]
async fn restart_supersedes_the_running_cycle() {
    let records = vec![
        camera("urn:uuid:cam-1", "10.0.0.5"),
        camera("urn:uuid:cam-2", "10.0.0.6"),
    ];
    let (manager, _factory) = fleet(records, Duration::from_millis(5));
    let mut rx = manager.subscribe();

    let first = manager.start_discovery().await.unwrap();
    let second = manager.start_discovery().await.unwrap();
    assert!(second > first);

    let events = events_until_end(&mut rx, second).await.unwrap();

    assert!(events
        .iter()
        .all(|event| !matches!(event, FleetEvent::DiscoveryEnded { generation, .. } if *generation == first)));
    assert_eq!(manager.generation().await, second);
    assert_eq!(manager.device_count().await, 2);
}
