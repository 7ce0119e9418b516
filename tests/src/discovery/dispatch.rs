use std::time::Duration;

use camfleet_common::device::{
    Device, NetworkInterface, NetworkInterfaces, NetworkProtocol, NetworkProtocols, PtzVelocity,
    VideoEncoderConfig, VideoEncoding,
};
use camfleet_common::error::{DeviceError, ManagerError};
use camfleet_core::Command;

use crate::support::{camera, events_until_end, fleet};

#[tokio::test]
async fn dispatch_to_missing_endpoint_on_empty_fleet() {
    let (manager, factory) = fleet(Vec::new(), Duration::ZERO);

    let result = manager.dispatch("ep-missing", Command::Reboot).await;

    assert!(matches!(result, Err(ManagerError::UnknownDevice(ref address)) if address == "ep-missing"));
    assert_eq!(factory.opened(), 0);
    assert!(manager.devices().await.is_empty());
}

#[tokio::test]
async fn every_command_is_routed_to_the_device() {
    let (manager, factory) = fleet(vec![camera("urn:uuid:cam-1", "10.0.0.5")], Duration::ZERO);
    let mut rx = manager.subscribe();
    let generation = manager.start_discovery().await.unwrap();
    events_until_end(&mut rx, generation).await.unwrap();

    let video = VideoEncoderConfig {
        token: "enc_1".into(),
        name: "Main".into(),
        encoding: VideoEncoding::H264,
        width: 1920,
        height: 1080,
        quality: 4.0,
        frame_rate_limit: 25,
        bitrate_limit_kbps: 4096,
        gov_length: 50,
    };
    let interfaces = NetworkInterfaces {
        interfaces: vec![NetworkInterface {
            token: "eth0".into(),
            enabled: true,
            dhcp: false,
            address: Some("10.0.0.5".parse().unwrap()),
            prefix_length: 24,
        }],
    };
    let protocols = NetworkProtocols {
        protocols: vec![NetworkProtocol {
            name: "RTSP".into(),
            enabled: true,
            ports: vec![554],
        }],
    };

    let commands = vec![
        Command::RefreshCapabilities,
        Command::RefreshInformation,
        Command::RefreshScopes,
        Command::RefreshVideoConfigs,
        Command::RefreshStreamUris,
        Command::RefreshVideoConfigOptions,
        Command::RefreshProfiles,
        Command::RefreshInterfaces,
        Command::RefreshProtocols,
        Command::RefreshUsers,
        Command::RefreshPtzConfigs,
        Command::SetScopes {
            name: "Gate".into(),
            location: "North".into(),
        },
        Command::ResetFactory,
        Command::Reboot,
        Command::SetVideoConfig(video.clone()),
        Command::SetInterfaces(interfaces.clone()),
        Command::SetProtocols(protocols.clone()),
        Command::ContinuousMove(PtzVelocity::new(0.2, 0.2, 0.0)),
        Command::StopMovement,
    ];
    let expected: Vec<&str> = commands.iter().map(Command::name).collect();

    for command in commands {
        manager.dispatch("urn:uuid:cam-1", command).await.unwrap();
    }

    let device = factory.device("urn:uuid:cam-1").unwrap();
    assert_eq!(device.calls(), expected);
    assert!(!device.is_moving());

    let state = device.state();
    assert_eq!(state.video_configs, vec![video]);
    assert_eq!(state.interfaces, Some(interfaces));
    assert_eq!(state.protocols, Some(protocols));
}

#[tokio::test]
async fn failing_device_stays_registered() {
    let (manager, factory) = fleet(
        vec![
            camera("urn:uuid:cam-1", "10.0.0.5"),
            camera("urn:uuid:cam-2", "10.0.0.6"),
        ],
        Duration::ZERO,
    );
    factory.fail_endpoint("urn:uuid:cam-1", DeviceError::Rejected("not authorized".into()));
    let mut rx = manager.subscribe();
    let generation = manager.start_discovery().await.unwrap();
    events_until_end(&mut rx, generation).await.unwrap();

    let failed = manager.dispatch("urn:uuid:cam-1", Command::RefreshUsers).await;
    let healthy = manager.dispatch("urn:uuid:cam-2", Command::RefreshUsers).await;

    assert!(matches!(failed, Err(ManagerError::Device(DeviceError::Rejected(_)))));
    assert!(healthy.is_ok());
    assert_eq!(manager.device_count().await, 2);
}

/// Commands issued while a cycle is still running either reach the device or report
/// it unknown; they never observe a half-built registry.
#[tokio::test]
async fn dispatch_during_discovery_is_safe() {
    let records = (1..=5)
        .map(|n| camera(&format!("urn:uuid:cam-{n}"), &format!("10.0.0.{n}")))
        .collect();
    let (manager, _factory) = fleet(records, Duration::from_millis(5));
    let mut rx = manager.subscribe();
    let generation = manager.start_discovery().await.unwrap();

    let worker = {
        let manager = manager.clone();
        tokio::spawn(async move {
            let mut outcomes = Vec::new();
            for _ in 0..20 {
                outcomes.push(manager.dispatch("urn:uuid:cam-5", Command::RefreshProfiles).await);
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            outcomes
        })
    };

    events_until_end(&mut rx, generation).await.unwrap();
    let outcomes = worker.await.unwrap();

    assert!(outcomes
        .iter()
        .all(|outcome| matches!(outcome, Ok(_) | Err(ManagerError::UnknownDevice(_)))));
    assert!(manager.dispatch("urn:uuid:cam-5", Command::RefreshProfiles).await.is_ok());
}
