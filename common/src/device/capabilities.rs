use std::net::IpAddr;
use std::time::SystemTime;

/// Clock settings reported or accepted by a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDateTime {
    pub utc: SystemTime,
    /// POSIX TZ string, e.g. `CET-1CEST,M3.5.0,M10.5.0/3`.
    pub time_zone: String,
    pub daylight_savings: bool,
    pub from_ntp: bool,
}

impl DeviceDateTime {
    pub fn manual(utc: SystemTime) -> Self {
        Self {
            utc,
            time_zone: String::from("UTC0"),
            daylight_savings: false,
            from_ntp: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInformation {
    pub manufacturer: String,
    pub model: String,
    pub firmware_version: String,
    pub serial_number: String,
    pub hardware_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEncoding {
    Jpeg,
    Mpeg4,
    H264,
    H265,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoEncoderConfig {
    pub token: String,
    pub name: String,
    pub encoding: VideoEncoding,
    pub width: u32,
    pub height: u32,
    pub quality: f32,
    pub frame_rate_limit: u32,
    pub bitrate_limit_kbps: u32,
    pub gov_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub token: String,
    pub enabled: bool,
    pub dhcp: bool,
    pub address: Option<IpAddr>,
    pub prefix_length: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInterfaces {
    pub interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProtocol {
    /// `HTTP`, `HTTPS` or `RTSP`.
    pub name: String,
    pub enabled: bool,
    pub ports: Vec<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkProtocols {
    pub protocols: Vec<NetworkProtocol>,
}

/// Pan/tilt/zoom speed for continuous moves, each axis in `-1.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PtzVelocity {
    pub pan: f32,
    pub tilt: f32,
    pub zoom: f32,
}

impl PtzVelocity {
    pub fn new(pan: f32, tilt: f32, zoom: f32) -> Self {
        Self {
            pan: pan.clamp(-1.0, 1.0),
            tilt: tilt.clamp(-1.0, 1.0),
            zoom: zoom.clamp(-1.0, 1.0),
        }
    }

    pub fn is_still(&self) -> bool {
        self.pan == 0.0 && self.tilt == 0.0 && self.zoom == 0.0
    }
}

/// Capability data a device has cached so far. Empty until the matching refresh ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    pub information: Option<DeviceInformation>,
    pub scopes: Vec<String>,
    pub profiles: Vec<String>,
    pub stream_uris: Vec<String>,
    pub video_configs: Vec<VideoEncoderConfig>,
    pub interfaces: Option<NetworkInterfaces>,
    pub protocols: Option<NetworkProtocols>,
    pub users: Vec<String>,
    pub ptz_supported: Option<bool>,
}
