use serde::{Deserialize, Serialize};

use crate::DeviceId;

/// Response of `GET /devices`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: DeviceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: serde_json::Value,
}

/// Body of `POST /devices/add`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddRequest {
    pub name: String,
    pub device_id: DeviceId,
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub password: String,
}

impl DeviceList {
    pub fn ids(&self) -> Vec<DeviceId> {
        self.devices
            .iter()
            .map(|device| device.device_id.clone())
            .collect()
    }
}
