use serde::{Deserialize, Serialize};

use crate::{DeviceId, RelaySlot};

/// Body of `POST /power/configure`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureRequest {
    pub device_id: DeviceId,
    pub power_config: Vec<PowerRating>,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PowerRating {
    pub relay: RelaySlot,
    pub power_rating: f64,
}
