mod device_id;
pub use device_id::DeviceId;

mod relay_slot;
pub use relay_slot::RelaySlot;

pub mod control;
pub mod devices;
pub mod power;
pub mod rate;

use serde::Deserialize;

/// Body the backend attaches to rejected requests.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
