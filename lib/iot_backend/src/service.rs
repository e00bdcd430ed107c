use crate::Result;

use async_trait::async_trait;
use serde_json::Value;
use transport::devices::{AddRequest, Device};
use transport::power::PowerRating;
use transport::rate::Rate;
use transport::{DeviceId, RelaySlot};

/// Request/response contract of the IoT backend as seen by the polling engine.
///
/// Status and control responses are returned as raw JSON: the backend has
/// shipped several shapes for them over time and the engine normalizes them
/// itself.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait DeviceService: Send + Sync {
    /// `GET /devices`
    async fn devices(&self) -> Result<Vec<Device>>;

    /// `GET /devices/{id}/status`
    async fn device_status(&self, device_id: &DeviceId) -> Result<Value>;

    /// `POST /devices/{id}/control`
    async fn control(&self, device_id: &DeviceId, relay: RelaySlot, state: bool) -> Result<Value>;

    /// `POST /devices/add`
    async fn add_device(&self, device: &AddRequest) -> Result<()>;

    /// `DELETE /devices/{id}`
    async fn delete_device(&self, device_id: &DeviceId) -> Result<()>;

    /// `GET /power/rate/current`
    async fn current_rate(&self) -> Result<Option<Rate>>;

    /// `POST /power/configure`
    async fn configure_power(&self, device_id: &DeviceId, ratings: &[PowerRating]) -> Result<()>;
}
