mod error;
pub use error::{Error, FailureKind};

mod response;
use response::{parse_json, parse_void};

use std::sync::Arc;

use async_trait::async_trait;
use chipp_http::{HttpClient, HttpMethod, NoInterceptor, Request};
use log::{debug, trace};
use serde_json::Value;
use transport::control::Request as ControlRequest;
use transport::devices::{AddRequest, Device, DeviceList};
use transport::power::{ConfigureRequest, PowerRating};
use transport::rate::{CurrentRate, Rate};
use transport::{DeviceId, RelaySlot};

use crate::{DeviceService, Result};

/// Authenticated client of the IoT backend REST API.
#[derive(Clone)]
pub struct Client {
    http_client: Arc<HttpClient<NoInterceptor>>,
    token: String,
}

impl Client {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let http_client = HttpClient::new(base_url)?;

        Ok(Self {
            http_client: Arc::new(http_client),
            token: token.into(),
        })
    }

    async fn perform(&self, mut request: Request) -> Result<(u32, Vec<u8>)> {
        request.add_header("Authorization", format!("Bearer {}", self.token));

        if let Some(body) = &request.body {
            trace!("request: {}", String::from_utf8_lossy(body));
        }

        let (status, body) = self
            .http_client
            .perform_request(request, |_, response| {
                Ok((u32::from(response.status_code), response.body))
            })
            .await?;

        trace!("response {status}: {}", String::from_utf8_lossy(&body));

        Ok((status, body))
    }
}

#[async_trait]
impl DeviceService for Client {
    async fn devices(&self) -> Result<Vec<Device>> {
        let mut request = self.http_client.new_request(["devices"]);
        request.set_method(HttpMethod::Get);

        let (status, body) = self.perform(request).await?;
        let list: DeviceList = parse_json::<Option<_>>(status, &body)?.unwrap_or_default();

        debug!("loaded {} devices", list.devices.len());

        Ok(list.devices)
    }

    async fn device_status(&self, device_id: &DeviceId) -> Result<Value> {
        let mut request = self
            .http_client
            .new_request(["devices", device_id.as_str(), "status"]);
        request.set_method(HttpMethod::Get);

        let (status, body) = self.perform(request).await?;
        parse_json(status, &body)
    }

    async fn control(&self, device_id: &DeviceId, relay: RelaySlot, state: bool) -> Result<Value> {
        let mut request = self
            .http_client
            .new_request(["devices", device_id.as_str(), "control"]);
        request.set_method(HttpMethod::Post);
        request.set_json_body(&ControlRequest::new(relay, state));

        debug!("switching {device_id}/{relay} to {state}");

        let (status, body) = self.perform(request).await?;
        parse_json(status, &body)
    }

    async fn add_device(&self, device: &AddRequest) -> Result<()> {
        let mut request = self.http_client.new_request(["devices", "add"]);
        request.set_method(HttpMethod::Post);
        request.set_json_body(device);

        debug!("adding {} ({})", device.device_id, device.name);

        let (status, body) = self.perform(request).await?;
        parse_void(status, &body)
    }

    async fn delete_device(&self, device_id: &DeviceId) -> Result<()> {
        let mut request = self.http_client.new_request(["devices", device_id.as_str()]);
        request.set_method(HttpMethod::Delete);

        let (status, body) = self.perform(request).await?;
        parse_void(status, &body)
    }

    async fn current_rate(&self) -> Result<Option<Rate>> {
        let mut request = self.http_client.new_request(["power", "rate", "current"]);
        request.set_method(HttpMethod::Get);

        let (status, body) = self.perform(request).await?;
        let current: Option<CurrentRate> = parse_json(status, &body)?;

        Ok(current.and_then(|current| current.rate))
    }

    async fn configure_power(&self, device_id: &DeviceId, ratings: &[PowerRating]) -> Result<()> {
        let mut request = self.http_client.new_request(["power", "configure"]);
        request.set_method(HttpMethod::Post);
        request.set_json_body(&ConfigureRequest {
            device_id: device_id.clone(),
            power_config: ratings.to_vec(),
        });

        let (status, body) = self.perform(request).await?;
        parse_void(status, &body)
    }
}
