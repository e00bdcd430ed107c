use std::sync::Arc;
use std::time::Duration;

use iot_backend::DeviceService;
use log::{debug, info, warn};
use transport::devices::{AddRequest, Device};
use transport::{DeviceId, RelaySlot};

use crate::fleet::refresh_relays;
use crate::{
    ControlCoordinator, ElectricityRate, Error, FleetPoller, FocusPoller, Observer, Poller,
    RateCell, Result, StateStore,
};

pub const RATE_POLLER: &str = "rate";

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub fleet_interval: Duration,
    pub focus_interval: Duration,
    /// `None` disables periodic rate refresh.
    pub rate_interval: Option<Duration>,
    pub default_rate: ElectricityRate,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            fleet_interval: Duration::from_millis(5000),
            focus_interval: Duration::from_millis(5000),
            rate_interval: Some(Duration::from_millis(60_000)),
            default_rate: ElectricityRate::default(),
        }
    }
}

/// Everything one signed-in client needs: the store, the rate, the pollers
/// and the control coordinator, created together and torn down together.
pub struct Session {
    service: Arc<dyn DeviceService>,
    store: Arc<StateStore>,
    rate: Arc<RateCell>,
    poller: Arc<Poller>,
    fleet: FleetPoller,
    focus: FocusPoller,
    control: ControlCoordinator,
    rate_interval: Option<Duration>,
}

impl Session {
    pub fn new(
        service: Arc<dyn DeviceService>,
        observer: Arc<dyn Observer>,
        config: SessionConfig,
    ) -> Self {
        let store = Arc::new(StateStore::new(observer.clone()));
        let rate = Arc::new(RateCell::new(config.default_rate));
        let poller = Arc::new(Poller::new(observer));

        let fleet = FleetPoller::new(
            service.clone(),
            store.clone(),
            poller.clone(),
            config.fleet_interval,
        );
        let focus = FocusPoller::new(
            service.clone(),
            store.clone(),
            rate.clone(),
            poller.clone(),
            config.focus_interval,
        );
        let control = ControlCoordinator::new(service.clone(), store.clone());

        Session {
            service,
            store,
            rate,
            poller,
            fleet,
            focus,
            control,
            rate_interval: config.rate_interval,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn rate(&self) -> ElectricityRate {
        self.rate.get()
    }

    /// Fetches the device list, forgets devices that are no longer listed and
    /// restarts fleet polling with the new list. Fleet polling stops when the
    /// list cannot be fetched.
    ///
    /// Listed devices only appear in the store once their first status fetch
    /// succeeds.
    pub async fn load_devices(&self) -> Result<Vec<Device>> {
        let devices = match self.service.devices().await {
            Ok(devices) => devices,
            Err(err) => {
                warn!("unable to load devices: {err}");
                self.fleet.stop();
                return Err(err.into());
            }
        };

        let ids = devices
            .iter()
            .map(|device| device.device_id.clone())
            .collect::<Vec<_>>();

        let forgotten = self.store.retain(&ids);
        if !forgotten.is_empty() {
            debug!("forgot {} device(s)", forgotten.len());
        }

        self.store.track(&ids);

        info!("loaded {} device(s)", ids.len());
        self.fleet.start(ids)?;

        Ok(devices)
    }

    /// Opens `device_id` for control: starts telemetry polling and refreshes
    /// its relays once.
    ///
    /// An error from the one-shot refresh leaves the device focused and its
    /// telemetry poller running.
    pub async fn focus(&self, device_id: &DeviceId) -> Result<()> {
        self.store.track(std::slice::from_ref(device_id));
        self.focus.focus(device_id.clone())?;

        self.refresh_device(device_id).await
    }

    pub fn clear_focus(&self) -> Option<DeviceId> {
        self.focus.clear()
    }

    pub fn focused(&self) -> Option<DeviceId> {
        self.focus.focused()
    }

    /// One-shot relay refresh, outside of any poller.
    pub async fn refresh_device(&self, device_id: &DeviceId) -> Result<()> {
        refresh_relays(self.service.as_ref(), &self.store, device_id).await
    }

    /// Fetches the current electricity rate once. Returns whether it changed.
    pub async fn refresh_rate(&self) -> Result<bool> {
        fetch_rate(self.service.as_ref(), &self.rate).await
    }

    /// Starts periodic rate refresh unless it is disabled.
    pub fn start_rate_refresh(&self) -> Result<()> {
        let Some(period) = self.rate_interval else {
            debug!("rate refresh disabled");
            return Ok(());
        };

        let service = self.service.clone();
        let rate = self.rate.clone();

        self.poller.start(RATE_POLLER, period, move || {
            let service = service.clone();
            let rate = rate.clone();
            async move { fetch_rate(service.as_ref(), &rate).await.map(|_| ()) }
        })
    }

    pub async fn set_relay(&self, device_id: &DeviceId, slot: RelaySlot, on: bool) -> Result<bool> {
        self.control.set_relay(device_id, slot, on).await
    }

    pub async fn set_all_relays(&self, device_id: &DeviceId, on: bool) -> Result<()> {
        self.control.set_all_relays(device_id, on).await
    }

    pub async fn configure_power(
        &self,
        device_id: &DeviceId,
        ratings: &[(RelaySlot, f64)],
    ) -> Result<()> {
        self.control.configure_power(device_id, ratings).await
    }

    /// Registers a device on the backend and reloads the device list.
    pub async fn add_device(&self, device: &AddRequest) -> Result<Vec<Device>> {
        if device.name.trim().is_empty() {
            return Err(Error::MissingField("name"));
        }
        if device.device_id.as_str().trim().is_empty() {
            return Err(Error::MissingField("device id"));
        }

        self.service.add_device(device).await?;
        info!("added {} ({})", device.device_id, device.name);

        self.load_devices().await
    }

    /// Deletes `device_id` on the backend, then drops it locally and reloads
    /// the device list.
    pub async fn delete_device(&self, device_id: &DeviceId) -> Result<()> {
        self.service.delete_device(device_id).await?;
        info!("deleted {device_id}");

        if self.focus.focused().as_ref() == Some(device_id) {
            self.focus.clear();
        }
        self.store.remove_device(device_id);

        self.load_devices().await.map(|_| ())
    }

    /// Stops every poller and forgets all state.
    pub fn shutdown(&self) {
        self.focus.clear();
        self.fleet.stop();
        self.poller.stop_all();
        self.store.clear();

        debug!("session closed");
    }
}

async fn fetch_rate(service: &dyn DeviceService, rate: &RateCell) -> Result<bool> {
    match service.current_rate().await? {
        Some(current) => Ok(rate.apply(&current)),
        None => {
            debug!("backend has no current rate");
            Ok(false)
        }
    }
}
