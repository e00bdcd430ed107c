use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use iot_backend::DeviceService;
use log::{debug, error, trace};
use transport::DeviceId;

use crate::{normalize, Error, Observer, Poller, Result, StateStore};

pub const FLEET_POLLER: &str = "fleet";

/// Keeps the relay flags of every listed device in sync.
pub struct FleetPoller {
    service: Arc<dyn DeviceService>,
    store: Arc<StateStore>,
    poller: Arc<Poller>,
    period: Duration,
}

impl FleetPoller {
    pub fn new(
        service: Arc<dyn DeviceService>,
        store: Arc<StateStore>,
        poller: Arc<Poller>,
        period: Duration,
    ) -> Self {
        Self {
            service,
            store,
            poller,
            period,
        }
    }

    /// Replaces the polled device list. An empty list only stops polling.
    pub fn start(&self, devices: Vec<DeviceId>) -> Result<()> {
        self.poller.stop(FLEET_POLLER);

        if devices.is_empty() {
            debug!("no devices to poll");
            return Ok(());
        }

        debug!("polling {} device(s)", devices.len());

        let devices: Arc<[DeviceId]> = devices.into();
        let service = self.service.clone();
        let store = self.store.clone();
        let observer = self.poller.observer();

        self.poller.start(FLEET_POLLER, self.period, move || {
            poll(
                service.clone(),
                store.clone(),
                observer.clone(),
                devices.clone(),
            )
        })
    }

    pub fn stop(&self) {
        self.poller.stop(FLEET_POLLER);
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running(FLEET_POLLER)
    }
}

/// One fleet tick. Every device is fetched concurrently and a failing device
/// is reported as soon as it fails, even while other devices are still
/// pending.
async fn poll(
    service: Arc<dyn DeviceService>,
    store: Arc<StateStore>,
    observer: Arc<dyn Observer>,
    devices: Arc<[DeviceId]>,
) -> Result<()> {
    let refreshes = devices.iter().map(|device_id| {
        let (service, store, observer) = (&service, &store, &observer);

        async move {
            if let Err(err) = refresh_relays(service.as_ref(), store, device_id).await {
                error!("[{FLEET_POLLER}] {err}");
                observer.poll_failed(FLEET_POLLER, &err);
            }
        }
    });

    join_all(refreshes).await;

    Ok(())
}

/// Fetches the status of `device_id` and merges whatever relays it reports.
pub(crate) async fn refresh_relays(
    service: &dyn DeviceService,
    store: &StateStore,
    device_id: &DeviceId,
) -> Result<()> {
    let status = service
        .device_status(device_id)
        .await
        .map_err(|source| Error::Status {
            device_id: device_id.clone(),
            source,
        })?;

    let flags = normalize::relay_flags(&status);

    if flags.is_empty() {
        trace!("{device_id} reported no relays");
    } else {
        trace!("{device_id} reported {:?}", flags);
    }

    store.merge_relay_booleans(device_id, flags);

    Ok(())
}
