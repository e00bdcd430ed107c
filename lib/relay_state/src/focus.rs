use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use iot_backend::DeviceService;
use log::{debug, trace};
use transport::DeviceId;

use crate::{normalize, Error, Poller, RateCell, Result, StateStore};

pub const FOCUS_POLLER: &str = "focus";

/// Telemetry polling of the single device currently open for control.
pub struct FocusPoller {
    service: Arc<dyn DeviceService>,
    store: Arc<StateStore>,
    rate: Arc<RateCell>,
    poller: Arc<Poller>,
    period: Duration,
    focused: Mutex<Option<DeviceId>>,
}

impl FocusPoller {
    pub fn new(
        service: Arc<dyn DeviceService>,
        store: Arc<StateStore>,
        rate: Arc<RateCell>,
        poller: Arc<Poller>,
        period: Duration,
    ) -> Self {
        Self {
            service,
            store,
            rate,
            poller,
            period,
            focused: Mutex::new(None),
        }
    }

    /// Moves focus to `device_id`. Polling of the previous device is stopped
    /// before polling of the new one starts.
    pub fn focus(&self, device_id: DeviceId) -> Result<()> {
        let mut focused = self.lock();

        if let Some(previous) = focused.take() {
            debug!("unfocusing {previous}");
        }
        self.poller.stop(FOCUS_POLLER);

        let service = self.service.clone();
        let store = self.store.clone();
        let rate = self.rate.clone();
        let id = device_id.clone();

        self.poller.start(FOCUS_POLLER, self.period, move || {
            poll(service.clone(), store.clone(), rate.clone(), id.clone())
        })?;

        debug!("focusing {device_id}");
        *focused = Some(device_id);

        Ok(())
    }

    /// Stops polling. Telemetry already fetched stays in the store.
    pub fn clear(&self) -> Option<DeviceId> {
        let mut focused = self.lock();
        self.poller.stop(FOCUS_POLLER);

        let previous = focused.take();
        if let Some(device_id) = &previous {
            debug!("unfocusing {device_id}");
        }

        previous
    }

    pub fn focused(&self) -> Option<DeviceId> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<DeviceId>> {
        self.focused.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn poll(
    service: Arc<dyn DeviceService>,
    store: Arc<StateStore>,
    rate: Arc<RateCell>,
    device_id: DeviceId,
) -> Result<()> {
    let status = service
        .device_status(&device_id)
        .await
        .map_err(|source| Error::Status {
            device_id: device_id.clone(),
            source,
        })?;

    let telemetry = normalize::telemetry(&status, rate.price());
    trace!("{device_id} telemetry {:?}", telemetry);

    store.replace_all_telemetry(&device_id, telemetry);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeService, Recorder};
    use crate::{ElectricityRate, RelayFlags};
    use serde_json::json;
    use transport::RelaySlot::*;

    struct Fixture {
        service: Arc<FakeService>,
        store: Arc<StateStore>,
        focus: FocusPoller,
    }

    fn fixture() -> Fixture {
        let service = Arc::new(FakeService::default());
        let recorder = Arc::new(Recorder::default());
        let store = Arc::new(StateStore::new(recorder.clone()));
        let rate = Arc::new(RateCell::new(ElectricityRate {
            rate_per_unit: 8.0,
            currency: "INR".to_string(),
        }));
        let poller = Arc::new(Poller::new(recorder));
        let focus = FocusPoller::new(
            service.clone(),
            store.clone(),
            rate,
            poller,
            Duration::from_millis(1000),
        );

        Fixture {
            service,
            store,
            focus,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_replaces_telemetry_only() {
        let f = fixture();
        let id = DeviceId::new("esp-1");
        f.store
            .merge_relay_booleans(&id, RelayFlags::single(Relay2, true));
        f.service.set_status(
            "esp-1",
            json!({
                "relays": { "relay2": false },
                "powerInfo": {
                    "relay1": { "powerRating": 60, "cumulativeEnergy": 1500, "pricePerKWh": 10 },
                    "relay3": { "energyConsumed": 5.5 },
                }
            }),
        );

        f.focus.focus(id.clone()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let device = f.store.device(&id).unwrap();
        assert!(device.is_on(Relay2));

        let one = device.telemetry_or_default(Relay1);
        assert_eq!(one.power_rating_watts, 60.0);
        assert!((one.cost() - 15.0).abs() < 1e-9);

        let three = device.telemetry_or_default(Relay3);
        assert_eq!(three.energy_wh, 5.5);
        assert_eq!(three.price_per_kwh, 8.0);

        let four = device.telemetry_or_default(Relay4);
        assert_eq!(four.power_rating_watts, 0.0);
        assert_eq!(four.cost(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_focus_stops_previous_device() {
        let f = fixture();
        f.service.set_status("esp-1", json!({}));
        f.service.set_status("esp-2", json!({}));

        f.focus.focus(DeviceId::new("esp-1")).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        f.focus.focus(DeviceId::new("esp-2")).unwrap();
        tokio::time::sleep(Duration::from_millis(1900)).await;

        assert_eq!(f.service.status_calls("esp-1"), 2);
        assert_eq!(f.service.status_calls("esp-2"), 2);
        assert_eq!(f.focus.focused(), Some(DeviceId::new("esp-2")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_keeps_telemetry() {
        let f = fixture();
        let id = DeviceId::new("esp-1");
        f.service.set_status(
            "esp-1",
            json!({ "powerInfo": { "relay1": { "powerRating": 40 } } }),
        );

        f.focus.focus(id.clone()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(f.focus.clear(), Some(id.clone()));
        assert_eq!(f.focus.clear(), None);
        tokio::time::sleep(Duration::from_millis(5000)).await;

        assert_eq!(f.service.status_calls("esp-1"), 1);
        assert_eq!(
            f.store.telemetry(&id, Relay1).map(|t| t.power_rating_watts),
            Some(40.0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_is_applied_after_clear() {
        let f = fixture();
        let id = DeviceId::new("esp-1");
        f.service.set_status(
            "esp-1",
            json!({ "powerInfo": { "relay2": { "powerRating": 75 } } }),
        );
        f.service.delay_status("esp-1", Duration::from_millis(3000));

        f.focus.focus(id.clone()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        f.focus.clear();

        assert_eq!(f.store.device(&id), None);
        tokio::time::sleep(Duration::from_millis(3000)).await;

        assert_eq!(
            f.store.telemetry(&id, Relay2).map(|t| t.power_rating_watts),
            Some(75.0)
        );
    }
}
