use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use iot_backend::DeviceService;
use serde_json::{json, Value};
use transport::devices::{AddRequest, Device};
use transport::power::PowerRating;
use transport::rate::Rate;
use transport::{DeviceId, RelaySlot};

use crate::{Error, Observer, StateStore};

pub fn rejected(status: u32) -> iot_backend::Error {
    iot_backend::Error::Rejected {
        status,
        message: None,
    }
}

/// Scripted backend. Devices without a scripted status answer with 404.
#[derive(Default)]
pub struct FakeService {
    script: Mutex<Script>,
}

#[derive(Default)]
struct Script {
    devices: Vec<Device>,
    devices_fail: bool,
    statuses: HashMap<DeviceId, Value>,
    failing: HashSet<DeviceId>,
    hanging: HashSet<DeviceId>,
    delays: HashMap<DeviceId, Duration>,
    status_calls: HashMap<DeviceId, usize>,
    failing_relays: HashSet<RelaySlot>,
    controls: Vec<(DeviceId, RelaySlot, bool)>,
    added: Vec<AddRequest>,
    deleted: Vec<DeviceId>,
    rate: Option<Rate>,
    rate_calls: usize,
    configured: Vec<(DeviceId, Vec<PowerRating>)>,
}

impl FakeService {
    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn register(&self, id: &str, status: Value) {
        let mut script = self.script();
        script.devices.push(Device {
            device_id: DeviceId::new(id),
            name: id.to_uppercase(),
            status: Value::Null,
        });
        script.statuses.insert(DeviceId::new(id), status);
    }

    pub fn fail_devices(&self, fail: bool) {
        self.script().devices_fail = fail;
    }

    pub fn set_status(&self, id: &str, status: Value) {
        self.script().statuses.insert(DeviceId::new(id), status);
    }

    pub fn fail_status(&self, id: &str) {
        self.script().failing.insert(DeviceId::new(id));
    }

    pub fn hang_status(&self, id: &str) {
        self.script().hanging.insert(DeviceId::new(id));
    }

    pub fn delay_status(&self, id: &str, delay: Duration) {
        self.script().delays.insert(DeviceId::new(id), delay);
    }

    pub fn status_calls(&self, id: &str) -> usize {
        self.script()
            .status_calls
            .get(&DeviceId::new(id))
            .copied()
            .unwrap_or_default()
    }

    pub fn fail_relay(&self, slot: RelaySlot) {
        self.script().failing_relays.insert(slot);
    }

    pub fn controls(&self) -> Vec<(DeviceId, RelaySlot, bool)> {
        self.script().controls.clone()
    }

    pub fn added(&self) -> Vec<AddRequest> {
        self.script().added.clone()
    }

    pub fn deleted(&self) -> Vec<DeviceId> {
        self.script().deleted.clone()
    }

    pub fn set_rate(&self, rate: Rate) {
        self.script().rate = Some(rate);
    }

    pub fn rate_calls(&self) -> usize {
        self.script().rate_calls
    }

    pub fn configured(&self) -> Vec<(DeviceId, Vec<PowerRating>)> {
        self.script().configured.clone()
    }
}

#[async_trait]
impl DeviceService for FakeService {
    async fn devices(&self) -> iot_backend::Result<Vec<Device>> {
        let script = self.script();

        if script.devices_fail {
            Err(rejected(503))
        } else {
            Ok(script.devices.clone())
        }
    }

    async fn device_status(&self, device_id: &DeviceId) -> iot_backend::Result<Value> {
        let (outcome, delay, hang) = {
            let mut script = self.script();
            *script.status_calls.entry(device_id.clone()).or_default() += 1;

            let outcome = if script.failing.contains(device_id) {
                Err(rejected(500))
            } else {
                script.statuses.get(device_id).cloned().ok_or(rejected(404))
            };

            (
                outcome,
                script.delays.get(device_id).copied(),
                script.hanging.contains(device_id),
            )
        };

        if hang {
            std::future::pending::<()>().await;
        }

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        outcome
    }

    async fn control(
        &self,
        device_id: &DeviceId,
        relay: RelaySlot,
        state: bool,
    ) -> iot_backend::Result<Value> {
        let mut script = self.script();
        script.controls.push((device_id.clone(), relay, state));

        if script.failing_relays.contains(&relay) {
            Err(rejected(500))
        } else {
            Ok(json!({ "success": true, "relay": relay.key(), "state": state }))
        }
    }

    async fn add_device(&self, device: &AddRequest) -> iot_backend::Result<()> {
        let mut script = self.script();

        if script.devices_fail {
            return Err(rejected(503));
        }

        script.devices.push(Device {
            device_id: device.device_id.clone(),
            name: device.name.clone(),
            status: Value::Null,
        });
        script.added.push(device.clone());

        Ok(())
    }

    async fn delete_device(&self, device_id: &DeviceId) -> iot_backend::Result<()> {
        let mut script = self.script();
        script.devices.retain(|device| &device.device_id != device_id);
        script.statuses.remove(device_id);
        script.deleted.push(device_id.clone());

        Ok(())
    }

    async fn current_rate(&self) -> iot_backend::Result<Option<Rate>> {
        let mut script = self.script();
        script.rate_calls += 1;

        Ok(script.rate.clone())
    }

    async fn configure_power(
        &self,
        device_id: &DeviceId,
        ratings: &[PowerRating],
    ) -> iot_backend::Result<()> {
        self.script()
            .configured
            .push((device_id.clone(), ratings.to_vec()));

        Ok(())
    }
}

/// Observer recording every notification. Once attached to a store it also
/// reads the device back from inside the hook.
#[derive(Default)]
pub struct Recorder {
    changes: Mutex<Vec<DeviceId>>,
    failures: Mutex<Vec<String>>,
    store: Mutex<Weak<StateStore>>,
    seen: Mutex<HashMap<DeviceId, [bool; 4]>>,
}

impl Recorder {
    pub fn attach(&self, store: &Arc<StateStore>) {
        *self.store.lock().unwrap() = Arc::downgrade(store);
    }

    pub fn changes(&self) -> Vec<DeviceId> {
        self.changes.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }

    pub fn last_seen(&self, device_id: &DeviceId) -> Option<[bool; 4]> {
        self.seen.lock().unwrap().get(device_id).copied()
    }
}

impl Observer for Recorder {
    fn state_changed(&self, device_id: &DeviceId) {
        self.changes.lock().unwrap().push(device_id.clone());

        let store = self.store.lock().unwrap().upgrade();
        if let Some(device) = store.and_then(|store| store.device(device_id)) {
            let relays = device.relays().map(|relay| relay.on);
            self.seen.lock().unwrap().insert(device_id.clone(), relays);
        }
    }

    fn poll_failed(&self, poller: &str, _error: &Error) {
        self.failures.lock().unwrap().push(poller.to_string());
    }
}
