use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace};
use transport::{DeviceId, RelaySlot};

use crate::{DeviceState, Observer, RelayFlags, RelayTelemetry};

/// Canonical in-memory state of every known device.
///
/// Readers get snapshots. Writes are reserved to the pollers and the control
/// coordinator; each write notifies the observer exactly once, after the lock
/// is released.
///
/// Entries are created by the first write for a device. Devices dropped by
/// [`remove_device`](Self::remove_device), [`retain`](Self::retain) or
/// [`clear`](Self::clear) stay forgotten until they are tracked again, so a
/// fetch that was in flight when they were dropped cannot bring them back.
pub struct StateStore {
    devices: Mutex<Devices>,
    observer: Arc<dyn Observer>,
}

#[derive(Default)]
struct Devices {
    states: HashMap<DeviceId, DeviceState>,
    forgotten: HashSet<DeviceId>,
    closed: bool,
}

impl Devices {
    /// Existing state of `device_id`, or a freshly created all-off entry.
    /// `None` for forgotten devices.
    fn ensure_device(&mut self, device_id: &DeviceId) -> Option<&mut DeviceState> {
        if !self.states.contains_key(device_id)
            && (self.closed || self.forgotten.contains(device_id))
        {
            return None;
        }

        Some(self.states.entry(device_id.clone()).or_default())
    }

    fn forget(&mut self, device_id: &DeviceId) -> Option<DeviceState> {
        self.forgotten.insert(device_id.clone());
        self.states.remove(device_id)
    }
}

impl StateStore {
    pub fn new(observer: Arc<dyn Observer>) -> Self {
        Self {
            devices: Mutex::new(Devices::default()),
            observer,
        }
    }

    pub fn device(&self, device_id: &DeviceId) -> Option<DeviceState> {
        self.lock().states.get(device_id).cloned()
    }

    pub fn device_ids(&self) -> Vec<DeviceId> {
        let mut ids = self.lock().states.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn is_on(&self, device_id: &DeviceId, slot: RelaySlot) -> Option<bool> {
        self.lock()
            .states
            .get(device_id)
            .map(|device| device.is_on(slot))
    }

    pub fn telemetry(&self, device_id: &DeviceId, slot: RelaySlot) -> Option<RelayTelemetry> {
        self.lock()
            .states
            .get(device_id)
            .and_then(|device| device.telemetry(slot).copied())
    }

    /// Accepts writes for `ids` again, including after [`clear`](Self::clear).
    pub(crate) fn track(&self, ids: &[DeviceId]) {
        let mut devices = self.lock();
        devices.closed = false;

        for id in ids {
            if devices.forgotten.remove(id) {
                trace!("tracking {id} again");
            }
        }
    }

    /// Overwrites the reported slots and leaves every other slot as it was.
    pub(crate) fn merge_relay_booleans(&self, device_id: &DeviceId, flags: RelayFlags) {
        let Some(changed) = self.update(device_id, |device| device.apply_flags(flags)) else {
            return;
        };

        if changed {
            debug!("{device_id} relays {:?}", flags);
        } else {
            trace!("{device_id} relays unchanged");
        }

        self.observer.state_changed(device_id);
    }

    pub(crate) fn replace_telemetry(
        &self,
        device_id: &DeviceId,
        slot: RelaySlot,
        telemetry: RelayTelemetry,
    ) {
        let updated = self.update(device_id, |device| device.replace_telemetry(slot, telemetry));

        if updated.is_some() {
            self.observer.state_changed(device_id);
        }
    }

    /// Replaces the telemetry of all four relays with a single notification.
    pub(crate) fn replace_all_telemetry(&self, device_id: &DeviceId, telemetry: [RelayTelemetry; 4]) {
        let updated = self.update(device_id, |device| {
            for (slot, telemetry) in RelaySlot::ALL.into_iter().zip(telemetry) {
                device.replace_telemetry(slot, telemetry);
            }
        });

        if updated.is_some() {
            trace!("{device_id} telemetry replaced");
            self.observer.state_changed(device_id);
        }
    }

    pub(crate) fn remove_device(&self, device_id: &DeviceId) -> Option<DeviceState> {
        let removed = self.lock().forget(device_id);

        if removed.is_some() {
            debug!("forgot {device_id}");
            self.observer.state_changed(device_id);
        }

        removed
    }

    /// Drops every device not listed in `keep`. Returns the dropped ids.
    pub(crate) fn retain(&self, keep: &[DeviceId]) -> Vec<DeviceId> {
        let removed = {
            let mut devices = self.lock();
            let removed = devices
                .states
                .keys()
                .filter(|id| !keep.contains(id))
                .cloned()
                .collect::<Vec<_>>();

            for id in &removed {
                devices.forget(id);
            }

            removed
        };

        for id in &removed {
            debug!("forgot {id}");
            self.observer.state_changed(id);
        }

        removed
    }

    /// Drops every device and rejects writes until something is tracked again.
    pub(crate) fn clear(&self) {
        let removed = {
            let mut devices = self.lock();
            devices.closed = true;

            let removed = devices.states.drain().map(|(id, _)| id).collect::<Vec<_>>();
            devices.forgotten.extend(removed.iter().cloned());
            removed
        };

        for id in &removed {
            self.observer.state_changed(id);
        }
    }

    fn update<R>(&self, device_id: &DeviceId, f: impl FnOnce(&mut DeviceState) -> R) -> Option<R> {
        let mut devices = self.lock();

        match devices.ensure_device(device_id) {
            Some(device) => Some(f(device)),
            None => {
                trace!("ignoring update of forgotten {device_id}");
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Devices> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
