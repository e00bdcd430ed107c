use std::collections::HashMap;

use transport::RelaySlot;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RelayState {
    pub on: bool,
}

/// Power readings of one relay. Every field is non-negative.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RelayTelemetry {
    pub power_rating_watts: f64,
    pub energy_wh: f64,
    pub cumulative_energy_wh: f64,
    pub price_per_kwh: f64,
}

impl RelayTelemetry {
    /// Cost of the cumulative energy at this relay's price.
    pub fn cost(&self) -> f64 {
        self.cumulative_energy_wh * (self.price_per_kwh / 1000.0)
    }
}

/// Canonical state of one device.
///
/// All four relays are always present; telemetry only exists for relays of a
/// device that has been focused at least once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceState {
    relays: [RelayState; 4],
    telemetry: HashMap<RelaySlot, RelayTelemetry>,
}

impl DeviceState {
    pub fn relay(&self, slot: RelaySlot) -> RelayState {
        self.relays[slot.index()]
    }

    pub fn is_on(&self, slot: RelaySlot) -> bool {
        self.relay(slot).on
    }

    pub fn relays(&self) -> [RelayState; 4] {
        self.relays
    }

    pub fn telemetry(&self, slot: RelaySlot) -> Option<&RelayTelemetry> {
        self.telemetry.get(&slot)
    }

    /// Telemetry for display: zeros when nothing was fetched for the relay.
    pub fn telemetry_or_default(&self, slot: RelaySlot) -> RelayTelemetry {
        self.telemetry(slot).copied().unwrap_or_default()
    }

    pub fn has_telemetry(&self) -> bool {
        !self.telemetry.is_empty()
    }

    /// Overwrites only the slots present in `flags`. Returns whether any
    /// relay actually changed.
    pub(crate) fn apply_flags(&mut self, flags: RelayFlags) -> bool {
        let mut changed = false;

        for (slot, on) in flags.reported() {
            let relay = &mut self.relays[slot.index()];
            changed |= relay.on != on;
            relay.on = on;
        }

        changed
    }

    pub(crate) fn replace_telemetry(&mut self, slot: RelaySlot, telemetry: RelayTelemetry) {
        self.telemetry.insert(slot, telemetry);
    }
}

/// Partial relay report: `None` means the slot was not mentioned.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RelayFlags([Option<bool>; 4]);

impl RelayFlags {
    pub fn new() -> RelayFlags {
        RelayFlags::default()
    }

    pub fn single(slot: RelaySlot, on: bool) -> RelayFlags {
        let mut flags = RelayFlags::default();
        flags.set(slot, on);
        flags
    }

    pub fn uniform(on: bool) -> RelayFlags {
        RelayFlags([Some(on); 4])
    }

    pub fn get(&self, slot: RelaySlot) -> Option<bool> {
        self.0[slot.index()]
    }

    pub fn set(&mut self, slot: RelaySlot, on: bool) {
        self.0[slot.index()] = Some(on);
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    pub fn reported(&self) -> impl Iterator<Item = (RelaySlot, bool)> + '_ {
        RelaySlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|on| (slot, on)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport::RelaySlot::*;

    #[test]
    fn test_default_device_is_all_off() {
        let device = DeviceState::default();

        for slot in RelaySlot::ALL {
            assert!(!device.is_on(slot));
            assert_eq!(device.telemetry(slot), None);
        }
        assert!(!device.has_telemetry());
    }

    #[test]
    fn test_apply_flags_keeps_unreported_slots() {
        let mut device = DeviceState::default();
        device.apply_flags(RelayFlags::uniform(true));

        let mut flags = RelayFlags::new();
        flags.set(Relay3, false);

        assert!(device.apply_flags(flags));
        assert_eq!(
            device.relays().map(|relay| relay.on),
            [true, true, false, true]
        );

        assert!(!device.apply_flags(flags));
    }

    #[test]
    fn test_cost() {
        let telemetry = RelayTelemetry {
            cumulative_energy_wh: 1500.0,
            price_per_kwh: 8.0,
            ..Default::default()
        };

        assert!((telemetry.cost() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_flags() {
        let flags = RelayFlags::single(Relay2, true);

        assert_eq!(flags.get(Relay2), Some(true));
        assert_eq!(flags.get(Relay1), None);
        assert_eq!(flags.reported().collect::<Vec<_>>(), vec![(Relay2, true)]);
        assert!(RelayFlags::new().is_empty());
        assert!(!flags.is_empty());
    }
}
