use std::fmt::Write;

use log::trace;
use relay_state::{DeviceState, ElectricityRate, Observer};
use tokio::sync::mpsc::UnboundedSender;
use transport::{DeviceId, RelaySlot};

/// Forwards store notifications to the render loop.
pub struct ChannelObserver {
    tx: UnboundedSender<DeviceId>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<DeviceId>) -> Self {
        Self { tx }
    }
}

impl Observer for ChannelObserver {
    fn state_changed(&self, device_id: &DeviceId) {
        if self.tx.send(device_id.clone()).is_err() {
            trace!("render loop is gone, dropping update of {device_id}");
        }
    }
}

/// One-line relay summary, followed by per-relay telemetry when `detailed`.
pub fn describe(
    device_id: &DeviceId,
    device: Option<&DeviceState>,
    rate: &ElectricityRate,
    detailed: bool,
) -> String {
    let Some(device) = device else {
        return format!("{device_id}: removed");
    };

    let relays = RelaySlot::ALL
        .iter()
        .map(|slot| format!("{slot} {}", if device.is_on(*slot) { "on" } else { "off" }))
        .collect::<Vec<_>>()
        .join(", ");

    let mut line = format!("{device_id}: {relays}");

    if detailed && device.has_telemetry() {
        let mut total = 0.0;

        for slot in RelaySlot::ALL {
            let telemetry = device.telemetry_or_default(slot);
            total += telemetry.cost();

            let _ = write!(
                line,
                "\n  {slot}: {:.0} W, {:.2} Wh, {:.2} Wh total, {:.2} {}",
                telemetry.power_rating_watts,
                telemetry.energy_wh,
                telemetry.cumulative_energy_wh,
                telemetry.cost(),
                rate.currency,
            );
        }

        let _ = write!(line, "\n  cost: {total:.2} {}", rate.currency);
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_removed_device() {
        let line = describe(
            &DeviceId::new("esp-1"),
            None,
            &ElectricityRate::default(),
            true,
        );

        assert_eq!(line, "esp-1: removed");
    }

    #[test]
    fn test_relays_only() {
        let line = describe(
            &DeviceId::new("esp-1"),
            Some(&DeviceState::default()),
            &ElectricityRate::default(),
            true,
        );

        assert_eq!(
            line,
            "esp-1: relay1 off, relay2 off, relay3 off, relay4 off"
        );
    }

    #[test]
    fn test_observer_forwards_ids() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let observer = ChannelObserver::new(tx);

        observer.state_changed(&DeviceId::new("esp-1"));

        assert_eq!(rx.try_recv().unwrap(), DeviceId::new("esp-1"));
    }
}
