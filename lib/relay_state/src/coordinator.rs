use std::sync::Arc;

use futures_util::future::join_all;
use iot_backend::DeviceService;
use log::{debug, info, warn};
use transport::power::PowerRating;
use transport::{DeviceId, RelaySlot};

use crate::{normalize, Error, RelayFlags, Result, StateStore};

/// Executes user-issued relay commands.
///
/// The store is only written after the backend confirmed a command; on any
/// failure it is left untouched and the caller learns about it through the
/// returned error.
pub struct ControlCoordinator {
    service: Arc<dyn DeviceService>,
    store: Arc<StateStore>,
}

impl ControlCoordinator {
    pub fn new(service: Arc<dyn DeviceService>, store: Arc<StateStore>) -> Self {
        Self { service, store }
    }

    /// Switches one relay. Returns the state the backend confirmed.
    pub async fn set_relay(&self, device_id: &DeviceId, slot: RelaySlot, on: bool) -> Result<bool> {
        let response = self
            .service
            .control(device_id, slot, on)
            .await
            .map_err(|source| Error::Command {
                device_id: device_id.clone(),
                slot,
                source,
            })?;

        let confirmed = normalize::confirmed_state(&response, slot).unwrap_or(on);
        if confirmed != on {
            warn!("{device_id}/{slot} requested {on}, backend reports {confirmed}");
        }

        info!("{device_id}/{slot} is {}", if confirmed { "on" } else { "off" });
        self.store
            .merge_relay_booleans(device_id, RelayFlags::single(slot, confirmed));

        Ok(confirmed)
    }

    /// Switches all four relays concurrently. The store is updated only when
    /// every command succeeded, with the state each relay's response confirmed.
    pub async fn set_all_relays(&self, device_id: &DeviceId, on: bool) -> Result<()> {
        let commands = RelaySlot::ALL.map(|slot| async move {
            let outcome = self.service.control(device_id, slot, on).await;
            (slot, outcome)
        });

        let mut flags = RelayFlags::uniform(on);
        let mut failed = Vec::new();

        for (slot, outcome) in join_all(commands).await {
            match outcome {
                Ok(response) => {
                    let confirmed = normalize::confirmed_state(&response, slot).unwrap_or(on);
                    if confirmed != on {
                        warn!("{device_id}/{slot} requested {on}, backend reports {confirmed}");
                    }
                    flags.set(slot, confirmed);
                }
                Err(err) => {
                    warn!("{device_id}/{slot}: {err}");
                    failed.push(slot);
                }
            }
        }

        if !failed.is_empty() {
            return Err(Error::PartialFailure {
                device_id: device_id.clone(),
                failed,
            });
        }

        info!("{device_id} all relays {}", if on { "on" } else { "off" });
        self.store.merge_relay_booleans(device_id, flags);

        Ok(())
    }

    /// Sends the nominal wattage of the given relays.
    pub async fn configure_power(
        &self,
        device_id: &DeviceId,
        ratings: &[(RelaySlot, f64)],
    ) -> Result<()> {
        if ratings.is_empty() {
            return Err(Error::NoPowerRatings);
        }

        let mut config = Vec::with_capacity(ratings.len());

        for &(relay, power_rating) in ratings {
            if !power_rating.is_finite() || power_rating < 0.0 {
                return Err(Error::InvalidPowerRating(relay));
            }

            config.push(PowerRating {
                relay,
                power_rating,
            });
        }

        self.service.configure_power(device_id, &config).await?;
        debug!("{device_id} power ratings updated");

        Ok(())
    }
}
