mod coordinator;
mod device;
mod error;
mod fleet;
mod focus;
mod observer;
mod poller;
mod rate;
mod session;
mod store;

pub mod normalize;

#[cfg(test)]
mod testing;

pub use coordinator::ControlCoordinator;
pub use device::{DeviceState, RelayFlags, RelayState, RelayTelemetry};
pub use error::Error;
pub use fleet::{FleetPoller, FLEET_POLLER};
pub use focus::{FocusPoller, FOCUS_POLLER};
pub use observer::Observer;
pub use poller::Poller;
pub use rate::{ElectricityRate, RateCell};
pub use session::{Session, SessionConfig, RATE_POLLER};
pub use store::StateStore;

pub use transport::{DeviceId, RelaySlot};

pub type Result<T> = std::result::Result<T, Error>;
