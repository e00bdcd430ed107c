mod client;
mod service;

pub use client::{Client, Error, FailureKind};
pub use service::DeviceService;

#[cfg(feature = "mock")]
pub use service::MockDeviceService;

pub type Result<T> = std::result::Result<T, Error>;
