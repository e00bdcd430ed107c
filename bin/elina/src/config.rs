use std::time::Duration;

use relay_state::{ElectricityRate, SessionConfig};
use transport::DeviceId;

use crate::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://iot-backend-ipqy.onrender.com/api";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub auth_token: String,
    pub fleet_interval: Duration,
    pub focus_interval: Duration,
    pub rate_interval: Option<Duration>,
    pub focus_device: Option<DeviceId>,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_base_url = var("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let auth_token = var("AUTH_TOKEN").ok_or(Error::MissingVar("AUTH_TOKEN"))?;

        let fleet_interval = millis(var("FLEET_POLL_INTERVAL_MS"), "FLEET_POLL_INTERVAL_MS", 5000)?;
        let focus_interval = millis(var("FOCUS_POLL_INTERVAL_MS"), "FOCUS_POLL_INTERVAL_MS", 5000)?;
        let rate_interval = millis(var("RATE_REFRESH_INTERVAL_MS"), "RATE_REFRESH_INTERVAL_MS", 60_000)?;

        for (name, interval) in [
            ("FLEET_POLL_INTERVAL_MS", fleet_interval),
            ("FOCUS_POLL_INTERVAL_MS", focus_interval),
        ] {
            if interval.is_zero() {
                return Err(Error::ZeroInterval(name));
            }
        }

        Ok(Config {
            api_base_url,
            auth_token,
            fleet_interval,
            focus_interval,
            rate_interval: (!rate_interval.is_zero()).then_some(rate_interval),
            focus_device: var("FOCUS_DEVICE").map(DeviceId::new),
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            fleet_interval: self.fleet_interval,
            focus_interval: self.focus_interval,
            rate_interval: self.rate_interval,
            default_rate: ElectricityRate::default(),
        }
    }
}

fn millis(value: Option<String>, name: &'static str, default: u64) -> Result<Duration> {
    let Some(value) = value else {
        return Ok(Duration::from_millis(default));
    };

    value
        .trim()
        .parse()
        .map(Duration::from_millis)
        .map_err(|_| Error::InvalidVar { name, value })
}
