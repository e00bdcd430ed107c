use std::fmt;
use std::str::FromStr;

use serde::de::{value, Error};
use serde::{Deserialize, Serialize};

/// One of the four switchable outlets of a device.
#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RelaySlot {
    Relay1,
    Relay2,
    Relay3,
    Relay4,
}

impl RelaySlot {
    pub const ALL: [RelaySlot; 4] = [
        RelaySlot::Relay1,
        RelaySlot::Relay2,
        RelaySlot::Relay3,
        RelaySlot::Relay4,
    ];

    /// Zero-based position, suitable for indexing fixed four-slot arrays.
    pub const fn index(self) -> usize {
        match self {
            RelaySlot::Relay1 => 0,
            RelaySlot::Relay2 => 1,
            RelaySlot::Relay3 => 2,
            RelaySlot::Relay4 => 3,
        }
    }

    /// Number printed on the device, 1..=4.
    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub const fn from_number(number: u8) -> Option<RelaySlot> {
        match number {
            1 => Some(RelaySlot::Relay1),
            2 => Some(RelaySlot::Relay2),
            3 => Some(RelaySlot::Relay3),
            4 => Some(RelaySlot::Relay4),
            _ => None,
        }
    }

    /// Key the backend uses for this slot in relay and power maps.
    pub const fn key(self) -> &'static str {
        match self {
            RelaySlot::Relay1 => "relay1",
            RelaySlot::Relay2 => "relay2",
            RelaySlot::Relay3 => "relay3",
            RelaySlot::Relay4 => "relay4",
        }
    }
}

impl fmt::Display for RelaySlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RelaySlot {
    type Err = value::Error;

    fn from_str(s: &str) -> Result<RelaySlot, Self::Err> {
        const ERROR_MSG: &str = "supported relays are relay1..relay4 or 1..4";

        let number = s.strip_prefix("relay").unwrap_or(s);
        number
            .parse::<u8>()
            .ok()
            .and_then(RelaySlot::from_number)
            .ok_or_else(|| value::Error::custom(ERROR_MSG))
    }
}
