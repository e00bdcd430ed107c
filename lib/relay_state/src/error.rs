use std::fmt;

use transport::{DeviceId, RelaySlot};

#[derive(Debug)]
pub enum Error {
    Backend(iot_backend::Error),
    Status {
        device_id: DeviceId,
        source: iot_backend::Error,
    },
    Command {
        device_id: DeviceId,
        slot: RelaySlot,
        source: iot_backend::Error,
    },
    PartialFailure {
        device_id: DeviceId,
        failed: Vec<RelaySlot>,
    },
    ZeroInterval(String),
    InvalidPowerRating(RelaySlot),
    NoPowerRatings,
    MissingField(&'static str),
}

impl Error {
    /// Failure classification of the backend error behind this one, if any.
    pub fn failure_kind(&self) -> Option<iot_backend::FailureKind> {
        match self {
            Self::Backend(err) | Self::Status { source: err, .. } | Self::Command { source: err, .. } => {
                Some(err.kind())
            }
            _ => None,
        }
    }
}

impl From<iot_backend::Error> for Error {
    fn from(err: iot_backend::Error) -> Self {
        Self::Backend(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "backend error: {err}"),
            Self::Status { device_id, source } => {
                write!(f, "unable to fetch status of {device_id}: {source}")
            }
            Self::Command {
                device_id,
                slot,
                source,
            } => write!(f, "unable to switch {device_id}/{slot}: {source}"),
            Self::PartialFailure { device_id, failed } => {
                let failed = failed
                    .iter()
                    .map(|slot| slot.key())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "failed to switch {failed} of {device_id}")
            }
            Self::ZeroInterval(name) => write!(f, "poller `{name}` needs a non-zero interval"),
            Self::InvalidPowerRating(slot) => write!(f, "invalid power rating for {slot}"),
            Self::NoPowerRatings => write!(f, "at least one power rating is required"),
            Self::MissingField(name) => write!(f, "{name} is required"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(err) | Self::Status { source: err, .. } | Self::Command { source: err, .. } => {
                Some(err)
            }
            _ => None,
        }
    }
}
