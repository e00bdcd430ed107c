//! Translation of backend status payloads into canonical relay state.
//!
//! Firmware revisions have reported relay flags in three different places and
//! in two different entry formats. Every function here is total: malformed or
//! unknown input degrades to "not reported", `false` or `0`, never to an error.

use serde_json::{Map, Value};
use transport::RelaySlot;

use crate::{RelayFlags, RelayTelemetry};

type Fields = Map<String, Value>;

/// Accepted locations of the relay map inside a status payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RelaySource<'p> {
    /// `{ "relays": { .. } }`
    TopLevel(&'p Fields),
    /// `{ "state": { "relays": { .. } } }`
    Nested(&'p Fields),
    /// `{ "rawState": { "relays": { .. } } }`
    Raw(&'p Fields),
    Missing,
}

impl<'p> RelaySource<'p> {
    /// Picks the first location that holds a JSON object.
    pub fn detect(payload: &'p Value) -> RelaySource<'p> {
        if let Some(relays) = payload.get("relays").and_then(Value::as_object) {
            RelaySource::TopLevel(relays)
        } else if let Some(relays) = payload.pointer("/state/relays").and_then(Value::as_object) {
            RelaySource::Nested(relays)
        } else if let Some(relays) = payload
            .pointer("/rawState/relays")
            .and_then(Value::as_object)
        {
            RelaySource::Raw(relays)
        } else {
            RelaySource::Missing
        }
    }

    pub fn relays(&self) -> Option<&'p Fields> {
        match *self {
            RelaySource::TopLevel(relays) | RelaySource::Nested(relays) | RelaySource::Raw(relays) => {
                Some(relays)
            }
            RelaySource::Missing => None,
        }
    }
}

/// Accepted formats of a single relay entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayEntry {
    /// `"relay1": true`
    Bare(bool),
    /// `"relay1": { "state": true }`
    State(bool),
    /// `"relay1": { "isOn": true }`
    IsOn(bool),
    /// An object carrying neither flag.
    Unflagged,
    /// Anything that is neither a boolean nor an object.
    Unsupported,
}

impl RelayEntry {
    pub fn parse(value: &Value) -> RelayEntry {
        match value {
            Value::Object(fields) => {
                let state = fields.get("state").and_then(Value::as_bool);
                let is_on = fields.get("isOn").and_then(Value::as_bool);

                // A raised `isOn` wins over a lowered `state`.
                match (state, is_on) {
                    (Some(true), _) => RelayEntry::State(true),
                    (_, Some(on)) => RelayEntry::IsOn(on),
                    (Some(false), None) => RelayEntry::State(false),
                    (None, None) => RelayEntry::Unflagged,
                }
            }
            Value::Bool(on) => RelayEntry::Bare(*on),
            _ => RelayEntry::Unsupported,
        }
    }

    pub fn is_on(self) -> bool {
        match self {
            RelayEntry::Bare(on) | RelayEntry::State(on) | RelayEntry::IsOn(on) => on,
            RelayEntry::Unflagged | RelayEntry::Unsupported => false,
        }
    }
}

/// Relay flags reported by a status payload. Slots without an entry are left
/// unreported so that merging them never erases known state.
pub fn relay_flags(payload: &Value) -> RelayFlags {
    let mut flags = RelayFlags::new();

    if let Some(relays) = RelaySource::detect(payload).relays() {
        for slot in RelaySlot::ALL {
            if let Some(entry) = relays.get(slot.key()) {
                flags.set(slot, RelayEntry::parse(entry).is_on());
            }
        }
    }

    flags
}

/// State of `slot` confirmed by a control response, when the response says.
///
/// Besides the relay shapes of status payloads, a bare `{ "state": bool }`
/// answer is accepted as long as it does not name a different relay.
pub fn confirmed_state(response: &Value, slot: RelaySlot) -> Option<bool> {
    if let Some(on) = relay_flags(response).get(slot) {
        return Some(on);
    }

    let same_relay = match response.get("relay") {
        Some(relay) => relay.as_str() == Some(slot.key()),
        None => true,
    };

    if same_relay {
        response.get("state").and_then(Value::as_bool)
    } else {
        None
    }
}

/// Per-relay power info map: `powerInfo`, falling back to `state.powerInfo`.
fn power_info(payload: &Value) -> Option<&Fields> {
    payload
        .get("powerInfo")
        .and_then(Value::as_object)
        .or_else(|| payload.pointer("/state/powerInfo").and_then(Value::as_object))
}

/// Detailed telemetry for all four relays.
///
/// `fallback_price` is used for relays whose entry carries no price of its own.
pub fn telemetry(payload: &Value, fallback_price: f64) -> [RelayTelemetry; 4] {
    let info = power_info(payload);

    RelaySlot::ALL.map(|slot| {
        let fields = info
            .and_then(|info| info.get(slot.key()))
            .and_then(Value::as_object);

        relay_telemetry(fields, fallback_price)
    })
}

fn relay_telemetry(fields: Option<&Fields>, fallback_price: f64) -> RelayTelemetry {
    let field = |key: &str| fields.and_then(|fields| reading(fields, key));

    RelayTelemetry {
        power_rating_watts: field("powerRating").unwrap_or_default(),
        energy_wh: field("energyConsumed")
            .or_else(|| field("energyWh"))
            .unwrap_or_default(),
        cumulative_energy_wh: field("cumulativeEnergy").unwrap_or_default(),
        price_per_kwh: field("pricePerKWh")
            .or_else(|| field("price"))
            .unwrap_or_else(|| sanitize(fallback_price).unwrap_or_default()),
    }
}

fn reading(fields: &Fields, key: &str) -> Option<f64> {
    fields.get(key).and_then(Value::as_f64).and_then(sanitize)
}

fn sanitize(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}
