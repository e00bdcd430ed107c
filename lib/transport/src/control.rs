use serde::{Deserialize, Serialize};

use crate::RelaySlot;

/// Body of `POST /devices/{id}/control`.
#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Request {
    pub relay: RelaySlot,
    pub state: bool,
}

impl Request {
    pub fn new(relay: RelaySlot, state: bool) -> Request {
        Request { relay, state }
    }
}
