use serde::{Deserialize, Serialize};

/// Response of `GET /power/rate/current`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CurrentRate {
    #[serde(default)]
    pub rate: Option<Rate>,
}

/// Both fields are optional on the wire; consumers keep their previous value
/// for whatever is missing.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    #[serde(default)]
    pub rate_per_unit: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}
