use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use transport::rate::Rate;

/// Tariff used as the price of relays that do not report their own.
#[derive(Clone, Debug, PartialEq)]
pub struct ElectricityRate {
    pub rate_per_unit: f64,
    pub currency: String,
}

impl Default for ElectricityRate {
    fn default() -> Self {
        ElectricityRate {
            rate_per_unit: 6.0,
            currency: "INR".to_string(),
        }
    }
}

/// Process-wide, independently refreshed electricity rate.
#[derive(Debug, Default)]
pub struct RateCell(Mutex<ElectricityRate>);

impl RateCell {
    pub fn new(rate: ElectricityRate) -> RateCell {
        RateCell(Mutex::new(rate))
    }

    pub fn get(&self) -> ElectricityRate {
        self.lock().clone()
    }

    pub fn price(&self) -> f64 {
        self.lock().rate_per_unit
    }

    /// Applies a backend rate, keeping the current value of any field that is
    /// missing, empty or not a positive number. Returns whether anything changed.
    pub fn apply(&self, rate: &Rate) -> bool {
        let mut current = self.lock();
        let before = current.clone();

        if let Some(rate_per_unit) = rate.rate_per_unit {
            if rate_per_unit.is_finite() && rate_per_unit > 0.0 {
                current.rate_per_unit = rate_per_unit;
            } else {
                debug!("ignoring rate {rate_per_unit}");
            }
        }

        if let Some(currency) = rate.currency.as_deref().filter(|c| !c.is_empty()) {
            current.currency = currency.to_string();
        }

        let changed = *current != before;
        if changed {
            info!(
                "electricity rate is {} {}/kWh",
                current.rate_per_unit, current.currency
            );
        }

        changed
    }

    fn lock(&self) -> MutexGuard<'_, ElectricityRate> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let cell = RateCell::default();

        assert_eq!(cell.price(), 6.0);
        assert_eq!(cell.get().currency, "INR");
    }

    #[test]
    fn test_apply() {
        let cell = RateCell::default();

        let changed = cell.apply(&Rate {
            rate_per_unit: Some(7.25),
            currency: Some("EUR".to_string()),
        });

        assert!(changed);
        assert_eq!(
            cell.get(),
            ElectricityRate {
                rate_per_unit: 7.25,
                currency: "EUR".to_string(),
            }
        );
    }

    #[test]
    fn test_apply_keeps_invalid_fields() {
        let cell = RateCell::new(ElectricityRate {
            rate_per_unit: 8.0,
            currency: "INR".to_string(),
        });

        for rate in [
            Rate::default(),
            Rate {
                rate_per_unit: Some(0.0),
                currency: Some(String::new()),
            },
            Rate {
                rate_per_unit: Some(-3.0),
                currency: None,
            },
        ] {
            assert!(!cell.apply(&rate));
        }

        assert_eq!(cell.price(), 8.0);
        assert_eq!(cell.get().currency, "INR");
    }
}
