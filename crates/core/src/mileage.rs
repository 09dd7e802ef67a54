use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::AdvisoryConfig;
use crate::money::Money;

/// Rate and alert threshold applied when turning a distance into a cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MileageConfig {
    /// Currency units paid per distance unit.
    pub rate_per_unit: Decimal,
    /// Costs strictly above this raise the approval advisory.
    pub alert_threshold: Decimal,
}

impl Default for MileageConfig {
    fn default() -> Self {
        Self {
            rate_per_unit: Decimal::from(6),
            alert_threshold: Decimal::from(4000),
        }
    }
}

/// An odometer value read out of OCR text.
///
/// The match is kept as the digit run found in the text so that leading
/// zeros (`012345`) survive; [`OdometerReading::value`] gives the number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdometerReading {
    pub raw_text: String,
    pub matched_value: Option<String>,
}

impl OdometerReading {
    pub fn new(raw_text: impl Into<String>, matched_value: Option<String>) -> Self {
        Self { raw_text: raw_text.into(), matched_value }
    }

    pub fn is_found(&self) -> bool {
        self.matched_value.is_some()
    }

    pub fn value(&self) -> Option<u64> {
        self.matched_value.as_deref()?.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripReconciliation {
    pub start: u64,
    pub end: u64,
    pub distance: u64,
    pub cost: Money,
    pub over_threshold: bool,
}

impl TripReconciliation {
    /// The message to surface to the claimant when the trip needs approval.
    /// Delivering it is up to the caller.
    pub fn advisory(&self, mileage: &MileageConfig, contact: &AdvisoryConfig) -> Option<String> {
        if !self.over_threshold {
            return None;
        }
        let threshold = Money::from_decimal(mileage.alert_threshold);
        let mut msg = format!(
            "Travel cost {} exceeds {}. Please contact {}",
            self.cost, threshold, contact.approver
        );
        if !contact.phone.is_empty() {
            msg.push_str(&format!(" (tel. {})", contact.phone));
        }
        msg.push('.');
        Some(msg)
    }
}

/// Order two readings, compute the distance and its cost.
///
/// Readings arrive unordered: the end-of-trip photo may be uploaded first.
pub fn reconcile(start: u64, end: u64, config: &MileageConfig) -> TripReconciliation {
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    let distance = end - start;
    let cost = Money::from_decimal(Decimal::from(distance) * config.rate_per_unit);
    let over_threshold = cost.amount() > config.alert_threshold;

    TripReconciliation { start, end, distance, cost, over_threshold }
}

/// Reconcile two extracted readings. `None` unless both carry a value.
pub fn reconcile_readings(
    first: &OdometerReading,
    second: &OdometerReading,
    config: &MileageConfig,
) -> Option<TripReconciliation> {
    Some(reconcile(first.value()?, second.value()?, config))
}

/// Claimant details collected alongside the two odometer photos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TripClaim {
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub start_point: String,
    pub end_point: String,
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> AdvisoryConfig {
        AdvisoryConfig { approver: "Dr. Approver".into(), phone: "0987654321".into() }
    }

    #[test]
    fn reversed_readings_are_swapped() {
        let r = reconcile(45231, 44980, &MileageConfig::default());
        assert_eq!(r.start, 44980);
        assert_eq!(r.end, 45231);
        assert_eq!(r.distance, 251);
        assert_eq!(r.cost, Money::from_units(1506));
        assert!(!r.over_threshold);
    }

    #[test]
    fn over_threshold_trip_is_flagged() {
        let r = reconcile(10000, 10800, &MileageConfig::default());
        assert_eq!(r.distance, 800);
        assert_eq!(r.cost, Money::from_units(4800));
        assert!(r.over_threshold);
    }

    #[test]
    fn threshold_is_strict() {
        let cfg = MileageConfig { rate_per_unit: Decimal::from(5), ..Default::default() };
        let r = reconcile(0, 800, &cfg);
        assert_eq!(r.cost, Money::from_units(4000));
        assert!(!r.over_threshold);
    }

    #[test]
    fn equal_readings_give_zero_distance() {
        let r = reconcile(5000, 5000, &MileageConfig::default());
        assert_eq!(r.distance, 0);
        assert!(r.cost.is_zero());
    }

    #[test]
    fn fractional_rate() {
        let cfg = MileageConfig { rate_per_unit: "4.5".parse().unwrap(), ..Default::default() };
        let r = reconcile(100, 103, &cfg);
        assert_eq!(r.cost.amount(), "13.5".parse::<Decimal>().unwrap());
    }

    #[test]
    fn advisory_only_when_over_threshold() {
        let cfg = MileageConfig::default();
        let under = reconcile(100, 200, &cfg);
        assert!(under.advisory(&cfg, &contact()).is_none());

        let over = reconcile(10000, 10800, &cfg);
        let msg = over.advisory(&cfg, &contact()).unwrap();
        assert!(msg.contains("4,800.00"), "{msg}");
        assert!(msg.contains("4,000.00"), "{msg}");
        assert!(msg.contains("Dr. Approver"));
        assert!(msg.contains("0987654321"));
    }

    #[test]
    fn advisory_without_phone() {
        let cfg = MileageConfig::default();
        let over = reconcile(0, 1000, &cfg);
        let contact = AdvisoryConfig { approver: "fleet desk".into(), phone: String::new() };
        let msg = over.advisory(&cfg, &contact).unwrap();
        assert!(msg.ends_with("fleet desk."), "{msg}");
    }

    #[test]
    fn reading_value_keeps_leading_zero_digits() {
        let r = OdometerReading::new("ODO 012345", Some("012345".into()));
        assert_eq!(r.matched_value.as_deref(), Some("012345"));
        assert_eq!(r.value(), Some(12345));
        assert!(r.is_found());
    }

    #[test]
    fn reconcile_readings_requires_both() {
        let cfg = MileageConfig::default();
        let a = OdometerReading::new("a", Some("44980".into()));
        let b = OdometerReading::new("b", Some("45231".into()));
        let missing = OdometerReading::new("c", None);

        assert_eq!(reconcile_readings(&b, &a, &cfg).unwrap().distance, 251);
        assert!(reconcile_readings(&a, &missing, &cfg).is_none());
        assert!(reconcile_readings(&missing, &a, &cfg).is_none());
    }

    #[test]
    fn claim_deserializes_camel_case() {
        let claim: TripClaim = serde_json::from_str(
            r#"{"employeeCode":"E042","firstName":"Som","startPoint":"HQ","date":"2025-06-01"}"#,
        )
        .unwrap();
        assert_eq!(claim.employee_code, "E042");
        assert_eq!(claim.last_name, "");
        assert_eq!(claim.date, NaiveDate::from_ymd_opt(2025, 6, 1));
    }
}
