use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::idt_pipeline::common::error::{IdtError, Result};

/// Signed exposure offset in stops relative to the reference exposure.
///
/// Always finite, and `-0` is stored as `0`, so equality and ordering are
/// total.
#[derive(Debug, Clone, Copy)]
pub struct ExposureValue(f64);

impl ExposureValue {
    pub fn new(ev: f64) -> Result<Self> {
        if !ev.is_finite() {
            return Err(IdtError::InvalidExposureKey(ev.to_string()));
        }
        Ok(Self(ev + 0.0))
    }

    pub fn stops(&self) -> f64 {
        self.0
    }

    /// Linear scale of this exposure relative to EV 0.
    pub fn gain(&self) -> f64 {
        self.0.exp2()
    }
}

impl PartialEq for ExposureValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ExposureValue {}

impl PartialOrd for ExposureValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExposureValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for ExposureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_exposure_key(self.0))
    }
}

impl FromStr for ExposureValue {
    type Err = IdtError;

    fn from_str(s: &str) -> Result<Self> {
        parse_exposure_key(s)
    }
}

/// Parses a possibly decorated exposure key such as `"+2 stops"` or
/// `"-1.5EV"`: every character other than digits, `.` and `-` is dropped
/// before parsing.
pub fn parse_exposure_key(key: &str) -> Result<ExposureValue> {
    let numeric: String = key
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let ev = numeric
        .parse::<f64>()
        .map_err(|_| IdtError::InvalidExposureKey(key.to_string()))?;
    ExposureValue::new(ev).map_err(|_| IdtError::InvalidExposureKey(key.to_string()))
}

/// Canonical key for an EV: `"+2"`, `"0"`, `"-1.5"`.
pub fn format_exposure_key(ev: f64) -> String {
    if ev == 0.0 {
        String::from("0")
    } else {
        format!("{ev:+}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(key: &str) -> f64 {
        parse_exposure_key(key).unwrap().stops()
    }

    #[test]
    fn test_decorated_keys_match_plain_numbers() {
        assert_eq!(parse_exposure_key("+2 stops").unwrap(), parse_exposure_key("2").unwrap());
        assert_eq!(ev("-1.5EV"), -1.5);
        assert_eq!(ev("EV 0"), 0.0);
        assert_eq!(ev("+0.5"), 0.5);
        assert_eq!(ev("  3 "), 3.0);
    }

    #[test]
    fn test_negative_zero_equals_zero() {
        let negative = parse_exposure_key("-0").unwrap();
        let zero = parse_exposure_key("0").unwrap();
        assert_eq!(negative, zero);
        assert_eq!(negative.to_string(), "0");
    }

    #[test]
    fn test_unparseable_keys() {
        for key in ["", "stops", "1-2", "1.2.3", "--1"] {
            assert!(
                matches!(parse_exposure_key(key), Err(IdtError::InvalidExposureKey(_))),
                "{key:?} should not parse"
            );
        }
    }

    #[test]
    fn test_format_exposure_key() {
        assert_eq!(format_exposure_key(2.0), "+2");
        assert_eq!(format_exposure_key(0.0), "0");
        assert_eq!(format_exposure_key(-1.5), "-1.5");
        assert_eq!(format_exposure_key(0.25), "+0.25");
    }

    #[test]
    fn test_ordering_and_gain() {
        let mut values: Vec<ExposureValue> = ["+1", "-2", "0", "+2", "-1"]
            .iter()
            .map(|k| parse_exposure_key(k).unwrap())
            .collect();
        values.sort();
        let stops: Vec<f64> = values.iter().map(ExposureValue::stops).collect();
        assert_eq!(stops, [-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(values[0].gain(), 0.25);
        assert_eq!(values[4].gain(), 4.0);
    }

    #[test]
    fn test_non_finite_value_rejected() {
        assert!(ExposureValue::new(f64::INFINITY).is_err());
        assert!(ExposureValue::new(f64::NAN).is_err());
    }
}
