//! Weight unit parsing shared between the response codec's unit byte and
//! the management API's JSON formatting.

use std::fmt;
use std::str::FromStr;

use crate::codec::response::WeightUnit;

/// Error returned when `WEIGHT_UNIT` doesn't name one of the three known
/// units.
#[derive(Debug, thiserror::Error)]
#[error("unknown weight unit {0:?}, expected kg, lbs, or stones")]
pub struct UnknownWeightUnit(String);

impl FromStr for WeightUnit {
    type Err = UnknownWeightUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kg" => Ok(WeightUnit::Kg),
            "lbs" => Ok(WeightUnit::Lbs),
            "stones" => Ok(WeightUnit::Stones),
            other => Err(UnknownWeightUnit(other.to_string())),
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
            WeightUnit::Stones => "stones",
        };
        write!(f, "{s}")
    }
}

/// Format a weight in grams in the given unit, for management API JSON.
pub fn format_weight(weight_grams: u32, unit: WeightUnit) -> f64 {
    let kg = weight_grams as f64 / 1000.0;
    match unit {
        WeightUnit::Kg => kg,
        WeightUnit::Lbs => kg * 2.20462,
        WeightUnit::Stones => kg * 2.20462 / 14.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("kg", WeightUnit::Kg; "kg")]
    #[test_case("Lbs", WeightUnit::Lbs; "lbs case insensitive")]
    #[test_case("STONES", WeightUnit::Stones; "stones uppercase")]
    fn parses_known_units(input: &str, expect: WeightUnit) {
        assert_eq!(input.parse::<WeightUnit>().unwrap(), expect);
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!("grams".parse::<WeightUnit>().is_err());
    }
}
