//! Bounds, range, and structural checks on a decoded upload frame.
//!
//! Pure and stateless, same as `codec` -- the only external input is "now",
//! passed in explicitly so tests don't depend on the wall clock.

use time::{Duration, OffsetDateTime};

use crate::codec::{RawMeasurementRecord, UploadFrame};

/// Minimum accepted weight, in grams (1 kg).
pub const MIN_WEIGHT_GRAMS: u32 = 1_000;

/// Maximum accepted weight, in grams (400 kg).
pub const MAX_WEIGHT_GRAMS: u32 = 400_000;

/// A validation flag attached to the raw upload row. `Display` renders a
/// short snake_case name for each error kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFlag {
    BadMac,
    WeightOutOfRange { measurement_id: u32 },
    TimestampSuspect { measurement_id: u32 },
    TruncatedMeasurements { declared: u16, present: u16 },
}

impl std::fmt::Display for ValidationFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationFlag::BadMac => write!(f, "bad_mac"),
            ValidationFlag::WeightOutOfRange { measurement_id } => {
                write!(f, "weight_out_of_range(id={measurement_id})")
            }
            ValidationFlag::TimestampSuspect { measurement_id } => {
                write!(f, "timestamp_suspect(id={measurement_id})")
            }
            ValidationFlag::TruncatedMeasurements { declared, present } => {
                write!(f, "truncated_measurements(declared={declared},present={present})")
            }
        }
    }
}

/// A measurement that survived validation, annotated with anything notable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMeasurement {
    pub measurement_id: u32,
    pub weight_grams: u32,
    pub impedance_ohms: u16,
    pub fat_raw_1: u16,
    pub fat_raw_2: u16,
    pub covariance: u16,
    pub timestamp: u32,
    pub user_slot: u8,
    pub timestamp_suspect: bool,
}

/// Result of validating a whole frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameValidation {
    pub mac_ok: bool,
    pub battery_percent: u8,
    pub measurements: Vec<ValidatedMeasurement>,
    pub flags: Vec<ValidationFlag>,
}

/// The earliest timestamp accepted without a `timestamp_suspect` flag:
/// 2015-01-01T00:00:00Z.
fn earliest_plausible_timestamp() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_420_070_400).expect("valid timestamp")
}

/// Validate a decoded frame against `now`.
///
/// Out-of-range measurements are dropped from `measurements` but do not
/// abort the frame; every other declared measurement is still processed.
/// A suspect timestamp is noted but never drops the measurement.
pub fn validate_frame(frame: &UploadFrame, now: OffsetDateTime) -> FrameValidation {
    let mac_ok = is_mac_valid(frame.mac);
    let battery_percent = frame.battery_percent.min(100);

    let mut flags = Vec::new();
    if !mac_ok {
        flags.push(ValidationFlag::BadMac);
    }
    if frame.truncated() {
        flags.push(ValidationFlag::TruncatedMeasurements {
            declared: frame.declared_measurement_count,
            present: frame.measurements.len() as u16,
        });
    }

    let mut measurements = Vec::with_capacity(frame.measurements.len());
    for rec in &frame.measurements {
        match validate_measurement(rec, now) {
            Some((validated, suspect)) => {
                if suspect {
                    flags.push(ValidationFlag::TimestampSuspect {
                        measurement_id: validated.measurement_id,
                    });
                }
                measurements.push(validated);
            }
            None => flags.push(ValidationFlag::WeightOutOfRange {
                measurement_id: rec.measurement_id,
            }),
        }
    }

    FrameValidation {
        mac_ok,
        battery_percent,
        measurements,
        flags,
    }
}

/// A MAC is invalid if it's all-zero or all-`0xFF`.
pub fn is_mac_valid(mac: [u8; 6]) -> bool {
    mac != [0u8; 6] && mac != [0xFFu8; 6]
}

fn validate_measurement(
    rec: &RawMeasurementRecord,
    now: OffsetDateTime,
) -> Option<(ValidatedMeasurement, bool)> {
    if rec.weight_grams < MIN_WEIGHT_GRAMS || rec.weight_grams > MAX_WEIGHT_GRAMS {
        return None;
    }

    let latest = now + Duration::hours(24);
    let ts = OffsetDateTime::from_unix_timestamp(rec.timestamp as i64).ok();
    let suspect = match ts {
        Some(ts) => ts < earliest_plausible_timestamp() || ts > latest,
        None => true,
    };

    Some((
        ValidatedMeasurement {
            measurement_id: rec.measurement_id,
            weight_grams: rec.weight_grams,
            impedance_ohms: rec.impedance_ohms,
            fat_raw_1: rec.fat_raw_1,
            fat_raw_2: rec.fat_raw_2,
            covariance: rec.covariance,
            timestamp: rec.timestamp,
            user_slot: rec.user_slot,
            timestamp_suspect: suspect,
        },
        suspect,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MEASUREMENT_LEN;
    use test_case::test_case;

    fn rec(weight_grams: u32, timestamp: u32) -> RawMeasurementRecord {
        RawMeasurementRecord {
            measurement_id: 1,
            impedance_ohms: 520,
            weight_grams,
            timestamp,
            user_slot: 0,
            fat_raw_1: 370,
            fat_raw_2: 370,
            covariance: 0,
            reserved: [0u8; MEASUREMENT_LEN - 21],
        }
    }

    #[test_case(0, 0, 0, 0, 0, 0, false; "all zero")]
    #[test_case(0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, false; "all ff")]
    #[test_case(0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, true; "normal mac")]
    fn mac_validity(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8, expect_ok: bool) {
        assert_eq!(is_mac_valid([a, b, c, d, e, f]), expect_ok);
    }

    #[test_case(1_000; "minimum accepted")]
    #[test_case(400_000; "maximum accepted")]
    fn weight_boundaries_are_accepted(weight_grams: u32) {
        let now = OffsetDateTime::from_unix_timestamp(1_705_315_840).unwrap();
        let (validated, _) = validate_measurement(&rec(weight_grams, 1_705_315_840), now).unwrap();
        assert_eq!(validated.weight_grams, weight_grams);
    }

    #[test_case(999; "one gram under minimum")]
    #[test_case(400_001; "one gram over maximum")]
    fn weight_boundaries_are_rejected(weight_grams: u32) {
        let now = OffsetDateTime::from_unix_timestamp(1_705_315_840).unwrap();
        assert!(validate_measurement(&rec(weight_grams, 1_705_315_840), now).is_none());
    }

    #[test]
    fn stale_timestamp_is_suspect_but_kept() {
        let now = OffsetDateTime::from_unix_timestamp(1_705_315_840).unwrap();
        let (validated, suspect) = validate_measurement(&rec(75_300, 1), now).unwrap();
        assert!(suspect);
        assert!(validated.timestamp_suspect);
    }

    #[test]
    fn future_timestamp_beyond_grace_window_is_suspect() {
        let now = OffsetDateTime::from_unix_timestamp(1_705_315_840).unwrap();
        let far_future = (now + Duration::hours(48)).unix_timestamp() as u32;
        let (_, suspect) = validate_measurement(&rec(75_300, far_future), now).unwrap();
        assert!(suspect);
    }

    #[test]
    fn timestamp_within_grace_window_is_not_suspect() {
        let now = OffsetDateTime::from_unix_timestamp(1_705_315_840).unwrap();
        let soon = (now + Duration::hours(1)).unix_timestamp() as u32;
        let (_, suspect) = validate_measurement(&rec(75_300, soon), now).unwrap();
        assert!(!suspect);
    }

    #[test]
    fn battery_percent_is_clamped() {
        use crate::codec::{UploadFrame, METADATA_LEN};
        let frame = UploadFrame {
            protocol_version: 3,
            header_firmware_hint: 1,
            battery_percent: 250,
            mac: [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF],
            auth_code: [0u8; 16],
            firmware_version: 1,
            scale_timestamp: 0,
            declared_measurement_count: 0,
            metadata_reserved: [0u8; METADATA_LEN - 7],
            measurements: vec![],
        };
        let result = validate_frame(&frame, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(result.battery_percent, 100);
    }
}
