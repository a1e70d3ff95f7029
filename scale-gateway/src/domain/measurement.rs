//! Measurement readings.

use time::OffsetDateTime;

/// One weigh-in, keyed by (scale MAC, measurement ID).
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub scale_mac: String,
    pub measurement_id: u32,
    pub weight_grams: u32,
    pub impedance_ohms: u16,
    pub fat_raw_1: u16,
    pub fat_raw_2: u16,
    pub covariance: u16,
    pub timestamp: OffsetDateTime,
    pub user_slot: u8,
    pub is_guest: bool,
    pub received_at: OffsetDateTime,
}

impl Measurement {
    /// Weight in kilograms, derived at read time -- grams is canonical.
    pub fn weight_kg(&self) -> f64 {
        self.weight_grams as f64 / 1000.0
    }

    /// Weight in pounds, derived at read time.
    pub fn weight_lbs(&self) -> f64 {
        self.weight_kg() * 2.20462
    }

    /// Weight in stones, derived at read time.
    pub fn weight_stones(&self) -> f64 {
        self.weight_lbs() / 14.0
    }

    /// Derived body-fat percent, or `None` if no body-composition estimate
    /// was taken. Impedance zero means the scale took no bio-electrical
    /// impedance reading at all, so the raw fat readings (if any) are
    /// meaningless regardless of their own values.
    ///
    /// `(raw1 + raw2) / 2 / 10` in percent.
    pub fn body_fat_percent(&self) -> Option<f32> {
        if self.impedance_ohms == 0 {
            return None;
        }
        Some((self.fat_raw_1 as f32 + self.fat_raw_2 as f32) / 2.0 / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn measurement(impedance: u16, raw1: u16, raw2: u16) -> Measurement {
        Measurement {
            scale_mac: "AA:BB:CC:DD:EE:FF".into(),
            measurement_id: 1,
            weight_grams: 75_300,
            impedance_ohms: impedance,
            fat_raw_1: raw1,
            fat_raw_2: raw2,
            covariance: 0,
            timestamp: OffsetDateTime::UNIX_EPOCH,
            user_slot: 0,
            is_guest: true,
            received_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn derives_body_fat_percent_from_two_raws() {
        let m = measurement(520, 370, 370);
        assert_eq!(m.body_fat_percent(), Some(18.5));
    }

    #[test_case(0, 0, 0; "impedance and both raws zero")]
    #[test_case(0, 0, 100; "impedance zero, one raw zero")]
    #[test_case(0, 100, 100; "impedance zero, both raws nonzero")]
    fn body_fat_is_null_when_no_composition_estimate(impedance: u16, raw1: u16, raw2: u16) {
        let m = measurement(impedance, raw1, raw2);
        assert_eq!(m.body_fat_percent(), None);
    }

    #[test]
    fn weight_conversions_use_grams_as_canonical() {
        let m = measurement(520, 370, 370);
        assert_eq!(m.weight_kg(), 75.3);
        assert!((m.weight_lbs() - 166.0079).abs() < 0.01);
    }
}
