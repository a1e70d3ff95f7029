//! User profiles.

use time::OffsetDateTime;

/// Gender encoding observed on the wire: 0 = female, 1 = male.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn to_wire(self) -> u8 {
        match self {
            Gender::Female => 0,
            Gender::Male => 1,
        }
    }

    pub fn from_wire(value: u8) -> Self {
        match value {
            1 => Gender::Male,
            _ => Gender::Female,
        }
    }
}

/// An operator-managed user profile, delivered to the scale in every
/// response and never created or mutated by the scale itself.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub display_name: String,
    /// Unique among active profiles, 0..7.
    pub scale_slot: u8,
    pub height_mm: u16,
    pub age: u8,
    pub gender: Gender,
    pub min_weight_grams: u32,
    pub max_weight_grams: u32,
    pub created_at: OffsetDateTime,
}

/// Fields needed to create a new user profile; the slot is assigned by
/// `directory::create`, not supplied by the caller.
#[derive(Debug, Clone)]
pub struct NewUserProfile {
    pub display_name: String,
    pub height_mm: u16,
    pub age: u8,
    pub gender: Gender,
    pub min_weight_grams: u32,
    pub max_weight_grams: u32,
}
