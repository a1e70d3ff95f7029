//! Value types for the entities the gateway persists.
//!
//! These are plain data -- no base classes, no behavior beyond small derived
//! accessors. Persistence and protocol concerns live in `store` and `codec`
//! respectively; this module is what they both agree on.

pub mod measurement;
pub mod raw_upload;
pub mod scale;
pub mod user;

pub use measurement::Measurement;
pub use raw_upload::RawUpload;
pub use scale::Scale;
pub use user::UserProfile;

/// Canonical lowercase, separator-free MAC representation (e.g.
/// `aabbccddeeff`), used as a scale's serial and as the measurement foreign
/// key.
pub fn mac_to_serial(mac: [u8; 6]) -> String {
    hex::encode(mac)
}

/// Canonical colon-separated hex MAC representation (e.g.
/// `AA:BB:CC:DD:EE:FF`), used for display and the scale identity's primary
/// key text form.
pub fn mac_to_canonical(mac: [u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}
