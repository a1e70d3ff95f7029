//! Scale identity.

use time::OffsetDateTime;

/// A scale's registry row: identity plus the fields mutated on every contact.
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    /// Canonical colon-separated hex MAC, e.g. `AA:BB:CC:DD:EE:FF`.
    pub mac: String,
    /// MAC lowercased with no separators, e.g. `aabbccddeeff`.
    pub serial: String,
    pub firmware_version: u8,
    pub protocol_version: u8,
    pub battery_percent: u8,
    pub last_ssid: Option<String>,
    /// 16-byte authorization code, stored as lowercase hex.
    pub auth_code_hex: String,
    pub first_seen: OffsetDateTime,
    pub last_seen: OffsetDateTime,
}

/// Fields a registry upsert is allowed to change on an existing scale.
///
/// Kept distinct from `Scale` so `store::Store::upsert_scale` has a minimal,
/// explicit surface instead of taking (and silently ignoring) fields like
/// `first_seen` that must never change after creation.
#[derive(Debug, Clone)]
pub struct ScaleContact {
    pub mac: [u8; 6],
    pub firmware_version: u8,
    pub protocol_version: u8,
    pub battery_percent: u8,
    pub ssid: Option<String>,
    pub auth_code: Option<[u8; 16]>,
}
