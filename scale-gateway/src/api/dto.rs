//! JSON data transfer objects for the management API.
//!
//! These types define the API contract served under `/api`; they are kept
//! distinct from the `domain` value types so persistence concerns (IDs,
//! `OffsetDateTime`) don't leak into the wire contract, and vice versa.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};

use crate::domain::user::Gender;
use crate::domain::{Measurement, RawUpload, Scale, UserProfile};
use crate::units::format_weight;

fn rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthDto {
    pub status: &'static str,
    pub db: &'static str,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScaleDto {
    pub mac: String,
    pub serial: String,
    pub firmware_version: u8,
    pub protocol_version: u8,
    pub battery_percent: u8,
    pub last_ssid: Option<String>,
    pub first_seen: String,
    pub last_seen: String,
}

impl From<Scale> for ScaleDto {
    fn from(s: Scale) -> Self {
        ScaleDto {
            mac: s.mac,
            serial: s.serial,
            firmware_version: s.firmware_version,
            protocol_version: s.protocol_version,
            battery_percent: s.battery_percent,
            last_ssid: s.last_ssid,
            first_seen: rfc3339(s.first_seen),
            last_seen: rfc3339(s.last_seen),
        }
    }
}

/// A measurement rendered in the server's configured weight unit.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MeasurementDto {
    pub scale_mac: String,
    pub measurement_id: u32,
    pub scale_slot: u8,
    pub is_guest: bool,
    pub weight: f64,
    pub weight_unit: String,
    pub body_fat_percent: Option<f32>,
    pub timestamp: String,
    pub received_at: String,
}

impl MeasurementDto {
    pub fn from_domain(m: Measurement, unit: crate::codec::WeightUnit) -> Self {
        let weight = format_weight(m.weight_grams, unit);
        let body_fat_percent = m.body_fat_percent();
        MeasurementDto {
            scale_mac: m.scale_mac,
            measurement_id: m.measurement_id,
            scale_slot: m.user_slot,
            is_guest: m.is_guest,
            weight,
            weight_unit: unit.to_string(),
            body_fat_percent,
            timestamp: rfc3339(m.timestamp),
            received_at: rfc3339(m.received_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub display_name: String,
    pub scale_slot: u8,
    pub height_cm: f32,
    pub age: u8,
    pub gender: &'static str,
    pub min_weight_kg: f64,
    pub max_weight_kg: f64,
}

impl From<UserProfile> for UserDto {
    fn from(u: UserProfile) -> Self {
        UserDto {
            id: u.id,
            display_name: u.display_name,
            scale_slot: u.scale_slot,
            height_cm: u.height_mm as f32 / 10.0,
            age: u.age,
            gender: match u.gender {
                Gender::Female => "female",
                Gender::Male => "male",
            },
            min_weight_kg: u.min_weight_grams as f64 / 1000.0,
            max_weight_kg: u.max_weight_grams as f64 / 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RawUploadDto {
    pub id: i64,
    pub received_at: String,
    pub scale_mac: Option<String>,
    pub request_len: usize,
    pub response_len: usize,
    pub parse_ok: bool,
    pub error: Option<String>,
}

impl From<RawUpload> for RawUploadDto {
    fn from(r: RawUpload) -> Self {
        RawUploadDto {
            id: r.id,
            received_at: rfc3339(r.received_at),
            scale_mac: r.scale_mac,
            request_len: r.request_bytes.len(),
            response_len: r.response_bytes.len(),
            parse_ok: r.parse_ok,
            error: r.error,
        }
    }
}

/// Query parameters for `GET /api/measurements`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct MeasurementQuery {
    pub user_id: Option<i64>,
    pub scale_mac: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct LatestMeasurementQuery {
    pub user_id: i64,
}

/// Query parameters for `POST /api/users`; the scale slot is assigned by
/// `directory::create`, not supplied here.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct CreateUserQuery {
    pub name: String,
    pub height_cm: f32,
    pub age: u8,
    pub gender: String,
    pub min_kg: Option<f64>,
    pub max_kg: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct RawUploadQuery {
    #[serde(default)]
    pub errors_only: bool,
}
