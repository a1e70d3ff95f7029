//! PostgreSQL-backed [`Store`] implementation.
//!
//! Queries are plain `sqlx::query`/`query_as` against `&str` SQL, not the
//! `query!` compile-time macros -- those need a live database reachable at
//! build time, which this deployment's `DATABASE_URL` only describes at
//! runtime.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;

use crate::domain::scale::ScaleContact;
use crate::domain::user::{Gender, NewUserProfile};
use crate::domain::{mac_to_canonical, mac_to_serial, Measurement, RawUpload, Scale, UserProfile};

use super::{InsertOutcome, MeasurementFilter, MeasurementInsert, Store, StoreError};

/// Connects to Postgres and runs pending migrations.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPool::connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        StoreError::Unavailable(sqlx::Error::Migrate(Box::new(e)))
    })?;
    Ok(pool)
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_scale(&self, contact: ScaleContact) -> Result<Scale, StoreError> {
        let mac = mac_to_canonical(contact.mac);
        let serial = mac_to_serial(contact.mac);
        let auth_code_hex = contact.auth_code.map(hex::encode);

        let row = sqlx::query(
            r#"
            INSERT INTO scales (mac_address, serial, firmware_version, protocol_version,
                                 battery_percent, last_ssid, auth_code_hex, first_seen, last_seen)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
            ON CONFLICT (mac_address) DO UPDATE SET
                firmware_version = EXCLUDED.firmware_version,
                protocol_version = EXCLUDED.protocol_version,
                battery_percent = EXCLUDED.battery_percent,
                last_ssid = COALESCE(EXCLUDED.last_ssid, scales.last_ssid),
                auth_code_hex = COALESCE(EXCLUDED.auth_code_hex, scales.auth_code_hex),
                last_seen = now()
            RETURNING mac_address, serial, firmware_version, protocol_version,
                      battery_percent, last_ssid, auth_code_hex, first_seen, last_seen
            "#,
        )
        .bind(&mac)
        .bind(&serial)
        .bind(contact.firmware_version as i16)
        .bind(contact.protocol_version as i16)
        .bind(contact.battery_percent as i16)
        .bind(&contact.ssid)
        .bind(&auth_code_hex)
        .fetch_one(&self.pool)
        .await?;

        Ok(scale_from_row(&row))
    }

    async fn get_scale(&self, mac: [u8; 6]) -> Result<Option<Scale>, StoreError> {
        let mac = mac_to_canonical(mac);
        let row = sqlx::query(
            r#"SELECT mac_address, serial, firmware_version, protocol_version,
                      battery_percent, last_ssid, auth_code_hex, first_seen, last_seen
               FROM scales WHERE mac_address = $1"#,
        )
        .bind(&mac)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(scale_from_row))
    }

    async fn list_scales(&self) -> Result<Vec<Scale>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT mac_address, serial, firmware_version, protocol_version,
                      battery_percent, last_ssid, auth_code_hex, first_seen, last_seen
               FROM scales ORDER BY last_seen DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(scale_from_row).collect())
    }

    async fn insert_measurement_if_absent(
        &self,
        measurement: MeasurementInsert,
    ) -> Result<InsertOutcome, StoreError> {
        let mac = mac_to_canonical(measurement.scale_mac);

        let existing = sqlx::query(
            r#"SELECT weight_grams, impedance_ohms, fat_raw_1, fat_raw_2, covariance,
                      timestamp, user_slot
               FROM measurements WHERE scale_mac = $1 AND measurement_id = $2"#,
        )
        .bind(&mac)
        .bind(measurement.measurement_id as i64)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(existing) = existing {
            let expected_timestamp = OffsetDateTime::from_unix_timestamp(measurement.timestamp as i64)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH);
            let identical = existing.get::<i32, _>("weight_grams") as u32 == measurement.weight_grams
                && existing.get::<i32, _>("impedance_ohms") as u16 == measurement.impedance_ohms
                && existing.get::<i32, _>("fat_raw_1") as u16 == measurement.fat_raw_1
                && existing.get::<i32, _>("fat_raw_2") as u16 == measurement.fat_raw_2
                && existing.get::<i32, _>("covariance") as u16 == measurement.covariance
                && existing.get::<i16, _>("user_slot") as u8 == measurement.user_slot
                && existing.get::<OffsetDateTime, _>("timestamp") == expected_timestamp;

            return Ok(if identical {
                InsertOutcome::DuplicateIdentical
            } else {
                InsertOutcome::DuplicateConflicting
            });
        }

        let timestamp = OffsetDateTime::from_unix_timestamp(measurement.timestamp as i64)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);

        sqlx::query(
            r#"
            INSERT INTO measurements (scale_mac, measurement_id, weight_grams, impedance_ohms,
                                       fat_raw_1, fat_raw_2, covariance, timestamp, user_slot,
                                       is_guest, received_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
            ON CONFLICT (scale_mac, measurement_id) DO NOTHING
            "#,
        )
        .bind(&mac)
        .bind(measurement.measurement_id as i64)
        .bind(measurement.weight_grams as i32)
        .bind(measurement.impedance_ohms as i32)
        .bind(measurement.fat_raw_1 as i32)
        .bind(measurement.fat_raw_2 as i32)
        .bind(measurement.covariance as i32)
        .bind(timestamp)
        .bind(measurement.user_slot as i16)
        .bind(measurement.is_guest)
        .execute(&self.pool)
        .await?;

        Ok(InsertOutcome::Inserted)
    }

    async fn list_measurements(
        &self,
        filter: MeasurementFilter,
    ) -> Result<Vec<Measurement>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT m.scale_mac, m.measurement_id, m.weight_grams, m.impedance_ohms,
                   m.fat_raw_1, m.fat_raw_2, m.covariance, m.timestamp, m.user_slot,
                   m.is_guest, m.received_at
            FROM measurements m
            LEFT JOIN users u ON u.scale_slot = m.user_slot AND u.active
            WHERE ($1::BIGINT IS NULL OR u.id = $1)
              AND ($2::TEXT IS NULL OR m.scale_mac = $2)
            ORDER BY m.timestamp DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.user_id)
        .bind(&filter.scale_mac)
        .bind(if filter.limit > 0 { filter.limit } else { 50 })
        .bind(filter.offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(measurement_from_row).collect())
    }

    async fn latest_measurement(&self, user_id: i64) -> Result<Option<Measurement>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT m.scale_mac, m.measurement_id, m.weight_grams, m.impedance_ohms,
                   m.fat_raw_1, m.fat_raw_2, m.covariance, m.timestamp, m.user_slot,
                   m.is_guest, m.received_at
            FROM measurements m
            JOIN users u ON u.scale_slot = m.user_slot AND u.active
            WHERE u.id = $1
            ORDER BY m.timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(measurement_from_row))
    }

    async fn list_users_by_slot(&self) -> Result<Vec<UserProfile>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT id, display_name, scale_slot, height_mm, age, gender,
                      min_weight_grams, max_weight_grams, created_at
               FROM users WHERE active ORDER BY scale_slot"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn create_user(
        &self,
        profile: NewUserProfile,
        slot: u8,
    ) -> Result<UserProfile, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (display_name, scale_slot, height_mm, age, gender,
                                min_weight_grams, max_weight_grams, created_at, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now(), TRUE)
            RETURNING id, display_name, scale_slot, height_mm, age, gender,
                      min_weight_grams, max_weight_grams, created_at
            "#,
        )
        .bind(&profile.display_name)
        .bind(slot as i16)
        .bind(profile.height_mm as i32)
        .bind(profile.age as i16)
        .bind(profile.gender.to_wire() as i16)
        .bind(profile.min_weight_grams as i32)
        .bind(profile.max_weight_grams as i32)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_raw_upload(&self, upload: RawUpload) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO raw_uploads (received_at, scale_mac, request_bytes, response_bytes,
                                      parse_ok, error)
            VALUES (now(), $1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&upload.scale_mac)
        .bind(&upload.request_bytes)
        .bind(&upload.response_bytes)
        .bind(upload.parse_ok)
        .bind(&upload.error)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("id"))
    }

    async fn list_raw_uploads(&self, errors_only: bool) -> Result<Vec<RawUpload>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, received_at, scale_mac, request_bytes, response_bytes, parse_ok, error
            FROM raw_uploads
            WHERE (NOT $1) OR error IS NOT NULL OR NOT parse_ok
            ORDER BY received_at DESC
            "#,
        )
        .bind(errors_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| RawUpload {
                id: row.get("id"),
                received_at: row.get("received_at"),
                scale_mac: row.get("scale_mac"),
                request_bytes: row.get("request_bytes"),
                response_bytes: row.get("response_bytes"),
                parse_ok: row.get("parse_ok"),
                error: row.get("error"),
            })
            .collect())
    }
}

fn scale_from_row(row: &sqlx::postgres::PgRow) -> Scale {
    Scale {
        mac: row.get("mac_address"),
        serial: row.get("serial"),
        firmware_version: row.get::<i16, _>("firmware_version") as u8,
        protocol_version: row.get::<i16, _>("protocol_version") as u8,
        battery_percent: row.get::<i16, _>("battery_percent") as u8,
        last_ssid: row.get("last_ssid"),
        auth_code_hex: row.get::<Option<String>, _>("auth_code_hex").unwrap_or_default(),
        first_seen: row.get("first_seen"),
        last_seen: row.get("last_seen"),
    }
}

fn measurement_from_row(row: &sqlx::postgres::PgRow) -> Measurement {
    Measurement {
        scale_mac: row.get("scale_mac"),
        measurement_id: row.get::<i64, _>("measurement_id") as u32,
        weight_grams: row.get::<i32, _>("weight_grams") as u32,
        impedance_ohms: row.get::<i32, _>("impedance_ohms") as u16,
        fat_raw_1: row.get::<i32, _>("fat_raw_1") as u16,
        fat_raw_2: row.get::<i32, _>("fat_raw_2") as u16,
        covariance: row.get::<i32, _>("covariance") as u16,
        timestamp: row.get("timestamp"),
        user_slot: row.get::<i16, _>("user_slot") as u8,
        is_guest: row.get("is_guest"),
        received_at: row.get("received_at"),
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserProfile {
    UserProfile {
        id: row.get("id"),
        display_name: row.get("display_name"),
        scale_slot: row.get::<i16, _>("scale_slot") as u8,
        height_mm: row.get::<i32, _>("height_mm") as u16,
        age: row.get::<i16, _>("age") as u8,
        gender: Gender::from_wire(row.get::<i16, _>("gender") as u8),
        min_weight_grams: row.get::<i32, _>("min_weight_grams") as u32,
        max_weight_grams: row.get::<i32, _>("max_weight_grams") as u32,
        created_at: row.get("created_at"),
    }
}
