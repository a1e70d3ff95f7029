//! In-memory `Store` used by tests elsewhere in the crate so they don't need
//! a running Postgres.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{InsertOutcome, MeasurementFilter, MeasurementInsert, Store, StoreError};
use crate::domain::scale::ScaleContact;
use crate::domain::user::NewUserProfile;
use crate::domain::{mac_to_canonical, mac_to_serial, Measurement, RawUpload, Scale, UserProfile};

#[derive(Default)]
pub struct FakeStore {
    pub scales: Mutex<Vec<Scale>>,
    pub measurements: Mutex<Vec<(String, u32, MeasurementInsert)>>,
    pub users: Mutex<Vec<UserProfile>>,
    pub next_user_id: Mutex<i64>,
    pub raw_uploads: Mutex<Vec<RawUpload>>,
}

#[async_trait]
impl Store for FakeStore {
    async fn upsert_scale(&self, contact: ScaleContact) -> Result<Scale, StoreError> {
        let mac = mac_to_canonical(contact.mac);
        let mut scales = self.scales.lock().unwrap();
        if let Some(existing) = scales.iter_mut().find(|s| s.mac == mac) {
            existing.firmware_version = contact.firmware_version;
            existing.protocol_version = contact.protocol_version;
            existing.battery_percent = contact.battery_percent;
            return Ok(existing.clone());
        }
        let scale = Scale {
            mac: mac.clone(),
            serial: mac_to_serial(contact.mac),
            firmware_version: contact.firmware_version,
            protocol_version: contact.protocol_version,
            battery_percent: contact.battery_percent,
            last_ssid: contact.ssid,
            auth_code_hex: contact.auth_code.map(hex::encode).unwrap_or_default(),
            first_seen: OffsetDateTime::UNIX_EPOCH,
            last_seen: OffsetDateTime::UNIX_EPOCH,
        };
        scales.push(scale.clone());
        Ok(scale)
    }

    async fn get_scale(&self, mac: [u8; 6]) -> Result<Option<Scale>, StoreError> {
        let mac = mac_to_canonical(mac);
        Ok(self.scales.lock().unwrap().iter().find(|s| s.mac == mac).cloned())
    }

    async fn list_scales(&self) -> Result<Vec<Scale>, StoreError> {
        Ok(self.scales.lock().unwrap().clone())
    }

    async fn insert_measurement_if_absent(
        &self,
        measurement: MeasurementInsert,
    ) -> Result<InsertOutcome, StoreError> {
        let mac = mac_to_canonical(measurement.scale_mac);
        let mut rows = self.measurements.lock().unwrap();
        if let Some((_, _, existing)) = rows
            .iter()
            .find(|(m, id, _)| *m == mac && *id == measurement.measurement_id)
        {
            let identical = existing.weight_grams == measurement.weight_grams
                && existing.impedance_ohms == measurement.impedance_ohms
                && existing.fat_raw_1 == measurement.fat_raw_1
                && existing.fat_raw_2 == measurement.fat_raw_2
                && existing.covariance == measurement.covariance
                && existing.user_slot == measurement.user_slot
                && existing.timestamp == measurement.timestamp;
            return Ok(if identical {
                InsertOutcome::DuplicateIdentical
            } else {
                InsertOutcome::DuplicateConflicting
            });
        }
        let id = measurement.measurement_id;
        rows.push((mac, id, measurement));
        Ok(InsertOutcome::Inserted)
    }

    async fn list_measurements(
        &self,
        _filter: MeasurementFilter,
    ) -> Result<Vec<Measurement>, StoreError> {
        Ok(vec![])
    }

    async fn latest_measurement(&self, _user_id: i64) -> Result<Option<Measurement>, StoreError> {
        Ok(None)
    }

    async fn list_users_by_slot(&self) -> Result<Vec<UserProfile>, StoreError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn create_user(
        &self,
        profile: NewUserProfile,
        slot: u8,
    ) -> Result<UserProfile, StoreError> {
        let mut next_id = self.next_user_id.lock().unwrap();
        *next_id += 1;
        let user = UserProfile {
            id: *next_id,
            display_name: profile.display_name,
            scale_slot: slot,
            height_mm: profile.height_mm,
            age: profile.age,
            gender: profile.gender,
            min_weight_grams: profile.min_weight_grams,
            max_weight_grams: profile.max_weight_grams,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }

    async fn record_raw_upload(&self, upload: RawUpload) -> Result<i64, StoreError> {
        let mut uploads = self.raw_uploads.lock().unwrap();
        uploads.push(upload);
        Ok(uploads.len() as i64)
    }

    async fn list_raw_uploads(&self, _errors_only: bool) -> Result<Vec<RawUpload>, StoreError> {
        Ok(self.raw_uploads.lock().unwrap().clone())
    }
}
