//! Persistence interface.
//!
//! A single object-safe trait, so `ingest`, `registry`, and `directory`
//! never know whether they're talking to Postgres or (eventually) an
//! embedded file-backed store.

pub mod error;
#[cfg(test)]
pub mod fake;
pub mod postgres;

pub use error::StoreError;

use async_trait::async_trait;

use crate::domain::scale::ScaleContact;
use crate::domain::user::NewUserProfile;
use crate::domain::{Measurement, RawUpload, Scale, UserProfile};

/// A validated measurement ready to be persisted, keyed by (scale_mac,
/// measurement_id) so a duplicate or conflicting replay can be detected
/// before writing.
#[derive(Debug, Clone)]
pub struct MeasurementInsert {
    pub scale_mac: [u8; 6],
    pub measurement_id: u32,
    pub weight_grams: u32,
    pub impedance_ohms: u16,
    pub fat_raw_1: u16,
    pub fat_raw_2: u16,
    pub covariance: u16,
    pub timestamp: u32,
    pub user_slot: u8,
    pub is_guest: bool,
}

/// Outcome of attempting to insert one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No row existed for (mac, id); one was created.
    Inserted,
    /// A row already existed with identical field values; no-op.
    DuplicateIdentical,
    /// A row already existed with different field values; the original was
    /// kept and the caller should log a conflict.
    DuplicateConflicting,
}

/// Filters for `list_measurements`, mirroring the management API's query
/// parameters.
#[derive(Debug, Clone, Default)]
pub struct MeasurementFilter {
    pub user_id: Option<i64>,
    pub scale_mac: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Persistence operations the ingestion pipeline and management API need.
///
/// Every method that can fail due to the backing store being unreachable
/// returns [`StoreError::Unavailable`]; constraint conflicts the pipeline
/// expects to handle (duplicate measurement IDs) are reported as ordinary
/// `Ok` values, not errors -- see `insert_measurement_if_absent`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Create or update a scale's registry row. Idempotent: concurrent
    /// upserts for the same MAC resolve to a single row via the store's own
    /// unique-index conflict resolution, not an application-level lock.
    async fn upsert_scale(&self, contact: ScaleContact) -> Result<Scale, StoreError>;

    async fn get_scale(&self, mac: [u8; 6]) -> Result<Option<Scale>, StoreError>;

    async fn list_scales(&self) -> Result<Vec<Scale>, StoreError>;

    /// Insert a measurement if (mac, id) doesn't already exist. On conflict,
    /// compares the existing row's fields against `measurement` to decide
    /// between [`InsertOutcome::DuplicateIdentical`] and
    /// [`InsertOutcome::DuplicateConflicting`].
    async fn insert_measurement_if_absent(
        &self,
        measurement: MeasurementInsert,
    ) -> Result<InsertOutcome, StoreError>;

    async fn list_measurements(
        &self,
        filter: MeasurementFilter,
    ) -> Result<Vec<Measurement>, StoreError>;

    /// Most recent measurement for a user, newest first by timestamp.
    async fn latest_measurement(
        &self,
        user_id: i64,
    ) -> Result<Option<Measurement>, StoreError>;

    /// All active user profiles, in no particular order -- callers that need
    /// slot order use `directory::list_ordered`, which sorts this.
    async fn list_users_by_slot(&self) -> Result<Vec<UserProfile>, StoreError>;

    async fn create_user(
        &self,
        profile: NewUserProfile,
        slot: u8,
    ) -> Result<UserProfile, StoreError>;

    async fn delete_user(&self, id: i64) -> Result<(), StoreError>;

    /// Record one inbound request, success or failure. Called exactly once
    /// per upload, as the first step of the ingestion transaction.
    async fn record_raw_upload(&self, upload: RawUpload) -> Result<i64, StoreError>;

    async fn list_raw_uploads(&self, errors_only: bool) -> Result<Vec<RawUpload>, StoreError>;
}
