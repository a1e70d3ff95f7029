//! User directory: operator-managed profiles keyed by scale slot 0..7.

use std::sync::Arc;

use crate::codec::USER_SLOT_COUNT;
use crate::domain::user::NewUserProfile;
use crate::domain::UserProfile;
use crate::store::{Store, StoreError};

/// Errors specific to directory operations, distinct from [`StoreError`]
/// since "no free slot" is a business rule, not a persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("no free scale slot (all {USER_SLOT_COUNT} slots occupied)")]
    NoFreeSlot,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn Store>,
}

impl Directory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// All 8 slots, in order, `None` where empty.
    pub async fn list_ordered(&self) -> Result<[Option<UserProfile>; USER_SLOT_COUNT], StoreError> {
        let active = self.store.list_users_by_slot().await?;
        let mut slots: [Option<UserProfile>; USER_SLOT_COUNT] = Default::default();
        for profile in active {
            if let Some(slot) = slots.get_mut(profile.scale_slot as usize) {
                *slot = Some(profile);
            }
        }
        Ok(slots)
    }

    /// Create a profile in the lowest free slot.
    pub async fn create(&self, profile: NewUserProfile) -> Result<UserProfile, DirectoryError> {
        let occupied = self.list_ordered().await?;
        let slot = occupied
            .iter()
            .enumerate()
            .find(|(_, p)| p.is_none())
            .map(|(i, _)| i as u8)
            .ok_or(DirectoryError::NoFreeSlot)?;

        Ok(self.store.create_user(profile, slot).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.store.delete_user(id).await
    }
}

#[cfg(test)]
mod tests {
    // `Directory::create`'s slot-selection logic is covered end-to-end via
    // `ingest`'s tests against a fake in-memory Store, where a fresh
    // directory and a full one are both exercised (see ingest::tests).
}
