use std::sync::Arc;

use super::store::{read_json, write_json, KeyValueStore, StoreError};
use crate::models::{snapshots::FinancialSnapshot, users::UserProfile};

const PROFILE_KEY: &str = "user";
const SNAPSHOT_KEY: &str = "userApiData";

/// Stored copies of the current user's profile and financial snapshot.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn KeyValueStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn get_profile(&self) -> Option<UserProfile> {
        read_json(self.store.as_ref(), PROFILE_KEY)
    }

    pub fn set_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        write_json(self.store.as_ref(), PROFILE_KEY, profile)
    }

    pub fn remove_profile(&self) -> Result<(), StoreError> {
        self.store.remove(PROFILE_KEY)
    }

    pub fn get_snapshot(&self) -> Option<FinancialSnapshot> {
        read_json(self.store.as_ref(), SNAPSHOT_KEY)
    }

    pub fn set_snapshot(&self, snapshot: &FinancialSnapshot) -> Result<(), StoreError> {
        write_json(self.store.as_ref(), SNAPSHOT_KEY, snapshot)
    }

    pub fn remove_snapshot(&self) -> Result<(), StoreError> {
        self.store.remove(SNAPSHOT_KEY)
    }
}
