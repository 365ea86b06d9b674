use std::sync::Arc;

use chrono::Utc;

use super::ServiceError;
use crate::models::{
    snapshots::FinancialSnapshot,
    users::{Preferences, UserProfile},
};
use crate::repositories::{api::WatchApi, store::KeyValueStore, users::UserRepository};

/// Session context: the last known profile, read synchronously, and the
/// staleness-aware financial snapshot.
#[derive(Clone)]
pub struct SessionCache {
    repository: UserRepository,
    api: Arc<dyn WatchApi>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn KeyValueStore>, api: Arc<dyn WatchApi>) -> Self {
        let repository = UserRepository::new(store);

        SessionCache { repository, api }
    }

    pub fn get_profile(&self) -> Option<UserProfile> {
        self.repository.get_profile()
    }

    pub fn set_profile(&self, profile: &UserProfile) -> Result<(), ServiceError> {
        self.repository.set_profile(profile)?;
        Ok(())
    }

    /// Shallow-merges `update` into the stored profile. Does nothing when no
    /// profile is stored.
    pub fn update_profile(&self, update: UserProfile) -> Result<Option<UserProfile>, ServiceError> {
        let Some(mut profile) = self.get_profile() else {
            log::debug!("No stored profile, skipping update");
            return Ok(None);
        };

        profile.merge(update);
        self.repository.set_profile(&profile)?;

        Ok(Some(profile))
    }

    pub fn update_preferences(
        &self,
        update: Preferences,
    ) -> Result<Option<UserProfile>, ServiceError> {
        let Some(profile) = self.get_profile() else {
            return Ok(None);
        };

        let mut preferences = profile.preferences.unwrap_or_default();
        preferences.merge(update);

        self.update_profile(UserProfile {
            preferences: Some(preferences),
            ..Default::default()
        })
    }

    pub fn record_login(&self) -> Result<Option<UserProfile>, ServiceError> {
        self.update_profile(UserProfile {
            last_login: Some(Utc::now()),
            ..Default::default()
        })
    }

    pub fn clear_profile(&self) -> Result<(), ServiceError> {
        self.repository.remove_profile()?;
        self.repository.remove_snapshot()?;
        Ok(())
    }

    /// Fetches `GET /admin/user/{uid}` and merges it into the stored profile.
    /// On failure the stored profile is left untouched.
    pub async fn refresh_profile(&self) -> Result<UserProfile, ServiceError> {
        let uid = self
            .get_profile()
            .and_then(|profile| profile.uid)
            .ok_or(ServiceError::NotLoggedIn)?;

        let remote = self.api.get_profile(uid).await?;
        self.update_profile(remote)?
            .ok_or(ServiceError::NotLoggedIn)
    }

    pub fn cached_snapshot(&self) -> Option<FinancialSnapshot> {
        self.repository.get_snapshot()
    }

    /// Returns the cached snapshot while it is fresh; otherwise refetches
    /// withdrawals, deposits and referrals concurrently. A failed refetch
    /// falls back to the cached snapshot when there is one.
    pub async fn get_financial_snapshot(
        &self,
        force_refresh: bool,
    ) -> Result<FinancialSnapshot, ServiceError> {
        let cached = self.repository.get_snapshot();

        if !force_refresh {
            if let Some(snapshot) = &cached {
                if !snapshot.is_stale(Utc::now()) {
                    log::debug!("Serving financial snapshot from cache");
                    return Ok(snapshot.clone());
                }
            }
        }

        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                if let Err(e) = self.repository.set_snapshot(&snapshot) {
                    log::error!("Could not cache financial snapshot: {}", e);
                }
                Ok(snapshot)
            }
            Err(e) => match cached {
                Some(snapshot) => {
                    log::warn!("Financial refresh failed, using cached data: {}", e);
                    Ok(snapshot)
                }
                None => Err(e),
            },
        }
    }

    async fn fetch_snapshot(&self) -> Result<FinancialSnapshot, ServiceError> {
        let profile = self.get_profile().ok_or(ServiceError::NotLoggedIn)?;
        let uid = profile.uid.ok_or(ServiceError::NotLoggedIn)?;
        let email = profile
            .email
            .ok_or_else(|| ServiceError::validation("email", "Profile has no email address"))?;

        let (withdrawals, deposits, referrals) = tokio::join!(
            self.api.get_withdrawals(&email),
            self.api.get_deposits(uid),
            self.api.get_referrals(uid),
        );

        Ok(FinancialSnapshot {
            withdrawals: withdrawals?,
            deposits: deposits?,
            referrals: referrals?,
            last_updated: Utc::now(),
        })
    }
}
