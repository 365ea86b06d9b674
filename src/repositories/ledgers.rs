use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::{read_json, write_json, KeyValueStore, StoreError};
use crate::models::transactions::AdsEarning;

const WATCH_HISTORY_KEY: &str = "watchHistory";
const DAILY_VISITS_KEY: &str = "dailyVisits";
const PENDING_CREDITS_KEY: &str = "pendingCredits";

pub const WATCH_WINDOW_HOURS: i64 = 24;
pub const WATCH_RETENTION_DAYS: i64 = 7;
pub const VISIT_RETENTION_DAYS: i64 = 30;

fn ads_earnings_key(uid: u64) -> String {
    format!("adsEarnings_{}", uid)
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CreditSource {
    AdReward { ad_id: String },
    DailyBonus { date: NaiveDate },
}

/// A balance credit applied locally that the backend has not confirmed yet.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PendingCredit {
    pub id: Uuid,
    pub uid: u64,
    pub amount: f64,
    pub source: CreditSource,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
}

impl PendingCredit {
    pub fn new(uid: u64, amount: f64, source: CreditSource, created_at: DateTime<Utc>) -> Self {
        PendingCredit {
            id: Uuid::new_v4(),
            uid,
            amount,
            source,
            created_at,
            attempts: 1,
        }
    }
}

/// Local-only ledgers: watch history, daily visits, unconfirmed credits and
/// the fallback copy of ad earnings.
#[derive(Clone)]
pub struct LedgerRepository {
    store: Arc<dyn KeyValueStore>,
}

impl LedgerRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn watch_history(&self) -> BTreeMap<String, DateTime<Utc>> {
        read_json(self.store.as_ref(), WATCH_HISTORY_KEY).unwrap_or_default()
    }

    /// Number of ads watched within the rolling 24 hour window ending at `now`.
    pub fn watch_count(&self, now: DateTime<Utc>) -> usize {
        let window_start = now - Duration::hours(WATCH_WINDOW_HOURS);

        self.watch_history()
            .values()
            .filter(|watched_at| **watched_at > window_start)
            .count()
    }

    /// Whether `ad_id` was watched within the rolling window ending at `now`.
    pub fn watched_recently(&self, ad_id: &str, now: DateTime<Utc>) -> bool {
        let window_start = now - Duration::hours(WATCH_WINDOW_HOURS);

        self.watch_history()
            .get(ad_id)
            .is_some_and(|watched_at| *watched_at > window_start)
    }

    pub fn record_watch(&self, ad_id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        let cutoff = now - Duration::days(WATCH_RETENTION_DAYS);

        let mut history = self.watch_history();
        history.retain(|_, watched_at| *watched_at > cutoff);
        history.insert(ad_id.to_string(), now);

        write_json(self.store.as_ref(), WATCH_HISTORY_KEY, &history)
    }

    fn daily_visits(&self) -> BTreeMap<NaiveDate, bool> {
        read_json(self.store.as_ref(), DAILY_VISITS_KEY).unwrap_or_default()
    }

    pub fn has_visited(&self, date: NaiveDate) -> bool {
        self.daily_visits().get(&date).copied().unwrap_or(false)
    }

    /// Marks `date` as consumed. Returns `false` when it already was.
    pub fn mark_visited(&self, date: NaiveDate) -> Result<bool, StoreError> {
        let mut visits = self.daily_visits();
        if visits.get(&date).copied().unwrap_or(false) {
            return Ok(false);
        }

        let cutoff = date - Duration::days(VISIT_RETENTION_DAYS);
        visits.retain(|visited, _| *visited > cutoff);
        visits.insert(date, true);

        write_json(self.store.as_ref(), DAILY_VISITS_KEY, &visits)?;
        Ok(true)
    }

    pub fn pending_credits(&self) -> Vec<PendingCredit> {
        read_json(self.store.as_ref(), PENDING_CREDITS_KEY).unwrap_or_default()
    }

    pub fn enqueue_credit(&self, credit: PendingCredit) -> Result<(), StoreError> {
        let mut pending = self.pending_credits();
        pending.push(credit);
        self.save_pending_credits(&pending)
    }

    pub fn save_pending_credits(&self, pending: &[PendingCredit]) -> Result<(), StoreError> {
        if pending.is_empty() {
            return self.store.remove(PENDING_CREDITS_KEY);
        }
        write_json(self.store.as_ref(), PENDING_CREDITS_KEY, &pending)
    }

    pub fn ads_earnings(&self, uid: u64) -> Vec<AdsEarning> {
        read_json(self.store.as_ref(), &ads_earnings_key(uid)).unwrap_or_default()
    }

    pub fn save_ads_earning(&self, earning: &AdsEarning) -> Result<(), StoreError> {
        let key = ads_earnings_key(earning.uid);
        let mut earnings = self.ads_earnings(earning.uid);
        earnings.push(earning.clone());
        write_json(self.store.as_ref(), &key, &earnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::store::MemoryStore;

    fn ledger() -> LedgerRepository {
        LedgerRepository::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn watch_count_covers_the_last_24_hours() {
        let ledger = ledger();
        let now = Utc::now();

        ledger.record_watch("old", now - Duration::hours(30)).unwrap();
        ledger.record_watch("recent", now - Duration::hours(2)).unwrap();
        ledger.record_watch("fresh", now).unwrap();

        assert_eq!(ledger.watch_count(now), 2);
        assert_eq!(ledger.watch_history().len(), 3);
    }

    #[test]
    fn recent_watches_are_tracked_per_ad() {
        let ledger = ledger();
        let now = Utc::now();

        ledger.record_watch("yesterday", now - Duration::hours(25)).unwrap();
        ledger.record_watch("today", now - Duration::hours(1)).unwrap();

        assert!(ledger.watched_recently("today", now));
        assert!(!ledger.watched_recently("yesterday", now));
        assert!(!ledger.watched_recently("never", now));
    }

    #[test]
    fn watch_history_prunes_past_retention() {
        let ledger = ledger();
        let now = Utc::now();

        ledger.record_watch("ancient", now - Duration::days(8)).unwrap();
        ledger.record_watch("today", now).unwrap();

        let history = ledger.watch_history();
        assert!(!history.contains_key("ancient"));
        assert!(history.contains_key("today"));
    }

    #[test]
    fn a_date_is_consumed_once() {
        let ledger = ledger();
        let today = Utc::now().date_naive();

        assert!(!ledger.has_visited(today));
        assert!(ledger.mark_visited(today).unwrap());
        assert!(!ledger.mark_visited(today).unwrap());
        assert!(ledger.has_visited(today));
    }

    #[test]
    fn visits_prune_past_retention() {
        let ledger = ledger();
        let today = Utc::now().date_naive();
        let long_ago = today - Duration::days(45);

        ledger.mark_visited(long_ago).unwrap();
        ledger.mark_visited(today).unwrap();

        assert!(!ledger.has_visited(long_ago));
        assert!(ledger.has_visited(today));
    }

    #[test]
    fn pending_credits_queue_and_clear() {
        let ledger = ledger();
        let credit = PendingCredit::new(
            9,
            1.0,
            CreditSource::AdReward {
                ad_id: "a1".to_string(),
            },
            Utc::now(),
        );

        ledger.enqueue_credit(credit.clone()).unwrap();
        assert_eq!(ledger.pending_credits(), vec![credit]);

        ledger.save_pending_credits(&[]).unwrap();
        assert!(ledger.pending_credits().is_empty());
    }

    #[test]
    fn ads_earnings_are_kept_per_user() {
        let ledger = ledger();
        let earning = AdsEarning {
            uid: 3,
            ad_id: "a1".to_string(),
            amount: 1.0,
            watched_at: Utc::now(),
        };

        ledger.save_ads_earning(&earning).unwrap();
        ledger.save_ads_earning(&earning).unwrap();

        assert_eq!(ledger.ads_earnings(3).len(), 2);
        assert!(ledger.ads_earnings(4).is_empty());
    }
}
