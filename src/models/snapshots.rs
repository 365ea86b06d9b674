use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::referrals::Referrals;
use super::transactions::{Deposit, Withdrawal};

pub const FRESHNESS_WINDOW_SECS: i64 = 5 * 60;

/// Cached aggregate of the user's remote financial records.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSnapshot {
    pub withdrawals: Vec<Withdrawal>,
    pub deposits: Vec<Deposit>,
    pub referrals: Referrals,
    pub last_updated: DateTime<Utc>,
}

impl FinancialSnapshot {
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.last_updated > Duration::seconds(FRESHNESS_WINDOW_SECS)
    }
}
