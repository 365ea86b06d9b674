use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{
    ads::{Ad, AdKind, AdsPage, Pagination},
    referrals::Referrals,
    transactions::{
        AdsEarning, BalanceCredit, BalanceUpdate, Deposit, DepositAccount, NewDeposit,
        NewWithdrawal, Withdrawal, BALANCE_UPDATED,
    },
    users::{Credentials, NewUser, Plan, UserProfile},
};
use crate::repositories::{
    api::{ApiError, WatchApi},
    store::{KeyValueStore, MemoryStore, StoreError},
};
use crate::settings::Rewards;
use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreditMode {
    Succeed,
    Timeout,
    Reject,
}

/// In-memory backend used by the service tests.
pub struct FakeApi {
    pub profile: Mutex<Option<UserProfile>>,
    pub ads: Vec<Ad>,
    pub server_balance: Mutex<f64>,
    pub credit_mode: Mutex<CreditMode>,
    pub financials_offline: AtomicBool,
    pub earnings_offline: AtomicBool,
    pub submissions: Mutex<Vec<String>>,
    pub profile_calls: AtomicUsize,
    pub ads_calls: AtomicUsize,
    pub credit_calls: AtomicUsize,
    pub withdrawal_calls: AtomicUsize,
    pub deposit_calls: AtomicUsize,
    pub referral_calls: AtomicUsize,
    pub earning_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new(profile: Option<UserProfile>) -> Self {
        let server_balance = profile
            .as_ref()
            .and_then(|p| p.total_balance.as_deref())
            .and_then(utils::parse_amount)
            .unwrap_or(0.0);

        FakeApi {
            profile: Mutex::new(profile),
            ads: vec![video_ad("a1"), video_ad("a2")],
            server_balance: Mutex::new(server_balance),
            credit_mode: Mutex::new(CreditMode::Succeed),
            financials_offline: AtomicBool::new(false),
            earnings_offline: AtomicBool::new(false),
            submissions: Mutex::new(Vec::new()),
            profile_calls: AtomicUsize::new(0),
            ads_calls: AtomicUsize::new(0),
            credit_calls: AtomicUsize::new(0),
            withdrawal_calls: AtomicUsize::new(0),
            deposit_calls: AtomicUsize::new(0),
            referral_calls: AtomicUsize::new(0),
            earning_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_credit_mode(&self, mode: CreditMode) {
        *self.credit_mode.lock().unwrap() = mode;
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub fn video_ad(id: &str) -> Ad {
    Ad {
        id: id.to_string(),
        name: format!("Ad {}", id),
        kind: AdKind::Video {
            url: format!("https://cdn.example.com/{}.mp4", id),
        },
        image_url: None,
        link: None,
        duration_secs: 30,
    }
}

pub fn profile(plan: Plan, balance: &str) -> UserProfile {
    UserProfile {
        uid: Some(42),
        name: Some("Hamza".to_string()),
        email: Some("hamza@example.com".to_string()),
        plan: Some(plan),
        total_balance: Some(balance.to_string()),
        invite_code: Some("HAMZA42".to_string()),
        ..Default::default()
    }
}

pub fn rewards() -> Rewards {
    Rewards {
        ad_reward: 1.0,
        daily_bonus: 1.0,
        daily_cap: 5,
    }
}

pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

/// Memory store whose writes to selected keys fail.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    failing: Mutex<Vec<String>>,
}

impl FailingStore {
    pub fn fail_writes(&self, key: &str) {
        self.failing.lock().unwrap().push(key.to_string());
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().iter().any(|failing| failing == key) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.remove(key)
    }
}

#[async_trait]
impl WatchApi for FakeApi {
    async fn login(&self, credentials: &Credentials) -> Result<UserProfile, ApiError> {
        if credentials.password != "secret" {
            return Err(ApiError::Status {
                status: 401,
                message: "Invalid credentials".to_string(),
            });
        }
        self.profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Decode("no user".to_string()))
    }

    async fn signup(&self, user: &NewUser) -> Result<Option<UserProfile>, ApiError> {
        if user.email == "taken@example.com" {
            return Err(ApiError::Status {
                status: 409,
                message: "Email already registered".to_string(),
            });
        }
        Ok(Some(UserProfile {
            uid: Some(100),
            name: Some(user.name.clone()),
            email: Some(user.email.clone()),
            plan: Some(Plan::Basic),
            total_balance: Some("0".to_string()),
            ..Default::default()
        }))
    }

    async fn get_profile(&self, _uid: u64) -> Result<UserProfile, ApiError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let mut profile = self
            .profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Transport("connection refused".to_string()))?;
        profile.total_balance = Some(utils::format_amount(*self.server_balance.lock().unwrap()));
        Ok(profile)
    }

    async fn get_withdrawals(&self, _email: &str) -> Result<Vec<Withdrawal>, ApiError> {
        self.withdrawal_calls.fetch_add(1, Ordering::SeqCst);
        if self.financials_offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("offline".to_string()));
        }
        Ok(vec![])
    }

    async fn get_deposits(&self, _uid: u64) -> Result<Vec<Deposit>, ApiError> {
        self.deposit_calls.fetch_add(1, Ordering::SeqCst);
        if self.financials_offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("offline".to_string()));
        }
        Ok(vec![])
    }

    async fn get_referrals(&self, _uid: u64) -> Result<Referrals, ApiError> {
        self.referral_calls.fetch_add(1, Ordering::SeqCst);
        if self.financials_offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("offline".to_string()));
        }
        Ok(Referrals {
            invite_code: "HAMZA42".to_string(),
            ..Default::default()
        })
    }

    async fn get_ads(&self, _page: Option<u32>) -> Result<AdsPage, ApiError> {
        self.ads_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AdsPage {
            ads: self.ads.clone(),
            pagination: Pagination {
                current_page: 1,
                total_pages: 1,
                total_ads: self.ads.len() as u32,
                has_next_page: false,
                has_prev_page: false,
            },
        })
    }

    async fn credit_balance(&self, credit: BalanceCredit) -> Result<BalanceUpdate, ApiError> {
        self.credit_calls.fetch_add(1, Ordering::SeqCst);
        match *self.credit_mode.lock().unwrap() {
            CreditMode::Succeed => {
                let mut balance = self.server_balance.lock().unwrap();
                *balance += credit.amount;
                Ok(BalanceUpdate {
                    message: BALANCE_UPDATED.to_string(),
                    uid: Some(credit.uid),
                    new_balance: Some(utils::format_amount(*balance)),
                })
            }
            CreditMode::Timeout => Err(ApiError::Timeout("operation timed out".to_string())),
            CreditMode::Reject => Err(ApiError::Rejected("User not found".to_string())),
        }
    }

    async fn record_earning(&self, _earning: &AdsEarning) -> Result<(), ApiError> {
        self.earning_calls.fetch_add(1, Ordering::SeqCst);
        if self.earnings_offline.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 404,
                message: "Not Found".to_string(),
            });
        }
        Ok(())
    }

    async fn get_earnings(&self, uid: u64) -> Result<Vec<AdsEarning>, ApiError> {
        if self.earnings_offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("offline".to_string()));
        }
        Ok(vec![AdsEarning {
            uid,
            ad_id: "remote".to_string(),
            amount: 1.0,
            watched_at: Utc::now(),
        }])
    }

    async fn get_deposit_accounts(&self) -> Result<Vec<DepositAccount>, ApiError> {
        Ok(vec![DepositAccount {
            bank_name: "EasyPaisa / JazzCash".to_string(),
            account_holder_name: "UK ADS".to_string(),
            account_number: "03001234567".to_string(),
        }])
    }

    async fn submit_deposit(&self, deposit: &NewDeposit) -> Result<String, ApiError> {
        if deposit.transaction_id == "DUPLICATE" {
            return Err(ApiError::Status {
                status: 400,
                message: "Transaction ID already used".to_string(),
            });
        }
        self.submissions
            .lock()
            .unwrap()
            .push(format!("deposit:{}", deposit.amount));
        Ok("Deposit submitted".to_string())
    }

    async fn submit_withdrawal(&self, withdrawal: &NewWithdrawal) -> Result<String, ApiError> {
        self.submissions
            .lock()
            .unwrap()
            .push(format!("withdrawal:{}:{}", withdrawal.method.name(), withdrawal.amount));
        Ok("Withdrawal request submitted".to_string())
    }
}
