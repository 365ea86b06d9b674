use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use super::session::SessionCache;
use super::watch::{AdWatchSession, RemoteStatus};
use super::ServiceError;
use crate::models::{
    ads::{Ad, Pagination},
    transactions::{AdsEarning, BalanceCredit},
    users::{Plan, UserProfile},
};
use crate::repositories::{
    api::WatchApi,
    ledgers::{CreditSource, LedgerRepository, PendingCredit},
    store::KeyValueStore,
};
use crate::settings::Rewards;
use crate::utils;

/// How long the daily bonus notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_secs(5);

/// Queued credits are given up after this many failed submissions.
pub const MAX_CREDIT_ATTEMPTS: u32 = 5;

pub fn is_eligible(profile: &UserProfile) -> bool {
    profile.plan() == Plan::Pro
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub message: String,
    pub display_for: Duration,
}

/// Everything the ad-watching page renders on entry.
#[derive(Clone, Debug)]
pub struct WatchPage {
    pub profile: UserProfile,
    pub eligible: bool,
    pub ads: Vec<Ad>,
    pub pagination: Option<Pagination>,
    pub ads_error: Option<String>,
    pub watch_count: usize,
    pub daily_cap: usize,
    pub bonus: Option<Notice>,
}

impl WatchPage {
    pub fn can_watch_more(&self) -> bool {
        self.watch_count < self.daily_cap
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClaimOutcome {
    Credited {
        amount: f64,
        remote: RemoteStatus,
        balance: Option<String>,
    },
    AlreadyClaimed,
    NotClaimable,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub confirmed: usize,
    pub retained: usize,
    pub dropped: usize,
}

/// The ad-watching feature: eligibility, inventory, the daily cap, reward
/// claims, the daily visit bonus and reconciliation of unconfirmed credits.
#[derive(Clone)]
pub struct RewardService {
    session: SessionCache,
    ledgers: LedgerRepository,
    api: Arc<dyn WatchApi>,
    rewards: Rewards,
}

impl RewardService {
    pub fn new(
        session: SessionCache,
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn WatchApi>,
        rewards: Rewards,
    ) -> Self {
        let ledgers = LedgerRepository::new(store);

        RewardService {
            session,
            ledgers,
            api,
            rewards,
        }
    }

    pub fn watch_count(&self, now: DateTime<Utc>) -> usize {
        self.ledgers.watch_count(now)
    }

    /// Page entry. Prefers the remote profile for the eligibility check and
    /// only touches the ad inventory for eligible users.
    pub async fn enter_page(&self, page: Option<u32>) -> Result<WatchPage, ServiceError> {
        let local = self.session.get_profile().ok_or(ServiceError::NotLoggedIn)?;

        let profile = match self.session.refresh_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                log::warn!("Using cached profile for eligibility: {}", e);
                local
            }
        };

        let now = Utc::now();
        let mut watch_page = WatchPage {
            eligible: is_eligible(&profile),
            profile,
            ads: vec![],
            pagination: None,
            ads_error: None,
            watch_count: self.ledgers.watch_count(now),
            daily_cap: self.rewards.daily_cap,
            bonus: None,
        };

        if !watch_page.eligible {
            log::info!("User is not eligible to watch ads");
            return Ok(watch_page);
        }

        match self.api.get_ads(page).await {
            Ok(inventory) => {
                watch_page.ads = inventory.ads;
                watch_page.pagination = Some(inventory.pagination);
            }
            Err(e) => {
                log::error!("Error fetching ads: {}", e);
                watch_page.ads_error =
                    Some("Failed to load ads. Please try again later.".to_string());
            }
        }

        watch_page.bonus = match self.claim_daily_bonus(now).await {
            Ok(bonus) => bonus,
            Err(e) => {
                log::error!("Error granting daily visit bonus: {}", e);
                None
            }
        };
        if watch_page.bonus.is_some() {
            if let Some(profile) = self.session.get_profile() {
                watch_page.profile = profile;
            }
        }

        Ok(watch_page)
    }

    /// Grants the visit bonus at most once per local calendar date. The date
    /// is consumed whether or not the backend accepts the credit.
    pub async fn claim_daily_bonus(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<Notice>, ServiceError> {
        let Some(uid) = self.session.get_profile().and_then(|profile| profile.uid) else {
            return Ok(None);
        };

        let date = now.with_timezone(&Local).date_naive();
        if !self.ledgers.mark_visited(date)? {
            return Ok(None);
        }

        let amount = self.rewards.daily_bonus;
        let status = self
            .apply_credit(uid, amount, CreditSource::DailyBonus { date }, now, false)
            .await?;

        let message = match status {
            RemoteStatus::Success => format!(
                "Daily visit bonus: {} added to your balance",
                utils::format_amount(amount)
            ),
            _ => format!(
                "Daily visit bonus: {} will be added once the server confirms it",
                utils::format_amount(amount)
            ),
        };

        Ok(Some(Notice {
            message,
            display_for: NOTICE_DURATION,
        }))
    }

    /// `Idle -> Selected`, guarded by the rolling daily cap. An ad already
    /// watched inside the window cannot be selected again.
    pub fn select_ad(&self, ad: Ad, now: DateTime<Utc>) -> Result<AdWatchSession, ServiceError> {
        let profile = self.session.get_profile().ok_or(ServiceError::NotLoggedIn)?;
        if !is_eligible(&profile) {
            return Err(ServiceError::NotEligible);
        }

        let watched = self.ledgers.watch_count(now);
        if watched >= self.rewards.daily_cap {
            log::info!(
                "Daily limit reached: {} of {} ads watched",
                watched,
                self.rewards.daily_cap
            );
            return Err(ServiceError::DailyLimitReached(self.rewards.daily_cap));
        }
        if self.ledgers.watched_recently(&ad.id, now) {
            log::info!("Ad {} was already watched today", ad.id);
            return Err(ServiceError::AlreadyWatched(ad.id));
        }

        Ok(AdWatchSession::new(ad)?)
    }

    /// `Claimable -> Claimed`. Records the watch, credits the cached balance
    /// right away and then asks the backend to credit it. A failed remote
    /// credit keeps the local credit and is queued for reconciliation.
    pub async fn claim(
        &self,
        session: &mut AdWatchSession,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, ServiceError> {
        if session.is_claimed() {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }
        if !session.is_claimable() {
            return Ok(ClaimOutcome::NotClaimable);
        }

        let uid = self
            .session
            .get_profile()
            .and_then(|profile| profile.uid)
            .ok_or(ServiceError::NotLoggedIn)?;
        let ad_id = session.ad().id.clone();
        let amount = self.rewards.ad_reward;

        self.ledgers.record_watch(&ad_id, now)?;
        session.mark_claimed();
        session.set_remote_status(RemoteStatus::Updating);

        let status = self
            .apply_credit(
                uid,
                amount,
                CreditSource::AdReward {
                    ad_id: ad_id.clone(),
                },
                now,
                true,
            )
            .await?;
        session.set_remote_status(status);

        self.record_earning(AdsEarning {
            uid,
            ad_id,
            amount,
            watched_at: now,
        })
        .await;

        let balance = self
            .session
            .get_profile()
            .and_then(|profile| profile.total_balance);

        Ok(ClaimOutcome::Credited {
            amount,
            remote: status,
            balance,
        })
    }

    async fn apply_credit(
        &self,
        uid: u64,
        amount: f64,
        source: CreditSource,
        now: DateTime<Utc>,
        optimistic: bool,
    ) -> Result<RemoteStatus, ServiceError> {
        if optimistic {
            self.credit_locally(amount)?;
        }

        match self.api.credit_balance(BalanceCredit { uid, amount }).await {
            Ok(update) => {
                log::info!(
                    "Balance updated via API: +{}, new balance: {:?}",
                    amount,
                    update.new_balance
                );
                self.adopt_remote_balance(update.new_balance, amount, optimistic)?;
                Ok(RemoteStatus::Success)
            }
            Err(e) => {
                if e.is_network() {
                    log::warn!("Balance update failed, keeping local credit: {}", e);
                } else {
                    log::error!("Balance update rejected: {}", e);
                }
                self.ledgers
                    .enqueue_credit(PendingCredit::new(uid, amount, source, now))?;
                Ok(RemoteStatus::Failed)
            }
        }
    }

    fn credit_locally(&self, amount: f64) -> Result<(), ServiceError> {
        let current = self
            .session
            .get_profile()
            .and_then(|profile| profile.total_balance);

        self.session.update_profile(UserProfile {
            total_balance: Some(utils::credit_amount(current.as_deref(), amount)),
            ..Default::default()
        })?;
        Ok(())
    }

    fn adopt_remote_balance(
        &self,
        new_balance: Option<String>,
        amount: f64,
        already_credited: bool,
    ) -> Result<(), ServiceError> {
        match new_balance {
            Some(balance) => {
                self.session.update_profile(UserProfile {
                    total_balance: Some(balance),
                    ..Default::default()
                })?;
            }
            None if !already_credited => self.credit_locally(amount)?,
            None => {}
        }
        Ok(())
    }

    /// Best-effort telemetry; always mirrored to local storage.
    async fn record_earning(&self, earning: AdsEarning) {
        if let Err(e) = self.api.record_earning(&earning).await {
            log::warn!("Ads earning record API not available, saving locally: {}", e);
        }
        if let Err(e) = self.ledgers.save_ads_earning(&earning) {
            log::error!("Error saving local ads earning: {}", e);
        }
    }

    /// Ad earning history from the backend, or the local copy when the
    /// backend cannot provide it.
    pub async fn earnings(&self) -> Result<Vec<AdsEarning>, ServiceError> {
        let uid = self
            .session
            .get_profile()
            .and_then(|profile| profile.uid)
            .ok_or(ServiceError::NotLoggedIn)?;

        match self.api.get_earnings(uid).await {
            Ok(earnings) => Ok(earnings),
            Err(e) => {
                log::warn!("Ads earnings API not available, using local storage: {}", e);
                Ok(self.ledgers.ads_earnings(uid))
            }
        }
    }

    pub fn pending_credits(&self) -> Vec<PendingCredit> {
        self.ledgers.pending_credits()
    }

    /// Replays the current user's unconfirmed credits against the backend.
    pub async fn reconcile(&self) -> Result<ReconcileReport, ServiceError> {
        let uid = self
            .session
            .get_profile()
            .and_then(|profile| profile.uid)
            .ok_or(ServiceError::NotLoggedIn)?;

        let mut report = ReconcileReport::default();
        let mut remaining = Vec::new();

        for mut credit in self.ledgers.pending_credits() {
            if credit.uid != uid {
                remaining.push(credit);
                continue;
            }

            let request = BalanceCredit {
                uid,
                amount: credit.amount,
            };
            match self.api.credit_balance(request).await {
                Ok(update) => {
                    let already_credited = matches!(credit.source, CreditSource::AdReward { .. });
                    if let Err(e) =
                        self.adopt_remote_balance(update.new_balance, credit.amount, already_credited)
                    {
                        log::error!("Error updating cached balance for {}: {}", credit.id, e);
                    }
                    log::info!("Confirmed pending credit {}", credit.id);
                    report.confirmed += 1;
                }
                Err(e) => {
                    credit.attempts += 1;
                    if credit.attempts >= MAX_CREDIT_ATTEMPTS {
                        log::warn!(
                            "Dropping credit {} after {} attempts: {}",
                            credit.id,
                            credit.attempts,
                            e
                        );
                        report.dropped += 1;
                    } else {
                        log::warn!("Credit {} still pending: {}", credit.id, e);
                        remaining.push(credit);
                        report.retained += 1;
                    }
                }
            }
        }

        self.ledgers.save_pending_credits(&remaining)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{
        memory_store, profile, rewards, video_ad, CreditMode, FailingStore, FakeApi,
    };
    use crate::services::watch::Phase;

    fn service(api: Arc<FakeApi>, stored: Option<UserProfile>) -> RewardService {
        service_with_store(api, memory_store(), stored)
    }

    fn service_with_store(
        api: Arc<FakeApi>,
        store: Arc<dyn KeyValueStore>,
        stored: Option<UserProfile>,
    ) -> RewardService {
        let session = SessionCache::new(store.clone(), api.clone());
        if let Some(stored) = stored {
            session.set_profile(&stored).unwrap();
        }
        RewardService::new(session, store, api, rewards())
    }

    fn watched(service: &RewardService, id: &str) -> AdWatchSession {
        let mut session = service.select_ad(video_ad(id), Utc::now()).unwrap();
        session.begin_loading().unwrap();
        session.media_ready().unwrap();
        session.update_progress(100.0).unwrap();
        session
    }

    fn balance(service: &RewardService) -> Option<String> {
        service.session.get_profile().unwrap().total_balance
    }

    #[tokio::test]
    async fn basic_plan_never_fetches_ads() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Basic, "50.00"))));
        let service = service(api.clone(), Some(profile(Plan::Basic, "50.00")));

        let page = service.enter_page(None).await.unwrap();

        assert!(!page.eligible);
        assert!(page.ads.is_empty());
        assert!(page.bonus.is_none());
        assert_eq!(FakeApi::calls(&api.ads_calls), 0);
    }

    #[tokio::test]
    async fn remote_plan_wins_over_cached_plan() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "0"))));
        let service = service(api.clone(), Some(profile(Plan::Basic, "0")));

        let page = service.enter_page(None).await.unwrap();

        assert!(page.eligible);
        assert_eq!(page.ads.len(), 2);
        assert_eq!(FakeApi::calls(&api.ads_calls), 1);
    }

    #[tokio::test]
    async fn cached_plan_is_used_when_remote_is_down() {
        let api = Arc::new(FakeApi::new(None));
        let service = service(api.clone(), Some(profile(Plan::Pro, "0")));

        let page = service.enter_page(None).await.unwrap();

        assert!(page.eligible);
        assert_eq!(FakeApi::calls(&api.profile_calls), 1);
        assert_eq!(FakeApi::calls(&api.ads_calls), 1);
    }

    #[tokio::test]
    async fn missing_session_requires_login() {
        let api = Arc::new(FakeApi::new(None));
        let service = service(api, None);

        assert!(matches!(
            service.enter_page(None).await,
            Err(ServiceError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn claim_credits_balance_and_history() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "10.00"))));
        let service = service(api.clone(), Some(profile(Plan::Pro, "10.00")));
        let mut session = watched(&service, "a1");

        let outcome = service.claim(&mut session, Utc::now()).await.unwrap();

        assert_eq!(
            outcome,
            ClaimOutcome::Credited {
                amount: 1.0,
                remote: RemoteStatus::Success,
                balance: Some("11.00".to_string()),
            }
        );
        assert_eq!(session.phase(), Phase::Claimed);
        assert_eq!(session.remote_status(), RemoteStatus::Success);
        assert_eq!(service.watch_count(Utc::now()), 1);
        assert!(service.ledgers.watch_history().contains_key("a1"));
        assert_eq!(service.ledgers.ads_earnings(42).len(), 1);
        assert!(service.pending_credits().is_empty());
    }

    #[tokio::test]
    async fn second_claim_does_not_credit_again() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "10.00"))));
        let service = service(api.clone(), Some(profile(Plan::Pro, "10.00")));
        let mut session = watched(&service, "a1");

        service.claim(&mut session, Utc::now()).await.unwrap();
        let again = service.claim(&mut session, Utc::now()).await.unwrap();

        assert_eq!(again, ClaimOutcome::AlreadyClaimed);
        assert_eq!(FakeApi::calls(&api.credit_calls), 1);
        assert_eq!(balance(&service).as_deref(), Some("11.00"));
    }

    #[tokio::test]
    async fn unfinished_session_cannot_claim() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "10.00"))));
        let service = service(api.clone(), Some(profile(Plan::Pro, "10.00")));
        let mut session = service.select_ad(video_ad("a1"), Utc::now()).unwrap();

        let outcome = service.claim(&mut session, Utc::now()).await.unwrap();

        assert_eq!(outcome, ClaimOutcome::NotClaimable);
        assert_eq!(service.watch_count(Utc::now()), 0);
        assert_eq!(FakeApi::calls(&api.credit_calls), 0);
    }

    #[tokio::test]
    async fn timeout_still_credits_locally() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "10.00"))));
        api.set_credit_mode(CreditMode::Timeout);
        let service = service(api.clone(), Some(profile(Plan::Pro, "10.00")));
        let mut session = watched(&service, "a1");

        let outcome = service.claim(&mut session, Utc::now()).await.unwrap();

        assert_eq!(
            outcome,
            ClaimOutcome::Credited {
                amount: 1.0,
                remote: RemoteStatus::Failed,
                balance: Some("11.00".to_string()),
            }
        );
        assert!(session.is_claimed());
        assert_eq!(session.remote_status(), RemoteStatus::Failed);

        let pending = service.pending_credits();
        assert_eq!(pending.len(), 1);
        assert_eq!(
            pending[0].source,
            CreditSource::AdReward {
                ad_id: "a1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn sixth_selection_is_rejected() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "0"))));
        let service = service(api.clone(), Some(profile(Plan::Pro, "0")));

        for i in 0..5 {
            let mut session = watched(&service, &format!("ad-{}", i));
            service.claim(&mut session, Utc::now()).await.unwrap();
        }
        let before = service.ledgers.watch_history();

        let sixth = service.select_ad(video_ad("ad-5"), Utc::now());

        assert!(matches!(sixth, Err(ServiceError::DailyLimitReached(5))));
        assert_eq!(service.ledgers.watch_history(), before);
        assert_eq!(balance(&service).as_deref(), Some("5.00"));
    }

    #[tokio::test]
    async fn rewatching_one_ad_cannot_exceed_the_cap() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "0"))));
        let service = service(api.clone(), Some(profile(Plan::Pro, "0")));

        let mut claims = 0;
        for _ in 0..6 {
            let Ok(mut session) = service.select_ad(video_ad("a1"), Utc::now()) else {
                continue;
            };
            session.begin_loading().unwrap();
            session.media_ready().unwrap();
            session.update_progress(100.0).unwrap();
            let outcome = service.claim(&mut session, Utc::now()).await.unwrap();
            if matches!(outcome, ClaimOutcome::Credited { .. }) {
                claims += 1;
            }
        }

        assert_eq!(claims, 1);
        assert_eq!(FakeApi::calls(&api.credit_calls), 1);
        assert!(matches!(
            service.select_ad(video_ad("a1"), Utc::now()),
            Err(ServiceError::AlreadyWatched(id)) if id == "a1"
        ));
        assert_eq!(balance(&service).as_deref(), Some("1.00"));
    }

    #[tokio::test]
    async fn daily_bonus_is_granted_once_per_date() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "2.00"))));
        let service = service(api.clone(), Some(profile(Plan::Pro, "2.00")));

        let first = service.enter_page(None).await.unwrap();
        let second = service.enter_page(None).await.unwrap();
        let third = service.enter_page(None).await.unwrap();

        assert!(first.bonus.is_some());
        assert_eq!(first.bonus.unwrap().display_for, NOTICE_DURATION);
        assert!(second.bonus.is_none());
        assert!(third.bonus.is_none());
        assert_eq!(FakeApi::calls(&api.credit_calls), 1);
        assert_eq!(balance(&service).as_deref(), Some("3.00"));
    }

    #[tokio::test]
    async fn failed_bonus_still_consumes_the_date() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "2.00"))));
        api.set_credit_mode(CreditMode::Timeout);
        let service = service(api.clone(), Some(profile(Plan::Pro, "2.00")));

        let now = Utc::now();
        assert!(service.claim_daily_bonus(now).await.unwrap().is_some());
        assert!(service.claim_daily_bonus(now).await.unwrap().is_none());

        assert_eq!(FakeApi::calls(&api.credit_calls), 1);
        assert_eq!(balance(&service).as_deref(), Some("2.00"));
        assert_eq!(service.pending_credits().len(), 1);
    }

    #[tokio::test]
    async fn reconcile_confirms_queued_credits() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "10.00"))));
        api.set_credit_mode(CreditMode::Timeout);
        let service = service(api.clone(), Some(profile(Plan::Pro, "10.00")));
        let mut session = watched(&service, "a1");
        service.claim(&mut session, Utc::now()).await.unwrap();

        api.set_credit_mode(CreditMode::Succeed);
        let report = service.reconcile().await.unwrap();

        assert_eq!(
            report,
            ReconcileReport {
                confirmed: 1,
                retained: 0,
                dropped: 0
            }
        );
        assert!(service.pending_credits().is_empty());
        assert_eq!(balance(&service).as_deref(), Some("11.00"));
    }

    #[tokio::test]
    async fn confirmed_credits_leave_the_queue_when_balance_cannot_be_saved() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "10.00"))));
        api.set_credit_mode(CreditMode::Timeout);
        let store = Arc::new(FailingStore::default());
        let service = service_with_store(
            api.clone(),
            store.clone(),
            Some(profile(Plan::Pro, "10.00")),
        );
        let mut session = watched(&service, "a1");
        service.claim(&mut session, Utc::now()).await.unwrap();

        api.set_credit_mode(CreditMode::Succeed);
        store.fail_writes("user");
        let report = service.reconcile().await.unwrap();
        let again = service.reconcile().await.unwrap();

        assert_eq!(report.confirmed, 1);
        assert_eq!(again, ReconcileReport::default());
        assert!(service.pending_credits().is_empty());
        assert_eq!(FakeApi::calls(&api.credit_calls), 2);
    }

    #[tokio::test]
    async fn unsaved_visit_does_not_fail_the_page() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "2.00"))));
        let store = Arc::new(FailingStore::default());
        store.fail_writes("dailyVisits");
        let service = service_with_store(api.clone(), store, Some(profile(Plan::Pro, "2.00")));

        let page = service.enter_page(None).await.unwrap();

        assert_eq!(page.ads.len(), 2);
        assert!(page.bonus.is_none());
        assert_eq!(FakeApi::calls(&api.credit_calls), 0);
    }

    #[tokio::test]
    async fn reconcile_gives_up_after_max_attempts() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "10.00"))));
        api.set_credit_mode(CreditMode::Reject);
        let service = service(api.clone(), Some(profile(Plan::Pro, "10.00")));
        let mut session = watched(&service, "a1");
        service.claim(&mut session, Utc::now()).await.unwrap();

        for _ in 1..MAX_CREDIT_ATTEMPTS - 1 {
            let report = service.reconcile().await.unwrap();
            assert_eq!(report.retained, 1);
        }
        let last = service.reconcile().await.unwrap();

        assert_eq!(last.dropped, 1);
        assert!(service.pending_credits().is_empty());
    }

    #[tokio::test]
    async fn earnings_fall_back_to_local_copy() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "10.00"))));
        api.earnings_offline
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let service = service(api.clone(), Some(profile(Plan::Pro, "10.00")));
        let mut session = watched(&service, "a1");
        service.claim(&mut session, Utc::now()).await.unwrap();

        let earnings = service.earnings().await.unwrap();

        assert_eq!(earnings.len(), 1);
        assert_eq!(earnings[0].ad_id, "a1");
    }
}
