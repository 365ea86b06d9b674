use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::rewards::{ReconcileReport, RewardService};
use super::session::SessionCache;
use super::{RequestHandler, Service, ServiceError};
use crate::models::{snapshots::FinancialSnapshot, users::UserProfile};

pub enum SyncRequest {
    RefreshProfile {
        response: oneshot::Sender<Result<UserProfile, ServiceError>>,
    },
    RefreshFinancials {
        force: bool,
        response: oneshot::Sender<Result<FinancialSnapshot, ServiceError>>,
    },
    Reconcile {
        response: oneshot::Sender<Result<ReconcileReport, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct SyncRequestHandler {
    session: SessionCache,
    rewards: RewardService,
}

impl SyncRequestHandler {
    pub fn new(session: SessionCache, rewards: RewardService) -> Self {
        Self { session, rewards }
    }
}

#[async_trait]
impl RequestHandler<SyncRequest> for SyncRequestHandler {
    async fn handle_request(&self, request: SyncRequest) {
        match request {
            SyncRequest::RefreshProfile { response } => {
                let profile = self.session.refresh_profile().await;
                if let Err(e) = &profile {
                    log::warn!("Profile refresh failed: {}", e);
                }
                let _ = response.send(profile);
            }
            SyncRequest::RefreshFinancials { force, response } => {
                let snapshot = self.session.get_financial_snapshot(force).await;
                let _ = response.send(snapshot);
            }
            SyncRequest::Reconcile { response } => {
                let report = self.rewards.reconcile().await;
                if let Ok(report) = &report {
                    log::info!(
                        "Reconciled credits: {} confirmed, {} retained, {} dropped",
                        report.confirmed,
                        report.retained,
                        report.dropped
                    );
                }
                let _ = response.send(report);
            }
        }
    }
}

pub struct SyncService;

impl SyncService {
    pub fn new() -> Self {
        SyncService {}
    }
}

#[async_trait]
impl Service<SyncRequest, SyncRequestHandler> for SyncService {}

/// Spawns the sync service and returns a client for it.
pub fn start_sync_service(session: SessionCache, rewards: RewardService) -> SyncClient {
    let (sync_tx, mut sync_rx) = mpsc::channel(64);
    let mut sync_service = SyncService::new();

    tokio::spawn(async move {
        sync_service
            .run(SyncRequestHandler::new(session, rewards), &mut sync_rx)
            .await;
    });

    SyncClient { channel: sync_tx }
}

#[derive(Clone)]
pub struct SyncClient {
    channel: mpsc::Sender<SyncRequest>,
}

impl SyncClient {
    async fn call<T>(
        &self,
        request: SyncRequest,
        response: oneshot::Receiver<Result<T, ServiceError>>,
    ) -> Result<T, ServiceError> {
        self.channel
            .send(request)
            .await
            .map_err(|e| {
                ServiceError::Communication("Client => Sync".to_string(), e.to_string())
            })?;

        response.await.map_err(|e| {
            ServiceError::Communication("Sync => Client".to_string(), e.to_string())
        })?
    }

    pub async fn refresh_profile(&self) -> Result<UserProfile, ServiceError> {
        let (response, rx) = oneshot::channel();
        self.call(SyncRequest::RefreshProfile { response }, rx).await
    }

    pub async fn refresh_financials(
        &self,
        force: bool,
    ) -> Result<FinancialSnapshot, ServiceError> {
        let (response, rx) = oneshot::channel();
        self.call(SyncRequest::RefreshFinancials { force, response }, rx)
            .await
    }

    pub async fn reconcile(&self) -> Result<ReconcileReport, ServiceError> {
        let (response, rx) = oneshot::channel();
        self.call(SyncRequest::Reconcile { response }, rx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::Plan;
    use crate::services::testing::{memory_store, profile, rewards, FakeApi};
    use std::sync::Arc;

    fn client(api: Arc<FakeApi>) -> (SyncClient, SessionCache) {
        let store = memory_store();
        let session = SessionCache::new(store.clone(), api.clone());
        session.set_profile(&profile(Plan::Pro, "1.00")).unwrap();
        let rewards = RewardService::new(session.clone(), store, api, rewards());

        (start_sync_service(session.clone(), rewards), session)
    }

    #[tokio::test]
    async fn requests_are_answered_over_the_channel() {
        let api = Arc::new(FakeApi::new(Some(profile(Plan::Pro, "8.00"))));
        let (client, session) = client(api.clone());

        let refreshed = client.refresh_profile().await.unwrap();
        let snapshot = client.refresh_financials(false).await.unwrap();
        let report = client.reconcile().await.unwrap();

        assert_eq!(refreshed.total_balance.as_deref(), Some("8.00"));
        assert_eq!(session.get_profile().unwrap(), refreshed);
        assert_eq!(snapshot.referrals.invite_code, "HAMZA42");
        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test]
    async fn failures_are_forwarded_to_the_caller() {
        let api = Arc::new(FakeApi::new(None));
        let (client, session) = client(api);

        assert!(client.refresh_profile().await.is_err());
        assert_eq!(
            session.get_profile().unwrap().total_balance.as_deref(),
            Some("1.00")
        );
    }
}
