use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::models::{
    ads::{Ad, AdsEnvelope, AdsPage},
    referrals::Referrals,
    transactions::{
        AdsEarning, BalanceCredit, BalanceUpdate, Deposit, DepositAccount, NewDeposit,
        NewWithdrawal, Withdrawal, WithdrawalPayload, BALANCE_UPDATED,
    },
    users::{Credentials, NewUser, ProfileEnvelope, UserProfile},
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Network error: {0}")]
    Transport(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("Bad response format: {0}")]
    Decode(String),
}

impl ApiError {
    /// Transport-level failures, as opposed to the backend answering "no".
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Timeout(_) | ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout(e.to_string())
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

/// The remote watch-to-earn backend.
#[async_trait]
pub trait WatchApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<UserProfile, ApiError>;
    async fn signup(&self, user: &NewUser) -> Result<Option<UserProfile>, ApiError>;
    async fn get_profile(&self, uid: u64) -> Result<UserProfile, ApiError>;
    async fn get_withdrawals(&self, email: &str) -> Result<Vec<Withdrawal>, ApiError>;
    async fn get_deposits(&self, uid: u64) -> Result<Vec<Deposit>, ApiError>;
    async fn get_referrals(&self, uid: u64) -> Result<Referrals, ApiError>;
    async fn get_ads(&self, page: Option<u32>) -> Result<AdsPage, ApiError>;
    async fn credit_balance(&self, credit: BalanceCredit) -> Result<BalanceUpdate, ApiError>;
    async fn record_earning(&self, earning: &AdsEarning) -> Result<(), ApiError>;
    async fn get_earnings(&self, uid: u64) -> Result<Vec<AdsEarning>, ApiError>;
    async fn get_deposit_accounts(&self) -> Result<Vec<DepositAccount>, ApiError>;
    async fn submit_deposit(&self, deposit: &NewDeposit) -> Result<String, ApiError>;
    async fn submit_withdrawal(&self, withdrawal: &NewWithdrawal) -> Result<String, ApiError>;
}

pub struct HttpWatchApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpWatchApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::Transport(format!("{}: {}", base_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::from)?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;
        decode(response).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(message_of)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP error! status: {}", status.as_u16())
                } else {
                    body.trim().to_string()
                }
            });

        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn message_of(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Finds the user object in a login/signup reply, which may be wrapped in
/// `data.user`, `user` or `data`, or be the bare object.
pub fn extract_user(value: &Value) -> Option<UserProfile> {
    let candidates = [
        value.pointer("/data/user"),
        value.get("user"),
        value.get("data"),
        Some(value),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter(|candidate| {
            candidate.get("uid").is_some() || candidate.get("email").is_some()
        })
        .find_map(|candidate| serde_json::from_value(candidate.clone()).ok())
}

/// Some endpoints wrap lists in `{data: [...]}`, others return them bare.
fn unwrap_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ApiError> {
    let list = match value {
        Value::Object(mut object) => object
            .remove("data")
            .ok_or_else(|| ApiError::Decode("missing data field".to_string()))?,
        other => other,
    };

    serde_json::from_value(list).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl WatchApi for HttpWatchApi {
    async fn login(&self, credentials: &Credentials) -> Result<UserProfile, ApiError> {
        let reply: Value = self.post(&["login"], credentials).await?;
        extract_user(&reply).ok_or_else(|| ApiError::Decode("login reply has no user".to_string()))
    }

    async fn signup(&self, user: &NewUser) -> Result<Option<UserProfile>, ApiError> {
        let reply: Value = self.post(&["signup"], user).await?;
        Ok(extract_user(&reply))
    }

    async fn get_profile(&self, uid: u64) -> Result<UserProfile, ApiError> {
        let envelope: ProfileEnvelope = self.get(&["admin", "user", &uid.to_string()]).await?;

        match (envelope.success, envelope.data) {
            (true, Some(data)) => Ok(data.user),
            _ => Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "Failed to fetch user profile".to_string()),
            )),
        }
    }

    async fn get_withdrawals(&self, email: &str) -> Result<Vec<Withdrawal>, ApiError> {
        self.get(&["user", "withdrawals", email]).await
    }

    async fn get_deposits(&self, uid: u64) -> Result<Vec<Deposit>, ApiError> {
        self.get(&["user", "deposits", &uid.to_string()]).await
    }

    async fn get_referrals(&self, uid: u64) -> Result<Referrals, ApiError> {
        self.get(&["user", "referrals", &uid.to_string()]).await
    }

    async fn get_ads(&self, page: Option<u32>) -> Result<AdsPage, ApiError> {
        let mut url = self.endpoint(&["ads"])?;
        if let Some(page) = page {
            url.query_pairs_mut().append_pair("page", &page.to_string());
        }
        log::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let envelope: AdsEnvelope = decode(response).await?;

        match (envelope.success, envelope.data) {
            (true, Some(data)) => Ok(AdsPage {
                ads: data.ads.into_iter().map(Ad::from).collect(),
                pagination: data.pagination,
            }),
            _ => Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "Failed to fetch ads".to_string()),
            )),
        }
    }

    async fn credit_balance(&self, credit: BalanceCredit) -> Result<BalanceUpdate, ApiError> {
        log::info!(
            "Crediting balance: uid={}, amount={}",
            credit.uid,
            credit.amount
        );
        let update: BalanceUpdate = self.post(&["auto", "update", "balance"], &credit).await?;

        if update.message == BALANCE_UPDATED {
            Ok(update)
        } else {
            Err(ApiError::Rejected(update.message))
        }
    }

    async fn record_earning(&self, earning: &AdsEarning) -> Result<(), ApiError> {
        let _: Value = self.post(&["ads", "earning", "record"], earning).await?;
        Ok(())
    }

    async fn get_earnings(&self, uid: u64) -> Result<Vec<AdsEarning>, ApiError> {
        let reply: Value = self.get(&["ads", "earnings", &uid.to_string()]).await?;

        if reply.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(ApiError::Rejected(
                message_of(&reply).unwrap_or_else(|| "Failed to fetch earnings".to_string()),
            ));
        }
        unwrap_list(reply)
    }

    async fn get_deposit_accounts(&self) -> Result<Vec<DepositAccount>, ApiError> {
        let reply: Value = self.get(&["admin", "account"]).await?;
        unwrap_list(reply)
    }

    async fn submit_deposit(&self, deposit: &NewDeposit) -> Result<String, ApiError> {
        let reply: Value = self.post(&["deposite"], deposit).await?;
        Ok(message_of(&reply).unwrap_or_else(|| "Deposit request submitted".to_string()))
    }

    async fn submit_withdrawal(&self, withdrawal: &NewWithdrawal) -> Result<String, ApiError> {
        let payload = WithdrawalPayload::from(withdrawal);
        let reply: Value = self.post(&["withdrawal", "request"], &payload).await?;
        Ok(message_of(&reply).unwrap_or_else(|| "Withdrawal request submitted".to_string()))
    }
}
