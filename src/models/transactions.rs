use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    #[serde(alias = "_id")]
    pub id: String,
    pub amount: f64,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    #[serde(alias = "_id")]
    pub id: String,
    pub amount: f64,
    pub status: DepositStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A bank account deposits can be sent to, from `GET /admin/account`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositAccount {
    pub bank_name: String,
    #[serde(alias = "accountTitle", alias = "accountHolder")]
    pub account_holder_name: String,
    pub account_number: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DepositMethod {
    Easypaisa,
    Jazzcash,
    Bank,
    Other,
}

impl std::str::FromStr for DepositMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easypaisa" => Ok(DepositMethod::Easypaisa),
            "jazzcash" => Ok(DepositMethod::Jazzcash),
            "bank" => Ok(DepositMethod::Bank),
            "other" => Ok(DepositMethod::Other),
            other => Err(format!("unknown deposit method: {}", other)),
        }
    }
}

/// Body of `POST /deposite`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeposit {
    pub uid: u64,
    pub amount: f64,
    #[serde(rename = "bankName")]
    pub method: DepositMethod,
    pub transaction_id: String,
    pub sender_name: String,
    pub sender_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
}

/// Method-specific payout details of a withdrawal.
#[derive(Clone, Debug, PartialEq)]
pub enum PayoutMethod {
    Bank {
        bank_name: String,
        account_holder_name: String,
        account_number: String,
    },
    Mobile {
        phone_number: String,
    },
    Card,
}

impl PayoutMethod {
    pub fn name(&self) -> &'static str {
        match self {
            PayoutMethod::Bank { .. } => "bank",
            PayoutMethod::Mobile { .. } => "mobile",
            PayoutMethod::Card => "card",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewWithdrawal {
    pub amount: f64,
    pub method: PayoutMethod,
    pub email_address: String,
}

/// Wire shape of `POST /withdrawal/request`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalPayload<'a> {
    pub amount: f64,
    pub payment_method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_holder_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<&'a str>,
    pub email_address: &'a str,
}

impl<'a> From<&'a NewWithdrawal> for WithdrawalPayload<'a> {
    fn from(withdrawal: &'a NewWithdrawal) -> Self {
        let mut payload = WithdrawalPayload {
            amount: withdrawal.amount,
            payment_method: withdrawal.method.name(),
            bank_name: None,
            account_holder_name: None,
            account_number: None,
            phone_number: None,
            email_address: &withdrawal.email_address,
        };

        match &withdrawal.method {
            PayoutMethod::Bank {
                bank_name,
                account_holder_name,
                account_number,
            } => {
                payload.bank_name = Some(bank_name);
                payload.account_holder_name = Some(account_holder_name);
                payload.account_number = Some(account_number);
            }
            PayoutMethod::Mobile { phone_number } => {
                payload.phone_number = Some(phone_number);
            }
            PayoutMethod::Card => {}
        }

        payload
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct BalanceCredit {
    pub uid: u64,
    pub amount: f64,
}

pub const BALANCE_UPDATED: &str = "Balance updated successfully";

/// Reply of `POST /auto/update/balance`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceUpdate {
    pub message: String,
    #[serde(default)]
    pub uid: Option<u64>,
    #[serde(default, deserialize_with = "utils::de_decimal_string")]
    pub new_balance: Option<String>,
}

/// One reward event, sent to `POST /ads/earning/record` and mirrored locally.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdsEarning {
    pub uid: u64,
    pub ad_id: String,
    pub amount: f64,
    pub watched_at: DateTime<Utc>,
}
