use std::sync::Arc;

use super::referrals::validate_referral_code;
use super::session::SessionCache;
use super::ServiceError;
use crate::models::{
    transactions::{DepositAccount, DepositMethod, NewDeposit, NewWithdrawal, PayoutMethod},
    users::{Credentials, NewUser, UserProfile},
};
use crate::repositories::api::WatchApi;

pub const MIN_DEPOSIT: f64 = 1.0;
pub const MIN_WITHDRAWAL: f64 = 1.0;

/// Deposit form as entered by the user; the uid comes from the session.
#[derive(Clone, Debug)]
pub struct DepositForm {
    pub amount: f64,
    pub method: DepositMethod,
    pub transaction_id: String,
    pub sender_name: String,
    pub sender_phone: String,
    pub screenshot_url: Option<String>,
}

fn required(field: &'static str, value: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(field, "This field is required"));
    }
    Ok(value.to_string())
}

fn email(field: &'static str, value: &str) -> Result<String, ServiceError> {
    let value = required(field, value)?;
    match value.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(value),
        _ => Err(ServiceError::validation(field, "Enter a valid email address")),
    }
}

fn amount(value: f64, minimum: f64) -> Result<f64, ServiceError> {
    if !value.is_finite() || value < minimum {
        return Err(ServiceError::validation(
            "amount",
            format!("Minimum amount is {}", minimum),
        ));
    }
    Ok(value)
}

/// Login, signup, logout and the money-moving forms.
#[derive(Clone)]
pub struct AccountService {
    session: SessionCache,
    api: Arc<dyn WatchApi>,
}

impl AccountService {
    pub fn new(session: SessionCache, api: Arc<dyn WatchApi>) -> Self {
        AccountService { session, api }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ServiceError> {
        let credentials = Credentials {
            email: required("email", email)?,
            password: required("password", password)?,
        };

        let profile = self.api.login(&credentials).await?;
        self.start_session(profile)
    }

    /// Registers a new user. The backend may answer without a user, in which
    /// case no session is started and `None` is returned.
    pub async fn signup(
        &self,
        name: &str,
        email_address: &str,
        password: &str,
        phone_number: &str,
        invite_code: Option<&str>,
    ) -> Result<Option<UserProfile>, ServiceError> {
        let invite_code = invite_code.map(str::trim).unwrap_or_default();
        if !invite_code.is_empty() && !validate_referral_code(invite_code) {
            return Err(ServiceError::validation(
                "invite_code",
                "Use 3-20 letters, digits, '_' or '-'",
            ));
        }

        let user = NewUser {
            name: required("name", name)?,
            email: email("email", email_address)?,
            password: required("password", password)?,
            phone_number: required("phone_number", phone_number)?,
            invite_code: invite_code.to_string(),
        };

        match self.api.signup(&user).await? {
            Some(profile) => self.start_session(profile).map(Some),
            None => {
                log::info!("Signup accepted without a user payload for {}", user.email);
                Ok(None)
            }
        }
    }

    fn start_session(&self, profile: UserProfile) -> Result<UserProfile, ServiceError> {
        self.session.set_profile(&profile)?;
        let profile = self.session.record_login()?.unwrap_or(profile);
        log::info!("Logged in as {}", profile.display_name());
        Ok(profile)
    }

    pub fn logout(&self) -> Result<(), ServiceError> {
        self.session.clear_profile()?;
        log::info!("Logged out");
        Ok(())
    }

    pub async fn deposit_accounts(&self) -> Result<Vec<DepositAccount>, ServiceError> {
        Ok(self.api.get_deposit_accounts().await?)
    }

    pub async fn submit_deposit(&self, form: DepositForm) -> Result<String, ServiceError> {
        let uid = self
            .session
            .get_profile()
            .and_then(|profile| profile.uid)
            .ok_or(ServiceError::NotLoggedIn)?;

        let deposit = NewDeposit {
            uid,
            amount: amount(form.amount, MIN_DEPOSIT)?,
            method: form.method,
            transaction_id: required("transaction_id", &form.transaction_id)?,
            sender_name: required("sender_name", &form.sender_name)?,
            sender_phone: required("sender_phone", &form.sender_phone)?,
            screenshot_url: form
                .screenshot_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        };

        let message = self.api.submit_deposit(&deposit).await?;
        log::info!("Deposit of {} submitted", deposit.amount);
        Ok(message)
    }

    pub async fn submit_withdrawal(
        &self,
        withdrawal: NewWithdrawal,
    ) -> Result<String, ServiceError> {
        if self.session.get_profile().is_none() {
            return Err(ServiceError::NotLoggedIn);
        }

        let method = match withdrawal.method {
            PayoutMethod::Bank {
                bank_name,
                account_holder_name,
                account_number,
            } => PayoutMethod::Bank {
                bank_name: required("bank_name", &bank_name)?,
                account_holder_name: required("account_holder_name", &account_holder_name)?,
                account_number: required("account_number", &account_number)?,
            },
            PayoutMethod::Mobile { phone_number } => PayoutMethod::Mobile {
                phone_number: required("phone_number", &phone_number)?,
            },
            PayoutMethod::Card => PayoutMethod::Card,
        };

        let request = NewWithdrawal {
            amount: amount(withdrawal.amount, MIN_WITHDRAWAL)?,
            method,
            email_address: email("email_address", &withdrawal.email_address)?,
        };

        let message = self.api.submit_withdrawal(&request).await?;
        log::info!(
            "Withdrawal of {} via {} submitted",
            request.amount,
            request.method.name()
        );
        Ok(message)
    }
}
