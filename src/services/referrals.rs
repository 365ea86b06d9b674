use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use super::session::SessionCache;
use super::ServiceError;
use crate::models::referrals::Team;

static QUERY_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ref=([^&]+)").unwrap());
static PATH_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/ref/([^/?]+)").unwrap());
static VALID_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,20}$").unwrap());

pub fn referral_link(base_url: &str, code: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(code.as_bytes()).collect();
    format!("{}/signup/ref={}", base_url.trim_end_matches('/'), encoded)
}

/// Pulls a referral code out of `ref=<code>` or `/ref/<code>`.
pub fn extract_referral_code(link: &str) -> Option<String> {
    let raw = QUERY_CODE
        .captures(link)
        .or_else(|| PATH_CODE.captures(link))
        .and_then(|captures| captures.get(1))?
        .as_str();

    let decoded: String = url::form_urlencoded::parse(format!("ref={}", raw).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())?;
    let decoded = decoded.trim();

    if decoded.is_empty() {
        return None;
    }
    Some(decoded.to_string())
}

pub fn validate_referral_code(code: &str) -> bool {
    VALID_CODE.is_match(code)
}

pub fn format_referral_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Deterministic code for users the backend has not assigned one to.
pub fn generate_referral_code(uid: u64, email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(uid.to_string().as_bytes());
    hasher.update(email.trim().to_lowercase().as_bytes());
    let digest = hasher.finalize();

    hex::encode_upper(&digest[..4])
}

/// The user's own invite code as the backend issued it: from the profile,
/// then the cached referral aggregate, else generated. Links carry this code
/// unchanged; `format_referral_code` is for display only.
pub fn invite_code(session: &SessionCache) -> Result<String, ServiceError> {
    let profile = session.get_profile().ok_or(ServiceError::NotLoggedIn)?;

    if let Some(code) = profile
        .invite_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        return Ok(code.to_string());
    }
    if let Some(snapshot) = session.cached_snapshot() {
        let code = snapshot.referrals.invite_code.trim();
        if !code.is_empty() {
            return Ok(code.to_string());
        }
    }

    let uid = profile.uid.ok_or(ServiceError::NotLoggedIn)?;
    let email = profile.email.unwrap_or_default();
    Ok(generate_referral_code(uid, &email))
}

pub async fn team(session: &SessionCache, force_refresh: bool) -> Result<Team, ServiceError> {
    let snapshot = session.get_financial_snapshot(force_refresh).await?;
    Ok(Team::from(&snapshot.referrals))
}
