use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Basic,
    Pro,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Preferences {
    pub fn defaults() -> Self {
        Preferences {
            notifications: Some(true),
            theme: Some(Theme::Light),
            language: Some("en".to_string()),
        }
    }

    pub fn merge(&mut self, update: Preferences) {
        if update.notifications.is_some() {
            self.notifications = update.notifications;
        }
        if update.theme.is_some() {
            self.theme = update.theme;
        }
        if update.language.is_some() {
            self.language = update.language;
        }
    }
}

/// The authenticated user's last known state.
///
/// Every field is optional: a missing field means the value is unknown, not
/// zero. The same type doubles as the partial update passed to
/// [`UserProfile::merge`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, alias = "phoneNumber", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(
        default,
        deserialize_with = "utils::de_decimal_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_balance: Option<String>,
    #[serde(
        default,
        deserialize_with = "utils::de_decimal_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_withdrawals: Option<String>,
    #[serde(default, alias = "referralCode", skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Shallow merge: every field present in `update` replaces the stored
    /// one, including the whole preference set.
    pub fn merge(&mut self, update: UserProfile) {
        let UserProfile {
            uid,
            name,
            email,
            phone,
            plan,
            total_balance,
            total_withdrawals,
            invite_code,
            level,
            last_login,
            preferences,
            extra,
        } = update;

        if uid.is_some() {
            self.uid = uid;
        }
        if name.is_some() {
            self.name = name;
        }
        if email.is_some() {
            self.email = email;
        }
        if phone.is_some() {
            self.phone = phone;
        }
        if plan.is_some() {
            self.plan = plan;
        }
        if total_balance.is_some() {
            self.total_balance = total_balance;
        }
        if total_withdrawals.is_some() {
            self.total_withdrawals = total_withdrawals;
        }
        if invite_code.is_some() {
            self.invite_code = invite_code;
        }
        if level.is_some() {
            self.level = level;
        }
        if last_login.is_some() {
            self.last_login = last_login;
        }
        if preferences.is_some() {
            self.preferences = preferences;
        }
        self.extra.extend(extra);
    }

    pub fn plan(&self) -> Plan {
        self.plan.unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.email.as_deref().filter(|email| !email.is_empty()))
            .unwrap_or("User")
    }

    pub fn initials(&self) -> String {
        self.name
            .as_deref()
            .and_then(|name| name.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }

    pub fn effective_preferences(&self) -> Preferences {
        self.preferences.clone().unwrap_or_else(Preferences::defaults)
    }

    pub fn balance_display(&self) -> String {
        utils::display_amount(self.total_balance.as_deref())
    }
}

/// Envelope returned by `GET /admin/user/{uid}`.
#[derive(Debug, Deserialize)]
pub struct ProfileEnvelope {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<ProfileData>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileData {
    pub user: UserProfile,
}

#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub invite_code: String,
}
