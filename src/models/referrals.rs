use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Inactive,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvitedUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub status: MemberStatus,
}

/// Referral aggregate from `GET /user/referrals/{uid}`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Referrals {
    #[serde(default)]
    pub invite_code: String,
    #[serde(default)]
    pub total_referrals: u64,
    #[serde(default)]
    pub total_earnings: f64,
    #[serde(default)]
    pub invited_users: Vec<InvitedUser>,
}

/// Downline view derived from the referral aggregate.
#[derive(Clone, Debug, PartialEq)]
pub struct Team {
    pub leader_code: String,
    pub total_members: usize,
    pub active_members: usize,
    pub total_earnings: f64,
    pub members: Vec<InvitedUser>,
}

impl From<&Referrals> for Team {
    fn from(referrals: &Referrals) -> Self {
        let active_members = referrals
            .invited_users
            .iter()
            .filter(|member| member.status == MemberStatus::Active)
            .count();

        Team {
            leader_code: referrals.invite_code.clone(),
            total_members: referrals.invited_users.len(),
            active_members,
            total_earnings: referrals.total_earnings,
            members: referrals.invited_users.clone(),
        }
    }
}
