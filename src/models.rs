pub mod ads;
pub mod referrals;
pub mod snapshots;
pub mod transactions;
pub mod users;
