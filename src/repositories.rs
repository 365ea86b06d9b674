pub mod api;
pub mod ledgers;
pub mod media;
pub mod store;
pub mod users;
