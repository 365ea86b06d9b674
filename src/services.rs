use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::repositories::{api::ApiError, store::StoreError};

pub mod accounts;
pub mod playback;
pub mod referrals;
pub mod rewards;
pub mod session;
pub mod sync;
pub mod watch;

#[cfg(test)]
mod testing;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Watching ads requires a pro plan")]
    NotEligible,
    #[error("You have reached your daily limit of {0} ads. Please try again tomorrow.")]
    DailyLimitReached(usize),
    #[error("Ad {0} was already watched in the last 24 hours")]
    AlreadyWatched(String),
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] watch::SessionError),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}
