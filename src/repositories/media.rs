use std::time::Duration;

use futures_util::{Stream, StreamExt, TryStreamExt};

use super::api::ApiError;

/// An opened media source: its advertised length and a stream of received
/// chunk sizes.
pub struct MediaStream {
    pub content_length: Option<u64>,
    pub chunks: std::pin::Pin<Box<dyn Stream<Item = Result<usize, ApiError>> + Send>>,
}

pub struct MediaRepository {
    client: reqwest::Client,
}

impl MediaRepository {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(ApiError::from)?;

        Ok(Self { client })
    }

    pub async fn open(&self, url: &str) -> Result<MediaStream, ApiError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: format!("Video could not be loaded: {}", url),
            });
        }

        let content_length = response.content_length();
        let chunks = response
            .bytes_stream()
            .map_err(ApiError::from)
            .map(|chunk| chunk.map(|bytes| bytes.len()));

        Ok(MediaStream {
            content_length,
            chunks: Box::pin(chunks),
        })
    }
}
