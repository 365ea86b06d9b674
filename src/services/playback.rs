use chrono::Utc;
use futures_util::{Stream, StreamExt};

use super::watch::AdWatchSession;
use super::ServiceError;
use crate::models::ads::AdKind;
use crate::repositories::{api::ApiError, media::MediaRepository};

/// Plays ads in a terminal: video ads are downloaded and their progress is
/// derived from the received bytes, external ads are timed.
pub struct PlaybackService {
    media: MediaRepository,
}

impl PlaybackService {
    pub fn new(media: MediaRepository) -> Self {
        PlaybackService { media }
    }

    /// Runs `session` until it completes or playback fails.
    pub async fn watch<F>(
        &self,
        session: &mut AdWatchSession,
        on_progress: F,
    ) -> Result<(), ServiceError>
    where
        F: FnMut(f64),
    {
        match session.ad().kind.clone() {
            AdKind::Video { url } => {
                session.begin_loading()?;
                let stream = match self.media.open(&url).await {
                    Ok(stream) => stream,
                    Err(e) => {
                        log::error!("Video failed to load: {}", e);
                        return Err(e.into());
                    }
                };
                play_stream(session, stream.content_length, stream.chunks, on_progress).await
            }
            AdKind::External { url } => {
                log::info!("Opening external ad {}", url);
                wait_external(session).await
            }
            AdKind::Unavailable => {
                Err(ServiceError::validation("ad", "Ad has no watchable content"))
            }
        }
    }
}

/// Drives a loading session from a stream of received chunk sizes. Progress is
/// the share of `content_length` received so far; without a length only the
/// end of the stream completes the session.
pub async fn play_stream<S, F>(
    session: &mut AdWatchSession,
    content_length: Option<u64>,
    mut chunks: S,
    mut on_progress: F,
) -> Result<(), ServiceError>
where
    S: Stream<Item = Result<usize, ApiError>> + Unpin,
    F: FnMut(f64),
{
    session.media_ready()?;

    let total = content_length.filter(|length| *length > 0);
    let mut received: u64 = 0;

    while let Some(chunk) = chunks.next().await {
        let size = match chunk {
            Ok(size) => size,
            Err(e) => {
                session.pause()?;
                log::warn!("Playback of {} interrupted: {}", session.ad().id, e);
                return Err(e.into());
            }
        };

        received += size as u64;
        if let Some(total) = total {
            let percent = received as f64 * 100.0 / total as f64;
            session.update_progress(percent)?;
            on_progress(session.progress());
        }
    }

    if let Some(total) = total {
        if received < total {
            session.pause()?;
            return Err(ApiError::Transport(format!(
                "Video ended early after {} of {} bytes",
                received, total
            ))
            .into());
        }
    }

    session.media_ended()?;
    on_progress(session.progress());
    Ok(())
}

/// Opens an external ad and waits out its watch delay.
pub async fn wait_external(session: &mut AdWatchSession) -> Result<(), ServiceError> {
    session.open_external(Utc::now())?;

    while let Some(deadline) = session.external_deadline() {
        if session.poll(Utc::now()) {
            break;
        }
        let remaining = (deadline - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::from_millis(50));
        tokio::time::sleep(remaining).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ads::Ad;
    use crate::services::testing::video_ad;
    use crate::services::watch::Phase;
    use futures_util::stream;

    fn loading(id: &str) -> AdWatchSession {
        let mut session = AdWatchSession::new(video_ad(id)).unwrap();
        session.begin_loading().unwrap();
        session
    }

    #[tokio::test]
    async fn full_download_completes_the_session() {
        let mut session = loading("a1");
        let mut seen = vec![];
        let chunks = stream::iter(vec![Ok(400), Ok(400), Ok(200)]);

        play_stream(&mut session, Some(1000), chunks, |p| seen.push(p))
            .await
            .unwrap();

        assert!(session.is_claimable());
        assert_eq!(seen, vec![40.0, 80.0, 100.0, 100.0]);
    }

    #[tokio::test]
    async fn unknown_length_completes_at_end_of_stream() {
        let mut session = loading("a1");
        let chunks = stream::iter(vec![Ok(10), Ok(10)]);

        play_stream(&mut session, None, chunks, |_| {}).await.unwrap();

        assert!(session.is_completed());
        assert_eq!(session.progress(), 100.0);
    }

    #[tokio::test]
    async fn interrupted_download_is_not_claimable() {
        let mut session = loading("a1");
        let chunks = stream::iter(vec![
            Ok(300),
            Err(ApiError::Transport("reset by peer".to_string())),
        ]);

        let result = play_stream(&mut session, Some(1000), chunks, |_| {}).await;

        assert!(matches!(result, Err(ServiceError::Api(_))));
        assert_eq!(session.phase(), Phase::Paused);
        assert!(!session.is_claimable());
    }

    #[tokio::test]
    async fn short_stream_is_an_error() {
        let mut session = loading("a1");
        let chunks = stream::iter(vec![Ok(500)]);

        let result = play_stream(&mut session, Some(1000), chunks, |_| {}).await;

        assert!(result.is_err());
        assert!(!session.is_completed());
    }

    #[tokio::test]
    async fn external_ads_complete_after_waiting() {
        let ad = Ad {
            kind: AdKind::External {
                url: "https://www.youtube.com/watch?v=abc".to_string(),
            },
            ..video_ad("yt")
        };
        let mut session = AdWatchSession::new(ad).unwrap();

        wait_external(&mut session).await.unwrap();

        assert!(session.is_claimable());
    }
}
