//! Per-viewing state machine of the "watch ad, claim reward" flow.
//!
//! A session starts `Selected` and ends either `Claimed` or dropped when the
//! viewer closes. Completion is latched: once an ad counts as watched no later
//! playback event can undo it.

use chrono::{DateTime, Duration, Utc};

use crate::models::ads::{Ad, AdKind};

/// Share of a video that must be observed before it counts as watched.
pub const COMPLETION_THRESHOLD: f64 = 95.0;

/// Externally hosted ads cannot report progress; they complete this long
/// after the link is opened.
pub const EXTERNAL_WATCH_DELAY_SECS: i64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Selected,
    Loading,
    Playing,
    Paused,
    AwaitingExternal { opened_at: DateTime<Utc> },
    Completed,
    Claimed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemoteStatus {
    #[default]
    Idle,
    Updating,
    Success,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Cannot {event} while {phase:?}")]
    InvalidTransition { phase: Phase, event: &'static str },
    #[error("Ad {0} has no watchable content")]
    Unavailable(String),
}

#[derive(Clone, Debug)]
pub struct AdWatchSession {
    ad: Ad,
    phase: Phase,
    progress: f64,
    completed: bool,
    claimed: bool,
    remote_status: RemoteStatus,
}

impl AdWatchSession {
    pub(crate) fn new(ad: Ad) -> Result<Self, SessionError> {
        if ad.kind == AdKind::Unavailable {
            return Err(SessionError::Unavailable(ad.id));
        }

        Ok(AdWatchSession {
            ad,
            phase: Phase::Selected,
            progress: 0.0,
            completed: false,
            claimed: false,
            remote_status: RemoteStatus::Idle,
        })
    }

    pub fn ad(&self) -> &Ad {
        &self.ad
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_claimable(&self) -> bool {
        self.completed && !self.claimed
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    pub fn remote_status(&self) -> RemoteStatus {
        self.remote_status
    }

    fn invalid(&self, event: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            phase: self.phase,
            event,
        }
    }

    fn is_video(&self) -> bool {
        matches!(self.ad.kind, AdKind::Video { .. })
    }

    pub fn begin_loading(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Selected if self.is_video() => {
                self.phase = Phase::Loading;
                Ok(())
            }
            _ => Err(self.invalid("load media")),
        }
    }

    pub fn media_ready(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Loading => {
                self.phase = Phase::Playing;
                Ok(())
            }
            _ => Err(self.invalid("start playback")),
        }
    }

    pub fn play(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Paused | Phase::Playing => {
                self.phase = Phase::Playing;
                Ok(())
            }
            Phase::Completed | Phase::Claimed => Ok(()),
            _ => Err(self.invalid("play")),
        }
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Playing | Phase::Paused => {
                self.phase = Phase::Paused;
                Ok(())
            }
            Phase::Completed | Phase::Claimed => Ok(()),
            _ => Err(self.invalid("pause")),
        }
    }

    /// Reports observed playback progress in percent.
    pub fn update_progress(&mut self, percent: f64) -> Result<(), SessionError> {
        match self.phase {
            Phase::Playing | Phase::Paused => {
                self.progress = percent.clamp(0.0, 100.0);
                if self.progress >= COMPLETION_THRESHOLD {
                    self.complete();
                }
                Ok(())
            }
            Phase::Completed | Phase::Claimed => Ok(()),
            _ => Err(self.invalid("report progress")),
        }
    }

    /// End-of-media event. Covers players whose last progress report never
    /// reaches the threshold.
    pub fn media_ended(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Playing | Phase::Paused => {
                self.progress = 100.0;
                self.complete();
                Ok(())
            }
            Phase::Completed | Phase::Claimed => Ok(()),
            _ => Err(self.invalid("end playback")),
        }
    }

    pub fn open_external(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match (self.phase, &self.ad.kind) {
            (Phase::Selected, AdKind::External { .. }) => {
                self.phase = Phase::AwaitingExternal { opened_at: now };
                Ok(())
            }
            _ => Err(self.invalid("open external link")),
        }
    }

    /// Time at which an opened external ad completes.
    pub fn external_deadline(&self) -> Option<DateTime<Utc>> {
        match self.phase {
            Phase::AwaitingExternal { opened_at } => {
                Some(opened_at + Duration::seconds(EXTERNAL_WATCH_DELAY_SECS))
            }
            _ => None,
        }
    }

    /// Advances time-based transitions. Returns whether the session is completed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(deadline) = self.external_deadline() {
            if now >= deadline {
                self.progress = 100.0;
                self.complete();
            }
        }
        self.completed
    }

    fn complete(&mut self) {
        if !self.completed {
            log::debug!("Ad {} watched to completion", self.ad.id);
            self.completed = true;
            self.phase = Phase::Completed;
        }
    }

    /// Moves a claimable session to `Claimed`. Returns `false` without any
    /// change when the session is not claimable.
    pub(crate) fn mark_claimed(&mut self) -> bool {
        if !self.is_claimable() {
            return false;
        }
        self.claimed = true;
        self.phase = Phase::Claimed;
        true
    }

    pub(crate) fn set_remote_status(&mut self, status: RemoteStatus) {
        self.remote_status = status;
    }
}
