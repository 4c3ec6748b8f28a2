//! The generation workflow state machine.
//!
//! ```text
//! Idle --submit--> InFlight --resolve(Ok)--> Completed
//!                     |     --resolve(Err)-> Failed
//!                     +--cancel--> Idle
//! any --reset--> Idle
//! ```
//!
//! A [`GenerationSession`] is a plain owned value. Whoever drives the
//! workflow holds it and hands `&mut` to the transition methods; nothing
//! here performs I/O.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::{GenerationError, SessionError};
use crate::request::GenerationRequest;
use crate::validator::{InputValidator, StagedFiles};
use crate::{AssetReference, StagedFile};

pub const START_MESSAGE: &str = "Starting generation...";
pub const COMPLETE_MESSAGE: &str = "Generation complete!";
pub const CANCELLED_MESSAGE: &str = "Generation cancelled";
pub const FALLBACK_FAILURE: &str = "Generation failed. Please try again.";

/// Ceiling of the advisory estimate; only a real result reaches 100.
pub const MAX_ESTIMATE: f32 = 95.0;

pub const DEFAULT_MAX_TEXT_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    InFlight,
    Completed,
    Failed,
}

/// Identifies one InFlight attempt so late answers can be told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the caller hands to the request client after a successful submit
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: SubmissionId,
    pub request: GenerationRequest,
}

/// Outcome of feeding a backend answer into the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied(Phase),
    /// The answer belongs to a submission that is no longer live
    Stale,
}

#[derive(Debug, Clone)]
pub struct GenerationSession {
    phase: Phase,
    text: String,
    max_text_chars: usize,
    staged: StagedFiles,
    progress_estimate: f32,
    status_message: Option<String>,
    result: Option<AssetReference>,
    failure: Option<String>,
    notice: Option<String>,
    submission: Option<SubmissionId>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self::with_text_limit(DEFAULT_MAX_TEXT_CHARS)
    }
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh session whose description may hold at most `max_text_chars` characters
    pub fn with_text_limit(max_text_chars: usize) -> Self {
        Self {
            phase: Phase::Idle,
            text: String::new(),
            max_text_chars,
            staged: StagedFiles::default(),
            progress_estimate: 0.0,
            status_message: None,
            result: None,
            failure: None,
            notice: None,
            submission: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn staged(&self) -> &StagedFiles {
        &self.staged
    }

    pub fn progress_estimate(&self) -> f32 {
        self.progress_estimate
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn result(&self) -> Option<&AssetReference> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Inline feedback for a rejected action; never changes the phase
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn submission(&self) -> Option<SubmissionId> {
        self.submission
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Time spent generating: up to now while InFlight, up to resolution afterwards
    pub fn elapsed(&self) -> Option<TimeDelta> {
        let started = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some(end - started)
    }

    pub fn can_submit(&self) -> bool {
        self.phase != Phase::InFlight && (!self.text.trim().is_empty() || !self.staged.is_empty())
    }

    /// Replace the description. Over-long text is rejected and the old text kept.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_editable()?;

        let text = text.into();
        let length = text.chars().count();
        if length > self.max_text_chars {
            let err = SessionError::TextTooLong { length, max: self.max_text_chars };
            self.notice = Some(err.to_string());
            return Err(err);
        }

        self.text = text;
        Ok(())
    }

    /// Run a batch through the validator; admitted files join the staged set.
    pub fn stage_files(
        &mut self,
        validator: &InputValidator,
        files: Vec<StagedFile>,
    ) -> Result<usize, SessionError> {
        self.ensure_editable()?;

        match validator.admit(&mut self.staged, files) {
            Ok(added) => {
                self.notice = None;
                debug!("Staged {} file(s), {} total", added, self.staged.len());
                Ok(added)
            }
            Err(e) => {
                self.notice = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn remove_file(&mut self, index: usize) -> Result<StagedFile, SessionError> {
        self.ensure_editable()?;
        Ok(self.staged.remove(index)?)
    }

    /// Guarded `Idle|Completed|Failed -> InFlight`.
    ///
    /// On rejection the phase is untouched. On success the returned
    /// [`Submission`] must be sent to the request client exactly once.
    pub fn submit(&mut self) -> Result<Submission, SessionError> {
        if self.phase == Phase::InFlight {
            return Err(SessionError::AlreadyInFlight);
        }

        let request = GenerationRequest::new(self.text.clone(), self.staged.as_slice().to_vec());
        if !request.is_submittable() {
            let err = SessionError::MissingInput;
            self.notice = Some(err.to_string());
            return Err(err);
        }

        let id = SubmissionId::new();
        self.phase = Phase::InFlight;
        self.progress_estimate = 0.0;
        self.status_message = Some(START_MESSAGE.to_string());
        self.result = None;
        self.failure = None;
        self.notice = None;
        self.submission = Some(id);
        self.started_at = Some(Utc::now());
        self.finished_at = None;

        info!(
            "Submission {} started ({} chars of text, {} image(s))",
            id,
            request.text.len(),
            request.images.len()
        );

        Ok(Submission { id, request })
    }

    /// Apply the backend's answer for submission `id`.
    pub fn resolve(
        &mut self,
        id: SubmissionId,
        outcome: Result<AssetReference, GenerationError>,
    ) -> Resolution {
        if self.phase != Phase::InFlight || self.submission != Some(id) {
            warn!("Ignoring stale resolution for submission {}", id);
            return Resolution::Stale;
        }

        self.submission = None;
        self.finished_at = Some(Utc::now());

        match outcome {
            Ok(asset) => {
                info!("Submission {} complete: {}", id, asset.glb_url);
                self.phase = Phase::Completed;
                self.progress_estimate = 100.0;
                self.status_message = Some(COMPLETE_MESSAGE.to_string());
                self.result = Some(asset);
            }
            Err(e) => {
                let description = if e.is_blank() {
                    FALLBACK_FAILURE.to_string()
                } else {
                    e.to_string()
                };
                warn!("Submission {} failed: {}", id, description);
                self.phase = Phase::Failed;
                self.status_message = None;
                self.failure = Some(description);
            }
        }

        Resolution::Applied(self.phase)
    }

    /// `InFlight -> Idle`, keeping the inputs. Returns the abandoned submission, if any.
    pub fn cancel(&mut self) -> Option<SubmissionId> {
        if self.phase != Phase::InFlight {
            return None;
        }

        let abandoned = self.submission.take();
        self.phase = Phase::Idle;
        self.progress_estimate = 0.0;
        self.status_message = None;
        self.started_at = None;
        self.finished_at = None;
        self.notice = Some(CANCELLED_MESSAGE.to_string());

        if let Some(id) = abandoned {
            info!("Submission {} cancelled", id);
        }
        abandoned
    }

    /// Back to a fresh Idle session. A live submission is abandoned and its answer will be stale.
    pub fn reset(&mut self) {
        if let Some(id) = self.submission {
            debug!("Reset abandons submission {}", id);
        }
        *self = Self::with_text_limit(self.max_text_chars);
    }

    /// Advance the advisory estimate. It climbs toward [`MAX_ESTIMATE`] and never goes down.
    pub fn tick_progress(&mut self, elapsed: Duration, expected: Duration) {
        if self.phase != Phase::InFlight {
            return;
        }

        let expected = expected.as_secs_f32().max(1.0);
        let estimate = MAX_ESTIMATE * (1.0 - (-elapsed.as_secs_f32() / expected).exp());
        self.progress_estimate = self.progress_estimate.max(estimate).min(MAX_ESTIMATE);

        // Once the estimate moves, the presenter derives the stage text from it
        if self.progress_estimate > 0.0 {
            self.status_message = None;
        }
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        if self.phase == Phase::InFlight {
            Err(SessionError::Busy)
        } else {
            Ok(())
        }
    }
}
