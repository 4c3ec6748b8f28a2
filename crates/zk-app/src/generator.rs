use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zk_core::error::{GenerationError, SessionError};
use zk_core::presenter::present;
use zk_core::session::{GenerationSession, Phase, Resolution};
use zk_core::validator::InputValidator;
use zk_core::StagedFile;

use crate::events::GenEvent;
use crate::generator::backend::GenerationBackend;
use crate::ui::UiState;

pub mod backend;
pub mod download;
pub mod text_to_image;

const TICK_INTERVAL: Duration = Duration::from_millis(250);
const NO_ANSWER: &str = "backend task ended without an answer";

/// Drives one [`GenerationSession`] through a submission
pub struct Generator {
    backend: Arc<dyn GenerationBackend>,
    validator: InputValidator,
    expected: Duration,
    tick_interval: Duration,
}

impl Generator {
    pub fn new(backend: Arc<dyn GenerationBackend>, validator: InputValidator, expected: Duration) -> Self {
        Self {
            backend,
            validator,
            expected,
            tick_interval: TICK_INTERVAL,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Read files from disk and stage them as one all-or-nothing batch
    pub fn stage_paths(&self, session: &mut GenerationSession, paths: &[PathBuf]) -> anyhow::Result<usize> {
        let files = paths
            .iter()
            .map(|path| StagedFile::from_path(path).with_context(|| format!("reading {}", path.display())))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(session.stage_files(&self.validator, files)?)
    }

    /// Submit and pump events until the session leaves InFlight.
    ///
    /// Firing `cancel` moves the session back to Idle and abandons the request.
    /// Guard failures are returned without any phase change.
    pub async fn run(
        &self,
        session: &mut GenerationSession,
        ui: &mut UiState,
        cancel: CancellationToken,
    ) -> Result<Phase, SessionError> {
        let submission = match session.submit() {
            Ok(submission) => submission,
            Err(e) => {
                ui.draw(present(session));
                return Err(e);
            }
        };
        ui.draw(present(session));

        let (tx, mut rx) = mpsc::unbounded_channel::<GenEvent>();
        let request_token = cancel.child_token();

        // The backend call is the only suspension point; it reports back exactly once.
        let backend = self.backend.clone();
        let token = request_token.clone();
        let id = submission.id;
        info!("Dispatching submission {} to {} backend", id, backend.name());
        tokio::spawn(async move {
            let outcome = backend.generate(submission.request, token).await;
            if tx.send(GenEvent::Resolved { id, outcome }).is_err() {
                debug!("Submission {} resolved after the session moved on", id);
            }
        });

        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.tick_interval);

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => GenEvent::CancelRequested,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => {
                        warn!("Backend task for submission {} ended without an answer", id);
                        GenEvent::Resolved {
                            id,
                            outcome: Err(GenerationError::Network(NO_ANSWER.to_string())),
                        }
                    }
                },
                _ = ticker.tick() => GenEvent::Tick(started.elapsed()),
            };

            let finished = self.on_gen_event(session, event, &request_token);
            ui.draw(present(session));

            if let Some(phase) = finished {
                return Ok(phase);
            }
        }
    }

    /// Apply one event. Returns the phase once the session has left InFlight.
    pub fn on_gen_event(
        &self,
        session: &mut GenerationSession,
        event: GenEvent,
        request_token: &CancellationToken,
    ) -> Option<Phase> {
        match event {
            GenEvent::Resolved { id, outcome } => match session.resolve(id, outcome) {
                Resolution::Applied(phase) => Some(phase),
                Resolution::Stale => None,
            },
            GenEvent::Tick(elapsed) => {
                session.tick_progress(elapsed, self.expected);
                None
            }
            GenEvent::CancelRequested => {
                request_token.cancel();
                session.cancel();
                Some(session.phase())
            }
        }
    }
}
