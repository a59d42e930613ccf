//! Pipeline orchestrator: frames in, live snapshots and results out.
//!
//! [`PipelineOrchestrator`] owns the [`Analyzer`] and at most one active
//! session.  It reacts to [`PipelineEvent`]s received over a
//! `tokio::sync::mpsc` channel, publishes a [`LiveSnapshot`] into the
//! [`SharedState`] after every frame, and sends a [`PipelineResult`] whenever
//! a session ends.
//!
//! # Flow
//!
//! ```text
//! Start(kind)         └─▶ finalise any active session, reset analyser, arm
//! StartWordDrill(w)   └─▶ same, for a word drill on one item
//! StartSentenceTest   └─▶ same, with the six-sentence sequencer
//! Frame(frame)        └─▶ analyse → capture machine → snapshot
//!                           └─ auto-stop / disqualified → result, Idle
//! Stop                └─▶ finalise → result, Idle
//! NextSentence        └─▶ evaluate the utterance → SentenceStep
//! ```

use std::time::Instant;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::analysis::Analyzer;
use crate::audio::Frame;
use crate::exercise::{
    CaptureMachine, ExerciseKind, ExerciseSession, Feedback, FrameOutcome, SentenceStep,
    SentenceTest, WordPrompt,
};
use crate::scoring::{finalize, SessionOutcome, SessionReport};

use super::state::{LiveSnapshot, Phase, SharedState};

// ---------------------------------------------------------------------------
// Events and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Start(ExerciseKind),
    /// Word drill on a specific item, so a pass can be credited to it.
    StartWordDrill(WordPrompt),
    Frame(Frame),
    Stop,
    NextSentence,
    StartSentenceTest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult {
    Finished(SessionReport),
    /// The session ended with nothing recorded.
    NoData(ExerciseKind),
    Disqualified(ExerciseKind),
    SentenceStep(SentenceStep),
    /// A practice session was stopped; practice has no report.
    PracticeEnded(ExerciseKind),
}

/// Events the orchestrator could not honour.  Reported through the shared
/// state; the loop keeps running.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no exercise is running")]
    NoActiveSession,

    #[error("the sentence test is not running")]
    NotInSentenceTest,
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

enum Active {
    Exercise {
        session: ExerciseSession,
        machine: CaptureMachine,
    },
    Sentences(SentenceTest),
}

/// Drives exercise sessions from a stream of [`PipelineEvent`]s.
///
/// ```rust,no_run
/// use tokio::sync::mpsc;
/// use voice_trainer::analysis::Analyzer;
/// use voice_trainer::config::AppConfig;
/// use voice_trainer::exercise::ExerciseKind;
/// use voice_trainer::pipeline::{new_shared_state, PipelineEvent, PipelineOrchestrator};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = AppConfig::default();
/// let state = new_shared_state(config.clone());
/// let (event_tx, event_rx) = mpsc::channel(64);
/// let (result_tx, mut result_rx) = mpsc::channel(8);
///
/// let orchestrator = PipelineOrchestrator::new(
///     state,
///     Analyzer::new(&config.analysis),
///     config.target_frequency()?,
///     result_tx,
/// );
/// tokio::spawn(orchestrator.run(event_rx));
///
/// event_tx.send(PipelineEvent::Start(ExerciseKind::PitchSustain)).await?;
/// // ... PipelineEvent::Frame(..) from the capture thread ...
/// let result = result_rx.recv().await;
/// # Ok(())
/// # }
/// ```
pub struct PipelineOrchestrator {
    state: SharedState,
    analyzer: Analyzer,
    target_hz: f64,
    active: Option<Active>,
    results: mpsc::Sender<PipelineResult>,
}

impl PipelineOrchestrator {
    /// * `target_hz`: pitch target for the pitch kinds.
    /// * `results`: receives one [`PipelineResult`] per ended session or
    ///   sentence step.
    pub fn new(
        state: SharedState,
        analyzer: Analyzer,
        target_hz: f64,
        results: mpsc::Sender<PipelineResult>,
    ) -> Self {
        Self {
            state,
            analyzer,
            target_hz,
            active: None,
            results,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `events` is closed.  An active session is finalised on the
    /// way out.
    pub async fn run(mut self, mut events: mpsc::Receiver<PipelineEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                PipelineEvent::Start(ExerciseKind::SentenceTest)
                | PipelineEvent::StartSentenceTest => self.handle_start_sentences().await,
                PipelineEvent::Start(kind) => self.handle_start(kind, None).await,
                PipelineEvent::StartWordDrill(word) => {
                    self.handle_start(ExerciseKind::WordDrill, Some(word)).await
                }
                PipelineEvent::Frame(frame) => self.handle_frame(&frame).await,
                PipelineEvent::Stop => {
                    if let Err(e) = self.handle_stop(Instant::now()).await {
                        self.set_error(e);
                    }
                }
                PipelineEvent::NextSentence => {
                    if let Err(e) = self.handle_next_sentence(Instant::now()).await {
                        self.set_error(e);
                    }
                }
            }
        }

        if self.active.is_some() {
            let _ = self.handle_stop(Instant::now()).await;
        }
        log::info!("pipeline: event channel closed, orchestrator shutting down");
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    async fn handle_start(&mut self, kind: ExerciseKind, word: Option<WordPrompt>) {
        let now = Instant::now();
        self.finish_previous(now).await;

        let mut session = ExerciseSession::new(kind, kind.params(self.target_hz), now);
        if let Some(word) = word {
            session = session.with_word(word);
        }
        let mut machine = CaptureMachine::new();
        machine.arm(&mut session);
        match word {
            Some(word) => log::info!(
                "pipeline: {kind} started on {} {:?} ({:?})",
                word.level,
                word.text,
                session.state()
            ),
            None => log::info!("pipeline: {kind} started ({:?})", session.state()),
        }

        self.active = Some(Active::Exercise { session, machine });
        self.reset_live(Phase::Exercise(kind));
    }

    async fn handle_start_sentences(&mut self) {
        let now = Instant::now();
        self.finish_previous(now).await;

        self.active = Some(Active::Sentences(SentenceTest::new(now)));
        self.reset_live(Phase::SentenceTest { index: 0 });
    }

    async fn handle_frame(&mut self, frame: &Frame) {
        let Some(active) = self.active.as_mut() else {
            log::trace!("pipeline: frame with no active session ignored");
            return;
        };

        let features = self.analyzer.analyze(frame);
        let (outcome, snapshot) = match active {
            Active::Exercise { session, machine } => {
                let outcome = machine.process(session, &features);
                let snapshot = LiveSnapshot::new(
                    &features,
                    session,
                    machine.sustained(),
                    feedback_of(outcome),
                );
                (outcome, snapshot)
            }
            Active::Sentences(test) => {
                let outcome = test.process(&features);
                let snapshot = LiveSnapshot::new(&features, test.session(), None, None);
                (outcome, snapshot)
            }
        };
        self.state.lock().unwrap().snapshot = Some(snapshot);

        if matches!(outcome, FrameOutcome::AutoStopped | FrameOutcome::Disqualified) {
            self.end_exercise(features.at).await;
        }
    }

    async fn handle_stop(&mut self, at: Instant) -> Result<(), PipelineError> {
        match self.active {
            None => Err(PipelineError::NoActiveSession),
            Some(Active::Exercise { .. }) => {
                self.end_exercise(at).await;
                Ok(())
            }
            Some(Active::Sentences(_)) => {
                log::info!("pipeline: sentence test abandoned");
                self.active = None;
                self.set_phase(Phase::Idle);
                Ok(())
            }
        }
    }

    async fn handle_next_sentence(&mut self, at: Instant) -> Result<(), PipelineError> {
        let Some(Active::Sentences(test)) = self.active.as_mut() else {
            return Err(PipelineError::NotInSentenceTest);
        };

        let step = test.next(at);
        let index = test.index();
        if matches!(step, SentenceStep::Finished(_)) {
            self.active = None;
            self.set_phase(Phase::Idle);
        } else {
            self.analyzer.reset();
            self.set_phase(Phase::SentenceTest { index });
        }
        self.send(PipelineResult::SentenceStep(step)).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// A new start replaces whatever was running.  An unfinished sentence
    /// test is simply dropped.
    async fn finish_previous(&mut self, at: Instant) {
        if matches!(self.active, Some(Active::Exercise { .. })) {
            self.end_exercise(at).await;
        }
        self.active = None;
    }

    async fn end_exercise(&mut self, at: Instant) {
        let (mut session, mut machine) = match self.active.take() {
            Some(Active::Exercise { session, machine }) => (session, machine),
            other => {
                self.active = other;
                return;
            }
        };

        let end = machine.stop(&mut session);
        let kind = session.kind();
        let result = match finalize(&session, end, at) {
            SessionOutcome::Finished(report) => {
                log::info!(
                    "pipeline: {kind} finished ({:?}), {} rows, score {:?}, passed {}",
                    end,
                    report.rows,
                    report.score.map(|s| s.total),
                    report.passed
                );
                self.state.lock().unwrap().last_report = Some(report.clone());
                PipelineResult::Finished(report)
            }
            SessionOutcome::NoData => {
                log::warn!("pipeline: {kind} ended with no data");
                PipelineResult::NoData(kind)
            }
            SessionOutcome::Disqualified => PipelineResult::Disqualified(kind),
            SessionOutcome::Practice => PipelineResult::PracticeEnded(kind),
        };

        self.set_phase(Phase::Idle);
        self.send(result).await;
    }

    async fn send(&self, result: PipelineResult) {
        if self.results.send(result).await.is_err() {
            log::warn!("pipeline: result receiver dropped");
        }
    }

    fn reset_live(&mut self, phase: Phase) {
        self.analyzer.reset();
        let mut st = self.state.lock().unwrap();
        st.phase = phase;
        st.snapshot = None;
        st.error_message = None;
    }

    fn set_phase(&self, phase: Phase) {
        self.state.lock().unwrap().phase = phase;
    }

    fn set_error(&self, error: PipelineError) {
        log::warn!("pipeline: {error}");
        self.state.lock().unwrap().error_message = Some(error.to_string());
    }
}

fn feedback_of(outcome: FrameOutcome) -> Option<Feedback> {
    match outcome {
        FrameOutcome::Feedback(hint) => hint,
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
