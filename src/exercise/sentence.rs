//! The six-sentence test: one capture session per sentence.

use std::time::Instant;

use serde::Serialize;

use crate::analysis::Features;
use crate::scoring::{finalize, SessionOutcome};

use super::kind::ExerciseKind;
use super::machine::{CaptureMachine, FrameOutcome};
use super::session::ExerciseSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SentencePrompt {
    pub text: &'static str,
    /// Difficulty tier, 1..=3.
    pub tier: u8,
}

pub const SENTENCES: [SentencePrompt; 6] = [
    SentencePrompt {
        text: "My dearest friend, say hi to me.",
        tier: 1,
    },
    SentencePrompt {
        text: "We need three easy keys, please.",
        tier: 1,
    },
    SentencePrompt {
        text: "Oh, I know all you told me.",
        tier: 2,
    },
    SentencePrompt {
        text: "Love you so much, dear.",
        tier: 2,
    },
    SentencePrompt {
        text: "Little lamps light up the room.",
        tier: 3,
    },
    SentencePrompt {
        text: "No, my name is Ellie, not him.",
        tier: 3,
    },
];

/// Evaluation of one spoken sentence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentenceResult {
    pub index: usize,
    pub tier: u8,
    pub avg_pitch: f64,
    /// Population stddev of the averaged pitch across the utterance.
    pub melodic_stability: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    pub results: Vec<SentenceResult>,
    pub passed: usize,
    pub total: usize,
    /// Every sentence passed.
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SentenceStep {
    /// Nothing was recorded; the same sentence starts over.
    NoSpeech { index: usize },
    /// Sentence evaluated; the next one is now recording.
    Evaluated(SentenceResult),
    /// The last sentence was evaluated.
    Finished(TestSummary),
}

/// Sequencer for [`SENTENCES`].
#[derive(Debug)]
pub struct SentenceTest {
    index: usize,
    session: ExerciseSession,
    machine: CaptureMachine,
    results: Vec<SentenceResult>,
}

impl SentenceTest {
    pub fn new(at: Instant) -> Self {
        let (session, machine) = fresh(at);
        log::info!("sentence test started: {:?}", SENTENCES[0].text);
        Self {
            index: 0,
            session,
            machine,
            results: Vec::with_capacity(SENTENCES.len()),
        }
    }

    /// Index of the sentence being recorded.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn prompt(&self) -> Option<&'static SentencePrompt> {
        SENTENCES.get(self.index)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= SENTENCES.len()
    }

    pub fn session(&self) -> &ExerciseSession {
        &self.session
    }

    pub fn process(&mut self, features: &Features) -> FrameOutcome {
        if self.is_finished() {
            return FrameOutcome::Ignored;
        }
        self.machine.process(&mut self.session, features)
    }

    /// Evaluate the current utterance and move on.
    pub fn next(&mut self, at: Instant) -> SentenceStep {
        if self.is_finished() {
            return SentenceStep::Finished(self.summary());
        }

        let end = self.machine.stop(&mut self.session);
        let report = match finalize(&self.session, end, at) {
            SessionOutcome::Finished(report) => report,
            _ => {
                log::info!("sentence {}: no speech, restarting", self.index + 1);
                (self.session, self.machine) = fresh(at);
                return SentenceStep::NoSpeech { index: self.index };
            }
        };

        let result = SentenceResult {
            index: self.index,
            tier: SENTENCES[self.index].tier,
            avg_pitch: report.avg_pitch,
            melodic_stability: report.melodic_stability,
            passed: report.passed,
        };
        log::info!(
            "sentence {}: {:.1} Hz, melodic stability {:.1} Hz, {}",
            self.index + 1,
            result.avg_pitch,
            result.melodic_stability,
            if result.passed { "passed" } else { "failed" }
        );
        self.results.push(result);
        self.index += 1;

        if self.is_finished() {
            return SentenceStep::Finished(self.summary());
        }
        (self.session, self.machine) = fresh(at);
        SentenceStep::Evaluated(result)
    }

    fn summary(&self) -> TestSummary {
        let passed = self.results.iter().filter(|r| r.passed).count();
        TestSummary {
            results: self.results.clone(),
            passed,
            total: SENTENCES.len(),
            success: passed == SENTENCES.len(),
        }
    }
}

fn fresh(at: Instant) -> (ExerciseSession, CaptureMachine) {
    let kind = ExerciseKind::SentenceTest;
    let mut session = ExerciseSession::new(kind, kind.params(0.0), at);
    let mut machine = CaptureMachine::new();
    machine.arm(&mut session);
    (session, machine)
}
