//! Exercise definitions and the capture state machine.
//!
//! An [`ExerciseKind`] expands into [`ExerciseParams`]; a [`CaptureMachine`]
//! uses those to drive one [`ExerciseSession`] frame by frame.  The sentence
//! test chains six sessions through [`SentenceTest`]; word drills target a
//! [`WordPrompt`] from one of the [`WordLevel`] lists.

pub mod feedback;
pub mod kind;
pub mod machine;
pub mod sentence;
pub mod session;
pub mod words;

pub use feedback::Feedback;
pub use kind::{
    CaptureMode, ExerciseKind, ExerciseParams, FailureCondition, FailureRule, FeedbackRule,
    PassRule, Section, TargetRule, Voicing, AUTO_STOP, PITCH_FLOOR_HZ, READY_DELAY,
    SENTENCE_ANCHOR_HZ,
};
pub use machine::{CaptureMachine, FrameOutcome, SessionEnd};
pub use sentence::{
    SentencePrompt, SentenceResult, SentenceStep, SentenceTest, TestSummary, SENTENCES,
};
pub use session::{CaptureState, ExerciseSession, SampleRow};
pub use words::{WordLevel, WordPrompt, PHRASES, VOWELS, WORDS};
