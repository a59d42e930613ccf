//! Pipeline orchestrator: wires frames → analysis → capture machine → report.
//!
//! # Architecture
//!
//! ```text
//! capture thread ── PipelineEvent::Frame ──┐
//! CLI / UI ───────── Start / Stop / Next ──┤ (mpsc)
//!                                          ▼
//!                  PipelineOrchestrator::run()  ← async tokio task
//!                          │
//!                          ├─ Analyzer::analyze
//!                          ├─ CaptureMachine::process / SentenceTest
//!                          ├─▶ SharedState (LiveSnapshot per frame)
//!                          └─▶ PipelineResult (mpsc) on session end
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{PipelineError, PipelineEvent, PipelineOrchestrator, PipelineResult};
pub use state::{new_shared_state, LiveSnapshot, LiveState, Phase, SharedState};
