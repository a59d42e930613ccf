//! Frame source: microphone capture → downmix → fixed-length frames.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → Framer
//!           → stereo_to_mono → Frame (2048 samples) → analysis
//! ```
//!
//! [`RingBuffer`] lives here as well: it is the bounded FIFO that both
//! estimators use for their rolling histories.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::mpsc;
//! use std::time::Instant;
//! use voice_trainer::audio::{AudioCapture, AudioChunk, Framer, DEFAULT_FRAME_LEN};
//!
//! let (tx, rx) = mpsc::channel::<AudioChunk>();
//! let capture = AudioCapture::open(None).unwrap();
//! let mut framer = Framer::new(DEFAULT_FRAME_LEN, capture.sample_rate());
//! let _handle = capture.start(tx).unwrap(); // drops handle → stops stream
//!
//! while let Ok(chunk) = rx.recv() {
//!     for frame in framer.push(&chunk.samples, chunk.channels, Instant::now()) {
//!         println!("frame rms {:.4}", frame.rms());
//!     }
//! }
//! ```

pub mod buffer;
pub mod capture;
pub mod frame;

pub use buffer::RingBuffer;
pub use capture::{AudioCapture, AudioChunk, CaptureError, StreamHandle};
pub use frame::{stereo_to_mono, Frame, Framer, DEFAULT_FRAME_LEN};
