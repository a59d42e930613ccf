//! Fixed-length analysis frames.
//!
//! The estimators consume one [`Frame`] per capture cycle.  Host audio
//! arrives in chunks of arbitrary length and channel count, so the
//! [`Framer`] downmixes each chunk with [`stereo_to_mono`] and slices the
//! mono stream into non-overlapping blocks of `frame_len` samples.

use std::time::Instant;

/// Default analysis block size in samples.
pub const DEFAULT_FRAME_LEN: usize = 2048;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One block of mono time-domain samples plus the rate used to interpret it.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Mono PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Wall-clock instant at which the block was completed.
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(samples: Vec<f32>, sample_rate: u32, captured_at: Instant) -> Self {
        Self {
            samples,
            sample_rate,
            captured_at,
        }
    }

    /// Root-mean-square amplitude of the block (0.0 for an empty frame).
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum / self.samples.len() as f64).sqrt()
    }
}

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// ```rust
/// use voice_trainer::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Framer
// ---------------------------------------------------------------------------

/// Accumulates mono samples and emits complete fixed-length [`Frame`]s.
pub struct Framer {
    frame_len: usize,
    sample_rate: u32,
    pending: Vec<f32>,
}

impl Framer {
    /// # Panics
    ///
    /// Panics if `frame_len == 0`.
    pub fn new(frame_len: usize, sample_rate: u32) -> Self {
        assert!(frame_len > 0, "frame_len must be > 0");
        Self {
            frame_len,
            sample_rate,
            pending: Vec::with_capacity(frame_len * 2),
        }
    }

    /// Append interleaved samples and return every frame completed by them.
    ///
    /// All frames completed by one call share the `at` timestamp.
    pub fn push(&mut self, interleaved: &[f32], channels: u16, at: Instant) -> Vec<Frame> {
        self.pending
            .extend_from_slice(&stereo_to_mono(interleaved, channels));

        let mut frames = Vec::new();
        while self.pending.len() >= self.frame_len {
            let block: Vec<f32> = self.pending.drain(..self.frame_len).collect();
            frames.push(Frame::new(block, self.sample_rate, at));
        }
        frames
    }

    /// Samples buffered but not yet emitted.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop any partially filled frame.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
