//! Voice training core: pitch and formant estimation, exercise capture,
//! scoring and long-term progression.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod exercise;
pub mod pipeline;
pub mod progress;
pub mod scoring;
