//! Long-term practice progression: XP, levels, streaks and unlocks.

pub mod achievement;
pub mod store;

use std::time::{SystemTime, UNIX_EPOCH};

pub use achievement::Achievement;
pub use store::{
    Progress, ProgressError, ProgressStore, SectionProgress, SessionAward, SessionRecord, XpAward,
};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Whole UTC days since the Unix epoch.
pub fn day_number(at: SystemTime) -> i64 {
    let secs = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    (secs / SECS_PER_DAY) as i64
}

/// Today's [`day_number`].
pub fn today() -> i64 {
    day_number(SystemTime::now())
}
