//! Persistent practice ledger: XP, levels, streaks, unlocks, achievements.
//!
//! Stored as pretty JSON at [`AppPaths::progress_file`](crate::config::AppPaths).
//! Days are integer day numbers (see [`day_number`](super::day_number)); the
//! store never reads the clock itself.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exercise::{ExerciseKind, Section, WordLevel, WordPrompt};
use crate::scoring::{self, SessionReport};

use super::achievement::Achievement;

/// XP needed per level; the remainder carries over.
pub const XP_PER_LEVEL: u32 = 100;
/// Daily practice needed for the day to count towards the streak.
pub const STREAK_MINUTES: f64 = 5.0;
/// Consecutive passes that unlock the next section.
pub const PASSES_TO_UNLOCK: u32 = 3;
/// Successful sentence-test sessions that unlock resonance.
pub const SENTENCE_SESSIONS_TO_UNLOCK: u32 = 3;
/// Session history entries kept on disk.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("progress file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("progress file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Ledger data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionProgress {
    pub unlocked: bool,
    pub attempts: u32,
    pub consecutive_successes: u32,
    /// Successful sentence-test sessions.
    pub completed_sessions: u32,
    pub best_score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub day: i64,
    pub kind: ExerciseKind,
    pub score: Option<u32>,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub level: u32,
    /// XP towards the next level.
    pub xp: u32,
    pub total_xp: u64,
    pub streak: u32,
    pub longest_streak: u32,
    pub streak_freezes: u32,
    pub last_practice_day: Option<i64>,
    pub last_award_day: Option<i64>,
    pub daily_minutes: BTreeMap<i64, f64>,
    pub sections: BTreeMap<Section, SectionProgress>,
    /// Word drill items passed at least once, per level.
    pub words_completed: BTreeMap<WordLevel, BTreeSet<String>>,
    pub achievements: Vec<Achievement>,
    pub history: Vec<SessionRecord>,
}

impl Default for Progress {
    fn default() -> Self {
        let mut sections = BTreeMap::new();
        for section in Section::ALL {
            sections.insert(
                section,
                SectionProgress {
                    unlocked: section == Section::Pitch,
                    ..SectionProgress::default()
                },
            );
        }
        Self {
            level: 1,
            xp: 0,
            total_xp: 0,
            streak: 0,
            longest_streak: 0,
            streak_freezes: 1,
            last_practice_day: None,
            last_award_day: None,
            daily_minutes: BTreeMap::new(),
            sections,
            words_completed: BTreeMap::new(),
            achievements: Vec::new(),
            history: Vec::new(),
        }
    }
}

impl Progress {
    pub fn section(&self, section: Section) -> SectionProgress {
        self.sections.get(&section).cloned().unwrap_or_default()
    }

    pub fn is_unlocked(&self, section: Section) -> bool {
        section == Section::Pitch || self.section(section).unlocked
    }

    pub fn is_word_completed(&self, word: &WordPrompt) -> bool {
        self.words_completed
            .get(&word.level)
            .is_some_and(|done| done.contains(word.text))
    }

    /// Mastered items of `level` that are still in its list.
    pub fn words_completed_in(&self, level: WordLevel) -> usize {
        level
            .items()
            .iter()
            .filter(|&&text| self.is_word_completed(&WordPrompt { level, text }))
            .count()
    }

    pub fn is_level_completed(&self, level: WordLevel) -> bool {
        self.words_completed_in(level) == level.items().len()
    }

    /// First item of `level` not yet mastered, in list order.
    pub fn next_word(&self, level: WordLevel) -> Option<WordPrompt> {
        (0..level.items().len())
            .filter_map(|i| level.prompt(i))
            .find(|word| !self.is_word_completed(word))
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XpAward {
    pub xp: u32,
    pub level: u32,
    pub leveled_up: bool,
}

/// Everything [`ProgressStore::record_session`] changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionAward {
    pub xp: Option<XpAward>,
    pub unlocked: Option<Section>,
    pub achievements: Vec<Achievement>,
    pub streak_advanced: bool,
    /// The drilled item was passed for the first time.
    pub word_mastered: bool,
}

// ---------------------------------------------------------------------------
// ProgressStore
// ---------------------------------------------------------------------------

pub struct ProgressStore {
    data: Progress,
    path: PathBuf,
}

impl ProgressStore {
    /// Load the ledger at `path`, or start a fresh one when the file does
    /// not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ProgressError> {
        let path = path.into();
        let data = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            Progress::default()
        };
        Ok(Self { data, path })
    }

    pub fn progress(&self) -> &Progress {
        &self.data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), ProgressError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json)?;
        log::debug!("progress saved to {}", self.path.display());
        Ok(())
    }

    /// Forget everything and persist the empty ledger.
    pub fn reset(&mut self) -> Result<(), ProgressError> {
        self.data = Progress::default();
        self.save()
    }

    // -----------------------------------------------------------------------
    // XP and levels
    // -----------------------------------------------------------------------

    /// Award XP for a score in `section` on `day`.  The first award of a day
    /// carries the daily bonus.
    pub fn award(&mut self, section: Section, score: u32, day: i64) -> XpAward {
        let first_today = self.data.last_award_day != Some(day);
        let xp = scoring::xp_for_score(section, score, first_today, self.data.streak);
        self.data.last_award_day = Some(day);

        let entry = self.data.sections.entry(section).or_default();
        entry.best_score = Some(entry.best_score.map_or(score, |best| best.max(score)));

        self.add_xp(xp)
    }

    /// Add already-scaled XP and roll levels over.
    fn add_xp(&mut self, xp: u32) -> XpAward {
        let before = self.data.level;
        self.data.xp += xp;
        self.data.total_xp += u64::from(xp);
        while self.data.xp >= XP_PER_LEVEL {
            self.data.xp -= XP_PER_LEVEL;
            self.data.level += 1;
        }
        if self.data.level > before {
            log::info!("level up: {} → {}", before, self.data.level);
        }
        XpAward {
            xp,
            level: self.data.level,
            leveled_up: self.data.level > before,
        }
    }

    // -----------------------------------------------------------------------
    // Section unlocks
    // -----------------------------------------------------------------------

    /// Count a finished attempt.  Returns the section newly unlocked by
    /// reaching [`PASSES_TO_UNLOCK`] consecutive passes.
    pub fn record_attempt(&mut self, section: Section, passed: bool) -> Option<Section> {
        let entry = self.data.sections.entry(section).or_default();
        entry.attempts += 1;
        if !passed {
            entry.consecutive_successes = 0;
            return None;
        }
        entry.consecutive_successes += 1;
        if entry.consecutive_successes >= PASSES_TO_UNLOCK {
            return self.unlock(section.next()?);
        }
        None
    }

    /// A disqualified attempt breaks the run of passes.
    pub fn record_disqualification(&mut self, section: Section) {
        let entry = self.data.sections.entry(section).or_default();
        entry.attempts += 1;
        entry.consecutive_successes = 0;
    }

    /// Count a whole sentence test.  Only tests where every sentence passed
    /// count towards unlocking resonance.
    pub fn record_sentence_test(&mut self, success: bool) -> Option<Section> {
        let entry = self.data.sections.entry(Section::Sentences).or_default();
        entry.attempts += 1;
        if !success {
            return None;
        }
        entry.completed_sessions += 1;
        if entry.completed_sessions >= SENTENCE_SESSIONS_TO_UNLOCK {
            return self.unlock(Section::Resonance);
        }
        None
    }

    fn unlock(&mut self, section: Section) -> Option<Section> {
        let entry = self.data.sections.entry(section).or_default();
        if entry.unlocked {
            return None;
        }
        entry.unlocked = true;
        log::info!("section {} unlocked", section.number());
        Some(section)
    }

    /// Mark `word` as mastered.  Returns `false` when it already was.
    pub fn record_word(&mut self, word: &WordPrompt) -> bool {
        let added = self
            .data
            .words_completed
            .entry(word.level)
            .or_default()
            .insert(word.text.to_string());
        if added {
            log::info!(
                "{} {:?} mastered ({}/{})",
                word.level,
                word.text,
                self.data.words_completed_in(word.level),
                word.level.items().len()
            );
        }
        added
    }

    // -----------------------------------------------------------------------
    // Streaks
    // -----------------------------------------------------------------------

    /// Accumulate practice time for `day`.  Returns `true` when this pushed
    /// the day over [`STREAK_MINUTES`] and advanced the streak.
    pub fn add_practice_minutes(&mut self, day: i64, minutes: f64) -> bool {
        let total = self.data.daily_minutes.entry(day).or_insert(0.0);
        *total += minutes.max(0.0);
        if *total >= STREAK_MINUTES {
            self.update_streak(day)
        } else {
            false
        }
    }

    fn update_streak(&mut self, day: i64) -> bool {
        let g = &mut self.data;
        match g.last_practice_day {
            None => g.streak = 1,
            Some(last) => match day - last {
                0 => return false,
                1 => g.streak += 1,
                2 if g.streak_freezes > 0 => {
                    g.streak_freezes -= 1;
                    g.streak += 1;
                    log::info!("streak freeze used ({} left)", g.streak_freezes);
                }
                _ => g.streak = 1,
            },
        }
        g.last_practice_day = Some(day);
        g.longest_streak = g.longest_streak.max(g.streak);
        if g.streak % 7 == 0 {
            g.streak_freezes += 1;
        }
        true
    }

    /// Distinct practice days in the 30 days ending at `day`.
    fn practice_days_in_month(&self, day: i64) -> usize {
        self.data.daily_minutes.range(day - 29..=day).count()
    }

    // -----------------------------------------------------------------------
    // Achievements
    // -----------------------------------------------------------------------

    /// Unlock `achievement` and grant its streak-scaled reward.  Returns the
    /// XP granted, or `None` when it was already unlocked.
    pub fn unlock_achievement(&mut self, achievement: Achievement) -> Option<XpAward> {
        if self.data.achievements.contains(&achievement) {
            return None;
        }
        self.data.achievements.push(achievement);
        log::info!("achievement unlocked: {}", achievement.name());
        let xp = scoring::scale_by_streak(f64::from(achievement.xp_reward()), self.data.streak);
        Some(self.add_xp(xp))
    }

    pub fn has_achievement(&self, achievement: Achievement) -> bool {
        self.data.achievements.contains(&achievement)
    }

    // -----------------------------------------------------------------------
    // Whole-session bookkeeping
    // -----------------------------------------------------------------------

    /// Apply a finished session: XP, attempt counters, practice time, then
    /// achievements.
    pub fn record_session(&mut self, report: &SessionReport, day: i64) -> SessionAward {
        let mut award = SessionAward {
            xp: report.score.map(|s| self.award(report.section, s.total, day)),
            ..SessionAward::default()
        };

        if report.kind != ExerciseKind::SentenceTest {
            award.unlocked = self.record_attempt(report.section, report.passed);
        }
        if let Some(word) = report.word.filter(|_| report.passed) {
            award.word_mastered = self.record_word(&word);
        }
        award.streak_advanced =
            self.add_practice_minutes(day, report.duration.as_secs_f64() / 60.0);

        self.data.history.push(SessionRecord {
            day,
            kind: report.kind,
            score: report.score.map(|s| s.total),
            passed: report.passed,
        });
        if self.data.history.len() > HISTORY_LIMIT {
            let excess = self.data.history.len() - HISTORY_LIMIT;
            self.data.history.drain(..excess);
        }

        for achievement in self.earned(report, day) {
            if self.unlock_achievement(achievement).is_some() {
                award.achievements.push(achievement);
            }
        }
        award
    }

    fn earned(&self, report: &SessionReport, day: i64) -> Vec<Achievement> {
        let mut earned = vec![Achievement::FirstSteps];

        match report.kind {
            ExerciseKind::PitchSustain => {
                if report
                    .target_hz
                    .is_some_and(|t| (report.avg_pitch - t).abs() <= 1.0)
                {
                    earned.push(Achievement::PitchPerfect);
                }
                if report.duration.as_secs_f64() >= 30.0 && report.avg_stddev < 5.0 {
                    earned.push(Achievement::RockSolid);
                }
                if report.time_to_hit.is_some_and(|t| t.as_secs_f64() < 1.0) {
                    earned.push(Achievement::Speedster);
                }
            }
            ExerciseKind::ResonanceSustain => {
                if report.avg_stability.is_some_and(|s| s < 10.0) {
                    earned.push(Achievement::ResonanceMaster);
                }
            }
            ExerciseKind::WordDrill => {
                if let Some(word) = report.word {
                    if self.data.is_level_completed(word.level) {
                        earned.push(Achievement::for_word_level(word.level));
                    }
                }
            }
            _ => {}
        }

        if report.duration.as_secs_f64() >= 60.0 * 60.0 {
            earned.push(Achievement::Marathoner);
        }
        earned.extend(Achievement::for_streak(self.data.streak));
        if self.practice_days_in_month(day) >= 30 {
            earned.push(Achievement::Overachiever);
        }
        earned
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{PHRASES, VOWELS};
    use crate::scoring::{pitch_score, word_score, EndReason};
    use std::time::Duration;
    use tempfile::tempdir;

    fn store_in_temp() -> (ProgressStore, tempfile::TempDir) {
        let dir = tempdir().expect("temp dir");
        let store = ProgressStore::open(dir.path().join("progress.json")).expect("open");
        (store, dir)
    }

    fn pitch_report(avg: f64, stddev: f64, secs: u64) -> SessionReport {
        SessionReport {
            kind: ExerciseKind::PitchSustain,
            section: Section::Pitch,
            ended: EndReason::AutoStop,
            duration: Duration::from_secs(secs),
            time_to_hit: Some(Duration::from_secs(3)),
            rows: 100,
            target_hz: Some(200.0),
            avg_pitch: avg,
            avg_stddev: stddev,
            avg_stability: None,
            melodic_stability: 0.0,
            score: Some(pitch_score(200.0, avg, 3.0, secs as f64, stddev)),
            passed: stddev < 10.0,
            word: None,
        }
    }

    fn word_report(word: WordPrompt, passed: bool) -> SessionReport {
        SessionReport {
            kind: ExerciseKind::WordDrill,
            section: Section::Words,
            ended: EndReason::Manual,
            duration: Duration::from_secs(5),
            time_to_hit: Some(Duration::ZERO),
            rows: 50,
            target_hz: None,
            avg_pitch: 200.0,
            avg_stddev: if passed { 2.0 } else { 20.0 },
            avg_stability: Some(2.0),
            melodic_stability: 0.0,
            score: Some(word_score(if passed { 2.0 } else { 20.0 }, 2.0)),
            passed,
            word: Some(word),
        }
    }

    #[test]
    fn fresh_ledger_defaults() {
        let (store, _dir) = store_in_temp();
        let p = store.progress();
        assert_eq!(p.level, 1);
        assert_eq!(p.streak_freezes, 1);
        assert!(p.is_unlocked(Section::Pitch));
        assert!(!p.is_unlocked(Section::Sentences));
    }

    #[test]
    fn daily_bonus_only_once_per_day() {
        let (mut store, _dir) = store_in_temp();
        assert_eq!(store.award(Section::Pitch, 257, 10).xp, 35);
        assert_eq!(store.award(Section::Pitch, 257, 10).xp, 25);
        assert_eq!(store.award(Section::Pitch, 257, 11).xp, 35);
        assert_eq!(store.progress().section(Section::Pitch).best_score, Some(257));
    }

    #[test]
    fn levels_carry_over() {
        let (mut store, _dir) = store_in_temp();
        store.award(Section::Pitch, 900, 1); // 90 + 10
        let p = store.progress();
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 0);

        let a = store.award(Section::Resonance, 100, 1); // 10 × 2
        assert_eq!(a.xp, 20);
        assert!(!a.leveled_up);
        let a = store.award(Section::Resonance, 400, 1); // 40 × 2
        assert!(a.leveled_up);
        assert_eq!(store.progress().level, 3);
        assert_eq!(store.progress().xp, 0);
        assert_eq!(store.progress().total_xp, 200);
    }

    #[test]
    fn three_consecutive_passes_unlock_next_section() {
        let (mut store, _dir) = store_in_temp();
        assert_eq!(store.record_attempt(Section::Pitch, true), None);
        assert_eq!(store.record_attempt(Section::Pitch, true), None);
        store.record_disqualification(Section::Pitch);
        assert_eq!(store.record_attempt(Section::Pitch, true), None);
        assert_eq!(store.record_attempt(Section::Pitch, true), None);
        assert_eq!(
            store.record_attempt(Section::Pitch, true),
            Some(Section::Sentences)
        );
        // Already unlocked.
        assert_eq!(store.record_attempt(Section::Pitch, true), None);
        assert_eq!(store.progress().section(Section::Pitch).attempts, 7);
    }

    #[test]
    fn failed_attempt_resets_the_run() {
        let (mut store, _dir) = store_in_temp();
        store.record_attempt(Section::Resonance, true);
        store.record_attempt(Section::Resonance, true);
        store.record_attempt(Section::Resonance, false);
        assert_eq!(
            store.progress().section(Section::Resonance).consecutive_successes,
            0
        );
    }

    #[test]
    fn three_full_sentence_tests_unlock_resonance() {
        let (mut store, _dir) = store_in_temp();
        assert_eq!(store.record_sentence_test(true), None);
        assert_eq!(store.record_sentence_test(false), None);
        assert_eq!(store.record_sentence_test(true), None);
        assert_eq!(store.record_sentence_test(true), Some(Section::Resonance));
    }

    #[test]
    fn streak_needs_five_minutes_a_day() {
        let (mut store, _dir) = store_in_temp();
        assert!(!store.add_practice_minutes(100, 3.0));
        assert_eq!(store.progress().streak, 0);
        assert!(store.add_practice_minutes(100, 2.0));
        assert_eq!(store.progress().streak, 1);
        // Same day again: no change.
        assert!(!store.add_practice_minutes(100, 10.0));
        assert!(store.add_practice_minutes(101, 6.0));
        assert_eq!(store.progress().streak, 2);
    }

    #[test]
    fn one_missed_day_uses_a_freeze() {
        let (mut store, _dir) = store_in_temp();
        store.add_practice_minutes(1, 5.0);
        store.add_practice_minutes(3, 5.0);
        assert_eq!(store.progress().streak, 2);
        assert_eq!(store.progress().streak_freezes, 0);
        // No freeze left: the streak restarts.
        store.add_practice_minutes(5, 5.0);
        assert_eq!(store.progress().streak, 1);
        assert_eq!(store.progress().longest_streak, 2);
    }

    #[test]
    fn every_seventh_day_grants_a_freeze() {
        let (mut store, _dir) = store_in_temp();
        for day in 0..7 {
            store.add_practice_minutes(day, 5.0);
        }
        assert_eq!(store.progress().streak, 7);
        assert_eq!(store.progress().streak_freezes, 2);
    }

    #[test]
    fn achievements_unlock_once_with_streak_scaling() {
        let (mut store, _dir) = store_in_temp();
        assert_eq!(store.unlock_achievement(Achievement::FirstSteps).unwrap().xp, 10);
        assert_eq!(store.unlock_achievement(Achievement::FirstSteps), None);

        for day in 0..7 {
            store.add_practice_minutes(day, 5.0);
        }
        assert_eq!(store.unlock_achievement(Achievement::Consistent7).unwrap().xp, 150);
    }

    #[test]
    fn record_session_applies_everything() {
        let (mut store, _dir) = store_in_temp();
        let report = pitch_report(200.5, 3.0, 360);
        let award = store.record_session(&report, 42);

        // 95 + 20 + 100 + 70 = 285 → 28 + 10
        assert_eq!(award.xp.unwrap().xp, 38);
        assert!(award.streak_advanced);
        assert_eq!(
            award.achievements,
            vec![
                Achievement::FirstSteps,
                Achievement::PitchPerfect,
                Achievement::RockSolid
            ]
        );
        let p = store.progress();
        assert_eq!(p.total_xp, 38 + 10 + 50 + 100);
        assert_eq!(p.history.len(), 1);
        assert_eq!(p.section(Section::Pitch).consecutive_successes, 1);

        // Nothing new the second time.
        let award = store.record_session(&pitch_report(210.0, 12.0, 60), 42);
        assert!(award.achievements.is_empty());
        assert!(!award.streak_advanced);
        assert_eq!(store.progress().section(Section::Pitch).consecutive_successes, 0);
    }

    #[test]
    fn repeating_a_mastered_word_counts_once() {
        let (mut store, _dir) = store_in_temp();
        let hello = WordLevel::Words.find("hello").unwrap();

        assert!(!store.record_session(&word_report(hello, false), 1).word_mastered);
        assert!(store.record_session(&word_report(hello, true), 1).word_mastered);
        for _ in 0..60 {
            let award = store.record_session(&word_report(hello, true), 1);
            assert!(!award.word_mastered);
        }
        let p = store.progress();
        assert_eq!(p.words_completed_in(WordLevel::Words), 1);
        assert!(!store.has_achievement(Achievement::WordWizard));
        assert_eq!(
            p.next_word(WordLevel::Words).map(|w| w.text),
            Some("water")
        );
    }

    #[test]
    fn mastering_a_whole_level_earns_its_achievement() {
        let (mut store, _dir) = store_in_temp();
        for (i, vowel) in VOWELS.iter().enumerate() {
            let word = WordLevel::Vowels.find(vowel).unwrap();
            let award = store.record_session(&word_report(word, true), 1);
            let last = i == VOWELS.len() - 1;
            assert_eq!(
                award.achievements.contains(&Achievement::VowelVirtuoso),
                last,
                "after {vowel}"
            );
        }
        assert!(store.progress().is_level_completed(WordLevel::Vowels));
        assert_eq!(store.progress().next_word(WordLevel::Vowels), None);
        // Other levels are tracked separately.
        assert!(!store.has_achievement(Achievement::PhrasePhenom));
        assert_eq!(store.progress().words_completed_in(WordLevel::Phrases), 0);
    }

    #[test]
    fn every_phrase_earns_phrase_phenom() {
        let (mut store, _dir) = store_in_temp();
        for phrase in PHRASES {
            let word = WordLevel::Phrases.find(phrase).unwrap();
            store.record_session(&word_report(word, true), 1);
        }
        assert!(store.has_achievement(Achievement::PhrasePhenom));
        assert!(!store.has_achievement(Achievement::WordWizard));
    }

    #[test]
    fn history_is_capped() {
        let (mut store, _dir) = store_in_temp();
        for day in 0..(HISTORY_LIMIT as i64 + 5) {
            store.record_session(&pitch_report(200.0, 20.0, 10), day);
        }
        assert_eq!(store.progress().history.len(), HISTORY_LIMIT);
        assert_eq!(store.progress().history[0].day, 5);
    }

    #[test]
    fn survives_a_save_and_reload() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("progress.json");
        let mut store = ProgressStore::open(&path).unwrap();
        store.record_session(&pitch_report(200.0, 2.0, 60), 7);
        store.record_attempt(Section::Pitch, true);
        store.save().unwrap();

        let reloaded = ProgressStore::open(&path).unwrap();
        assert_eq!(reloaded.progress(), store.progress());
        assert!(reloaded.has_achievement(Achievement::FirstSteps));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ProgressStore::open(&path),
            Err(ProgressError::Json(_))
        ));
    }
}
