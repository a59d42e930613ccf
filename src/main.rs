//! Voice trainer CLI.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (defaults on first run).
//! 3. Open the progression ledger.
//! 4. Open the microphone; a missing device fails here, before any session.
//! 5. Spawn the pipeline orchestrator on a tokio runtime.
//! 6. Spawn the framing thread: cpal chunks → [`Framer`] → `PipelineEvent::Frame`.
//! 7. Start the exercise and wait for its result (or Ctrl-C / `--seconds`).
//!
//! # Usage
//!
//! ```bash
//! voice-trainer run pitch-sustain
//! voice-trainer run resonance-practice --seconds 60
//! voice-trainer run word-drill --level phrases --item "good morning"
//! voice-trainer sentences
//! voice-trainer progress --json
//! voice-trainer note A3
//! ```

use std::io::BufRead;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use voice_trainer::{
    analysis::{frequency_to_note, named_note_frequency, Analyzer},
    audio::{AudioCapture, AudioChunk, Framer, StreamHandle},
    config::{AppConfig, AppPaths},
    exercise::{ExerciseKind, SentenceStep, WordLevel, WordPrompt, SENTENCES},
    pipeline::{
        new_shared_state, PipelineEvent, PipelineOrchestrator, PipelineResult, SharedState,
    },
    progress::{self, Achievement, ProgressStore},
    scoring::SessionReport,
};

#[derive(Parser)]
#[command(name = "voice-trainer")]
#[command(about = "Pitch and resonance training from the microphone")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one exercise
    Run {
        /// pitch-sustain, pitch-practice, sentence-practice, resonance-sustain,
        /// resonance-practice or word-drill
        exercise: ExerciseKind,

        /// Input device name (defaults to the configured or system device)
        #[arg(short, long)]
        device: Option<String>,

        /// Stop after this many seconds
        #[arg(short, long)]
        seconds: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Word drill list: vowels, words or phrases
        #[arg(long, default_value = "words")]
        level: WordLevel,

        /// Word drill item (defaults to the next one not yet mastered)
        #[arg(long)]
        item: Option<String>,
    },

    /// Run the six-sentence test; press Enter after each sentence
    Sentences {
        /// Input device name
        #[arg(short, long)]
        device: Option<String>,
    },

    /// Show XP, streak, unlocks and achievements
    Progress {
        /// Print the raw ledger as JSON
        #[arg(long)]
        json: bool,

        /// Erase all progress
        #[arg(long)]
        reset: bool,
    },

    /// Print the frequency of a note such as E3 or F#4
    Note { note: String },

    /// Write the default settings file if none exists and print its path
    InitConfig,
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let paths = AppPaths::new();

    match cli.command {
        Commands::Run {
            exercise,
            device,
            seconds,
            json,
            level,
            item,
        } => {
            if exercise == ExerciseKind::SentenceTest {
                anyhow::bail!("use `voice-trainer sentences` for the sentence test");
            }
            let mut store = ProgressStore::open(paths.progress_file.clone())?;
            let word = if exercise == ExerciseKind::WordDrill {
                Some(pick_word(&store, level, item.as_deref())?)
            } else {
                None
            };
            let device = device.or_else(|| config.audio.input_device.clone());
            let session = Session::open(&config, device.as_deref())?;
            session.block_on(run_exercise(
                &session,
                exercise,
                word,
                seconds.map(Duration::from_secs),
                json,
                &mut store,
            ))?;
        }
        Commands::Sentences { device } => {
            let mut store = ProgressStore::open(paths.progress_file.clone())?;
            let device = device.or_else(|| config.audio.input_device.clone());
            let session = Session::open(&config, device.as_deref())?;
            session.block_on(run_sentences(&session, &mut store))?;
        }
        Commands::Progress { json, reset } => {
            let mut store = ProgressStore::open(paths.progress_file.clone())?;
            if reset {
                store.reset()?;
                println!("progress reset");
            } else if json {
                println!("{}", serde_json::to_string_pretty(store.progress())?);
            } else {
                print_progress(&store);
            }
        }
        Commands::Note { note } => {
            let hz = named_note_frequency(&note)?;
            println!("{note} = {hz:.2} Hz");
        }
        Commands::InitConfig => {
            if !paths.settings_file.exists() {
                config.save_to(&paths.settings_file)?;
            }
            println!("{}", paths.settings_file.display());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Session wiring
// ---------------------------------------------------------------------------

/// Everything needed to run exercises against a live microphone.
struct Session {
    rt: tokio::runtime::Runtime,
    state: SharedState,
    events: mpsc::Sender<PipelineEvent>,
    results: tokio::sync::Mutex<mpsc::Receiver<PipelineResult>>,
    _stream: StreamHandle,
}

impl Session {
    fn open(config: &AppConfig, device: Option<&str>) -> anyhow::Result<Self> {
        let capture = AudioCapture::open(device).context("could not open the microphone")?;
        let target_hz = config.target_frequency()?;

        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .context("failed to create tokio runtime")?;

        let state = new_shared_state(config.clone());
        let (event_tx, event_rx) = mpsc::channel::<PipelineEvent>(64);
        let (result_tx, result_rx) = mpsc::channel::<PipelineResult>(8);

        let orchestrator = PipelineOrchestrator::new(
            state.clone(),
            Analyzer::new(&config.analysis),
            target_hz,
            result_tx,
        );
        rt.spawn(orchestrator.run(event_rx));

        // Framing thread: cpal chunks → fixed frames → orchestrator.
        let (chunk_tx, chunk_rx) = std::sync::mpsc::channel::<AudioChunk>();
        let frame_tx = event_tx.clone();
        let mut framer = Framer::new(config.audio.frame_size.max(1), capture.sample_rate());
        std::thread::Builder::new()
            .name("audio-framer".into())
            .spawn(move || {
                while let Ok(chunk) = chunk_rx.recv() {
                    for frame in framer.push(&chunk.samples, chunk.channels, Instant::now()) {
                        if frame_tx.blocking_send(PipelineEvent::Frame(frame)).is_err() {
                            return;
                        }
                    }
                }
            })
            .context("failed to spawn audio-framer thread")?;

        let stream = capture.start(chunk_tx)?;
        log::info!(
            "audio capture started ({} Hz, {} ch), target {:.2} Hz",
            capture.sample_rate(),
            capture.channels(),
            target_hz
        );

        Ok(Self {
            rt,
            state,
            events: event_tx,
            results: tokio::sync::Mutex::new(result_rx),
            _stream: stream,
        })
    }

    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.rt.block_on(future)
    }

    async fn send(&self, event: PipelineEvent) -> anyhow::Result<()> {
        self.events
            .send(event)
            .await
            .context("pipeline stopped unexpectedly")
    }

    async fn next_result(&self) -> anyhow::Result<PipelineResult> {
        self.results
            .lock()
            .await
            .recv()
            .await
            .context("pipeline stopped unexpectedly")
    }
}

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

async fn run_exercise(
    session: &Session,
    kind: ExerciseKind,
    word: Option<WordPrompt>,
    limit: Option<Duration>,
    json: bool,
    store: &mut ProgressStore,
) -> anyhow::Result<()> {
    match word {
        Some(word) => {
            session.send(PipelineEvent::StartWordDrill(word)).await?;
            println!("Say: {}", word.text);
        }
        None => session.send(PipelineEvent::Start(kind)).await?,
    }
    println!("{kind}: started (Ctrl-C to stop)");

    let deadline = tokio::time::sleep(limit.unwrap_or(Duration::from_secs(24 * 60 * 60)));
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(Duration::from_millis(500));

    let result = loop {
        tokio::select! {
            result = session.next_result() => break result?,
            _ = tokio::signal::ctrl_c() => {
                session.send(PipelineEvent::Stop).await?;
                break session.next_result().await?;
            }
            _ = &mut deadline => {
                session.send(PipelineEvent::Stop).await?;
                break session.next_result().await?;
            }
            _ = ticker.tick() => print_live(&session.state),
        }
    };
    println!();

    let day = progress::today();
    match result {
        PipelineResult::Finished(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            let award = store.record_session(&report, day);
            if let Some(xp) = award.xp {
                println!("+{} XP (level {})", xp.xp, xp.level);
            }
            if award.word_mastered {
                if let Some(word) = report.word {
                    println!("\"{}\" mastered", word.text);
                }
            }
            if let Some(section) = award.unlocked {
                println!("Section {} unlocked!", section.number());
            }
            print_achievements(&award.achievements);
        }
        PipelineResult::Disqualified(kind) => {
            println!("{kind}: disqualified, try again");
            store.record_disqualification(kind.section());
        }
        PipelineResult::NoData(kind) => println!("{kind}: nothing was recorded, try again"),
        PipelineResult::PracticeEnded(kind) => println!("{kind}: practice ended"),
        PipelineResult::SentenceStep(_) => {}
    }
    store.save()?;
    Ok(())
}

fn pick_word(
    store: &ProgressStore,
    level: WordLevel,
    item: Option<&str>,
) -> anyhow::Result<WordPrompt> {
    match item {
        Some(text) => level
            .find(text)
            .with_context(|| format!("{text:?} is not in the {level} list")),
        None => store.progress().next_word(level).with_context(|| {
            format!("every item in {level} is mastered; pass --item to repeat one")
        }),
    }
}

async fn run_sentences(session: &Session, store: &mut ProgressStore) -> anyhow::Result<()> {
    session.send(PipelineEvent::StartSentenceTest).await?;
    println!("Read each sentence aloud, then press Enter.\n");
    println!("1/6: \"{}\"", SENTENCES[0].text);

    // Enter → NextSentence.  The thread ends with the process.
    let next_tx = session.events.clone();
    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for _ in std::io::stdin().lock().lines() {
                if next_tx.blocking_send(PipelineEvent::NextSentence).is_err() {
                    return;
                }
            }
        })
        .context("failed to spawn stdin thread")?;

    loop {
        let result = tokio::select! {
            result = session.next_result() => result?,
            _ = tokio::signal::ctrl_c() => {
                session.send(PipelineEvent::Stop).await?;
                println!("sentence test abandoned");
                return Ok(());
            }
        };
        let PipelineResult::SentenceStep(step) = result else {
            continue;
        };
        match step {
            SentenceStep::NoSpeech { index } => {
                println!("No speech detected, try again.");
                println!("{}/6: \"{}\"", index + 1, SENTENCES[index].text);
            }
            SentenceStep::Evaluated(r) => {
                println!(
                    "  {:.1} Hz, melodic stability {:.1} Hz: {}",
                    r.avg_pitch,
                    r.melodic_stability,
                    if r.passed { "passed" } else { "failed" }
                );
                let next = r.index + 1;
                println!("{}/6: \"{}\"", next + 1, SENTENCES[next].text);
            }
            SentenceStep::Finished(summary) => {
                if let Some(last) = summary.results.last() {
                    println!(
                        "  {:.1} Hz, melodic stability {:.1} Hz: {}",
                        last.avg_pitch,
                        last.melodic_stability,
                        if last.passed { "passed" } else { "failed" }
                    );
                }
                println!("\n{}/{} sentences passed", summary.passed, summary.total);
                if let Some(section) = store.record_sentence_test(summary.success) {
                    println!("Section {} unlocked!", section.number());
                }
                store.save()?;
                return Ok(());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_live(state: &SharedState) {
    let st = state.lock().unwrap();
    let Some(snap) = st.snapshot.as_ref() else {
        return;
    };
    let pitch = match snap.avg_pitch {
        Some(hz) => match frequency_to_note(hz) {
            Some(note) => format!("{hz:6.1} Hz {note}"),
            None => format!("{hz:6.1} Hz"),
        },
        None => "   --- Hz".to_string(),
    };
    let mut line = format!(
        "\r[{}] {:?} {pitch} σ {:4.1}",
        st.phase.label(),
        snap.capture,
        snap.pitch_stddev
    );
    if let Some(stability) = snap.resonance_stability {
        line.push_str(&format!(" res {stability:4.1}%"));
    }
    if let Some(left) = snap.remaining {
        line.push_str(&format!(" {:4.1}s left", left.as_secs_f64()));
    }
    if let Some(hint) = snap.feedback {
        line.push_str(&format!(" {hint}"));
    }
    eprint!("{line:<90}");
}

fn print_report(report: &SessionReport) {
    println!("{} ({:?})", report.kind, report.ended);
    println!("  duration      {:.1} s", report.duration.as_secs_f64());
    if let Some(tth) = report.time_to_hit {
        println!("  time to hit   {:.2} s", tth.as_secs_f64());
    }
    println!("  avg pitch     {:.1} Hz", report.avg_pitch);
    println!("  avg stddev    {:.1} Hz", report.avg_stddev);
    if let Some(stability) = report.avg_stability {
        println!("  stability     {stability:.1} %");
    }
    if let Some(score) = report.score {
        println!("  score         {}", score.total);
    }
    println!("  {}", if report.passed { "PASSED" } else { "not passed" });
}

fn print_achievements(achievements: &[Achievement]) {
    for a in achievements {
        println!("Achievement: {} ({}) +{} XP", a.name(), a.description(), a.xp_reward());
    }
}

fn print_progress(store: &ProgressStore) {
    let p = store.progress();
    println!("Level {} ({}/100 XP, {} total)", p.level, p.xp, p.total_xp);
    println!(
        "Streak {} days (longest {}, {} freezes)",
        p.streak, p.longest_streak, p.streak_freezes
    );
    for (section, sp) in &p.sections {
        println!(
            "Section {} {:?}: {}, {} attempts, {} in a row{}",
            section.number(),
            section,
            if p.is_unlocked(*section) { "unlocked" } else { "locked" },
            sp.attempts,
            sp.consecutive_successes,
            sp.best_score
                .map(|s| format!(", best {s}"))
                .unwrap_or_default()
        );
    }
    for level in WordLevel::ALL {
        println!(
            "Word drill {level}: {}/{} mastered",
            p.words_completed_in(level),
            level.items().len()
        );
    }
    println!("Achievements {}/{}", p.achievements.len(), Achievement::ALL.len());
    for a in &p.achievements {
        println!("  {}", a.name());
    }
}
