use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::geo::country::Country;
use crate::geo::dataset::Atlas;
use crate::session::result::{QuizResult, RoundOutcome};
use crate::session::schedule::ScheduledTask;

pub const QUESTION_COUNTS: [u32; 6] = [5, 10, 20, 30, 40, 50];
pub const DEFAULT_QUESTION_COUNT: u32 = 10;
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GameMode {
    /// Prompt with the country's name.
    #[default]
    Names,
    /// Prompt with the country's capital.
    Capitals,
}

impl GameMode {
    pub const ALL: [GameMode; 2] = [GameMode::Names, GameMode::Capitals];

    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Names => "names",
            GameMode::Capitals => "capitals",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameMode::Names => "Find the country",
            GameMode::Capitals => "Find the capital's country",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn next(self) -> Self {
        match self {
            GameMode::Names => GameMode::Capitals,
            GameMode::Capitals => GameMode::Names,
        }
    }
}

/// Everything the menu hands to a new quiz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizParams {
    pub mode: GameMode,
    pub question_count: u32,
}

impl Default for QuizParams {
    fn default() -> Self {
        Self {
            mode: GameMode::Names,
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }
}

/// The enumerated count closest to `count`.
pub fn nearest_question_count(count: u32) -> u32 {
    QUESTION_COUNTS
        .into_iter()
        .min_by_key(|&c| c.abs_diff(count))
        .unwrap_or(DEFAULT_QUESTION_COUNT)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizPhase {
    Loading,
    Failed(String),
    Playing,
    Terminal,
}

/// Feedback shading for a country during the current round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    Found,
    Missed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not playing, or waiting for the next round.
    Ignored,
    /// No country under the pointer. Not an attempt.
    Ocean,
    Miss,
    Hit { finished: bool },
}

pub struct QuizSession {
    params: QuizParams,
    /// Mode actually in effect; capitals fall back to names without data.
    mode: GameMode,
    phase: QuizPhase,
    atlas: Option<Arc<Atlas>>,
    eligible: Vec<usize>,
    target: Option<usize>,
    countries_found: u32,
    total_attempts: u32,
    incorrect_attempts: u32,
    round_attempts: u32,
    started_at: Option<Instant>,
    round_started_at: Option<Instant>,
    rounds: Vec<RoundOutcome>,
    marks: HashMap<usize, Mark>,
    advance: ScheduledTask,
    advance_delay: Duration,
    result: Option<QuizResult>,
    rng: SmallRng,
}

impl QuizSession {
    pub fn new(params: QuizParams) -> Self {
        Self::with_rng(params, SmallRng::from_entropy())
    }

    pub fn with_rng(params: QuizParams, rng: SmallRng) -> Self {
        let params = QuizParams {
            question_count: params.question_count.max(1),
            ..params
        };
        Self {
            params,
            mode: params.mode,
            phase: QuizPhase::Loading,
            atlas: None,
            eligible: Vec::new(),
            target: None,
            countries_found: 0,
            total_attempts: 0,
            incorrect_attempts: 0,
            round_attempts: 0,
            started_at: None,
            round_started_at: None,
            rounds: Vec::new(),
            marks: HashMap::new(),
            advance: ScheduledTask::default(),
            advance_delay: DEFAULT_ADVANCE_DELAY,
            result: None,
            rng,
        }
    }

    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    /// Back to `Loading` after a failure, for a manual retry.
    pub fn retry(&mut self) {
        if matches!(self.phase, QuizPhase::Failed(_)) {
            self.phase = QuizPhase::Loading;
        }
    }

    pub fn atlas_failed(&mut self, reason: impl Into<String>) {
        if self.phase == QuizPhase::Loading {
            self.phase = QuizPhase::Failed(reason.into());
        }
    }

    pub fn atlas_loaded(&mut self, atlas: Arc<Atlas>, now: Instant) {
        if self.phase != QuizPhase::Loading {
            return;
        }
        let mut mode = self.params.mode;
        let mut eligible: Vec<usize> = match mode {
            GameMode::Names => (0..atlas.len()).collect(),
            GameMode::Capitals => (0..atlas.len())
                .filter(|&i| atlas.get(i).is_some_and(|c| c.facts.capital.is_some()))
                .collect(),
        };
        if eligible.is_empty() && mode == GameMode::Capitals {
            log::info!("no capitals known, falling back to country names");
            mode = GameMode::Names;
            eligible = (0..atlas.len()).collect();
        }
        if eligible.is_empty() {
            self.phase = QuizPhase::Failed("the dataset has no countries".to_string());
            return;
        }

        self.mode = mode;
        self.eligible = eligible;
        self.atlas = Some(atlas);
        self.phase = QuizPhase::Playing;
        self.started_at = Some(now);
        self.start_round(now);
    }

    fn start_round(&mut self, now: Instant) {
        let pick = self.rng.gen_range(0..self.eligible.len());
        self.target = Some(self.eligible[pick]);
        self.round_attempts = 0;
        self.round_started_at = Some(now);
        self.marks.clear();
    }

    /// A click on `country` (an atlas index), or on the ocean when `None`.
    pub fn click(&mut self, country: Option<usize>, now: Instant) -> ClickOutcome {
        if self.phase != QuizPhase::Playing || self.advance.is_pending() {
            return ClickOutcome::Ignored;
        }
        let (Some(clicked), Some(target)) = (country, self.target) else {
            return ClickOutcome::Ocean;
        };
        let Some(atlas) = self.atlas.as_ref() else {
            return ClickOutcome::Ignored;
        };
        let (Some(clicked_country), Some(target_country)) = (atlas.get(clicked), atlas.get(target))
        else {
            return ClickOutcome::Ocean;
        };
        let hit = clicked_country.is_named(&target_country.name);
        let target_name = target_country.name.clone();

        self.total_attempts += 1;
        self.round_attempts += 1;

        if !hit {
            self.incorrect_attempts += 1;
            self.marks.insert(clicked, Mark::Missed);
            return ClickOutcome::Miss;
        }

        self.countries_found += 1;
        self.marks.insert(target, Mark::Found);
        let round_secs = self
            .round_started_at
            .map(|t| now.saturating_duration_since(t).as_secs_f64())
            .unwrap_or(0.0);
        self.rounds.push(RoundOutcome {
            country: target_name,
            attempts: self.round_attempts,
            time_taken: round_secs,
        });

        if self.countries_found >= self.params.question_count {
            self.finish(now);
            ClickOutcome::Hit { finished: true }
        } else {
            self.advance.schedule(now, self.advance_delay);
            ClickOutcome::Hit { finished: false }
        }
    }

    /// Fires the pending advance when due. Returns true when a new round began.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.phase == QuizPhase::Playing && self.advance.fire(now) {
            self.start_round(now);
            true
        } else {
            false
        }
    }

    /// Ends the session early with whatever was found so far.
    pub fn end_game(&mut self, now: Instant) {
        if self.phase == QuizPhase::Playing {
            self.finish(now);
        }
    }

    fn finish(&mut self, now: Instant) {
        self.advance.cancel();
        self.phase = QuizPhase::Terminal;
        let time_taken = self
            .started_at
            .map(|t| now.saturating_duration_since(t).as_secs_f64())
            .unwrap_or(0.0);
        log::info!(
            "quiz finished: {}/{} found in {} attempts, {time_taken:.1}s",
            self.countries_found,
            self.params.question_count,
            self.total_attempts
        );
        self.result = Some(QuizResult {
            total_attempts: self.total_attempts,
            incorrect_attempts: self.incorrect_attempts,
            time_taken,
            countries_found: self.countries_found,
            question_count: self.params.question_count,
            mode: self.mode,
            detailed_stats: self.rounds.clone(),
            finished_at: chrono::Utc::now(),
        });
    }

    /// The finished result. Returns `Some` once, after the session ends.
    pub fn take_result(&mut self) -> Option<QuizResult> {
        self.result.take()
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    pub fn params(&self) -> QuizParams {
        self.params
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    pub fn target_country(&self) -> Option<&Country> {
        self.atlas.as_ref()?.get(self.target?)
    }

    /// What the player is asked to find.
    pub fn prompt(&self) -> Option<String> {
        let country = self.target_country()?;
        match self.mode {
            GameMode::Names => Some(country.name.clone()),
            GameMode::Capitals => country
                .facts
                .capital
                .clone()
                .or_else(|| Some(country.name.clone())),
        }
    }

    /// The prompt worded for the mode in effect, which may differ from the
    /// requested one after the capitals fallback.
    pub fn question(&self) -> Option<String> {
        let prompt = self.prompt()?;
        Some(match self.mode {
            GameMode::Names => format!("Find: {prompt}"),
            GameMode::Capitals => format!("Which country has the capital {prompt}?"),
        })
    }

    pub fn countries_found(&self) -> u32 {
        self.countries_found
    }

    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    pub fn incorrect_attempts(&self) -> u32 {
        self.incorrect_attempts
    }

    pub fn round_attempts(&self) -> u32 {
        self.round_attempts
    }

    pub fn question_count(&self) -> u32 {
        self.params.question_count
    }

    pub fn rounds(&self) -> &[RoundOutcome] {
        &self.rounds
    }

    pub fn mark(&self, country: usize) -> Option<Mark> {
        self.marks.get(&country).copied()
    }

    pub fn is_advancing(&self) -> bool {
        self.advance.is_pending()
    }

    /// Time left before the next target, while a hit is being shown.
    pub fn next_round_in(&self, now: Instant) -> Option<Duration> {
        self.advance.remaining(now)
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default()
    }

    pub fn progress(&self) -> f64 {
        self.countries_found as f64 / self.params.question_count as f64
    }
}
