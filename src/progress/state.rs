use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use super::ledger::{CompletionLedger, TokenLedger, UnlockLedger};
use super::ProgressError;
use crate::content::{Chapter, Level};
use crate::quiz::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Summary,
    Baseline,
    Quiz,
}

/// Where the learner is inside the active chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressionCursor {
    pub chapter_id: String,
    pub phase: Phase,
    pub level: Level,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Activate {
        chapter_id: String,
        tutor_limit: Option<u32>,
    },
    FinishedReading,
    BaselineSubmitted(Score),
    QuizScored(Score),
    TutorAnswered,
    Exit,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::Activate { .. } => "activate",
            Event::FinishedReading => "finished reading",
            Event::BaselineSubmitted(_) => "baseline submitted",
            Event::QuizScored(_) => "quiz scored",
            Event::TutorAnswered => "tutor answered",
            Event::Exit => "exit",
        }
    }
}

/// What an applied event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Activated { chapter_id: String },
    EnteredBaseline,
    EnteredQuiz(Level),
    LevelPassed { passed: Level, next: Level },
    Retry(Level),
    ChapterCompleted {
        chapter_id: String,
        unlocked: Option<String>,
    },
    TokenSpent { tokens_left: u32 },
    Exited,
}

/// Identity of the live cursor when an outstanding call was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub chapter_id: String,
    activation: u64,
    epoch: u64,
}

/// Everything the progression owns: manifest order, ledgers and cursor.
#[derive(Debug, Clone)]
pub struct ProgressionState {
    chapters: Vec<Chapter>,
    unlocked: UnlockLedger,
    completed: CompletionLedger,
    tokens: TokenLedger,
    baseline: HashMap<String, Score>,
    cursor: Option<ProgressionCursor>,
    // bumped on every activation
    activation: u64,
    // bumped on every cursor change
    epoch: u64,
}

impl ProgressionState {
    pub fn new(chapters: Vec<Chapter>, default_tokens: u32) -> Self {
        Self {
            unlocked: UnlockLedger::seed(&chapters),
            completed: CompletionLedger::default(),
            tokens: TokenLedger::new(default_tokens, &chapters),
            baseline: HashMap::new(),
            cursor: None,
            activation: 0,
            epoch: 0,
            chapters,
        }
    }

    /// Swaps in a re-fetched manifest without losing earned progress.
    pub fn refresh_manifest(&mut self, chapters: Vec<Chapter>) {
        self.unlocked.merge(&chapters);
        self.tokens.merge(&chapters);
        if let Some(cursor) = &self.cursor {
            if !chapters.iter().any(|c| c.id == cursor.chapter_id) {
                info!(chapter = %cursor.chapter_id, "active chapter left the manifest");
                self.clear_cursor();
            }
        }
        self.chapters = chapters;
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn cursor(&self) -> Option<&ProgressionCursor> {
        self.cursor.as_ref()
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.is_unlocked(id)
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.is_completed(id)
    }

    pub fn completed(&self) -> &CompletionLedger {
        &self.completed
    }

    pub fn tokens_left(&self, id: &str) -> u32 {
        self.tokens.balance(id)
    }

    pub fn tokens(&self) -> &TokenLedger {
        &self.tokens
    }

    pub fn baseline_score(&self, id: &str) -> Option<Score> {
        self.baseline.get(id).copied()
    }

    pub fn ticket(&self) -> Option<Ticket> {
        self.cursor.as_ref().map(|c| Ticket {
            chapter_id: c.chapter_id.clone(),
            activation: self.activation,
            epoch: self.epoch,
        })
    }

    /// Applies `event` only if the cursor is still the one `ticket` was taken
    /// from. Tutor answers only need the same activation of the same chapter;
    /// everything else needs the exact cursor. `Ok(None)` means discarded.
    pub fn apply_if_live(
        &mut self,
        ticket: &Ticket,
        event: Event,
    ) -> Result<Option<Transition>, ProgressError> {
        let same_chapter = self
            .cursor
            .as_ref()
            .is_some_and(|c| c.chapter_id == ticket.chapter_id)
            && self.activation == ticket.activation;
        let live = match event {
            Event::TutorAnswered => same_chapter,
            _ => same_chapter && self.epoch == ticket.epoch,
        };
        if !live {
            debug!(chapter = %ticket.chapter_id, event = event.name(), "discarding stale completion");
            return Ok(None);
        }
        self.apply(event).map(Some)
    }

    /// Runs one step of the state machine. On error nothing has changed.
    pub fn apply(&mut self, event: Event) -> Result<Transition, ProgressError> {
        match event {
            Event::Activate {
                chapter_id,
                tutor_limit,
            } => self.activate(chapter_id, tutor_limit),
            Event::Exit => {
                let cursor = self.cursor.as_ref().ok_or(ProgressError::NoActiveChapter)?;
                info!(chapter = %cursor.chapter_id, "left chapter");
                self.clear_cursor();
                Ok(Transition::Exited)
            }
            Event::TutorAnswered => {
                let cursor = self.cursor.as_ref().ok_or(ProgressError::NoActiveChapter)?;
                let tokens_left = self.tokens.spend(&cursor.chapter_id);
                Ok(Transition::TokenSpent { tokens_left })
            }
            Event::FinishedReading => {
                let cursor = self.expect_phase(Phase::Summary, &Event::FinishedReading)?;
                cursor.phase = Phase::Baseline;
                self.epoch += 1;
                Ok(Transition::EnteredBaseline)
            }
            Event::BaselineSubmitted(score) => {
                let event = Event::BaselineSubmitted(score);
                let cursor = self.expect_phase(Phase::Baseline, &event)?;
                cursor.phase = Phase::Quiz;
                cursor.level = Level::Novice;
                let id = cursor.chapter_id.clone();
                info!(chapter = %id, correct = score.correct, total = score.total, "baseline recorded");
                self.baseline.insert(id, score);
                self.epoch += 1;
                Ok(Transition::EnteredQuiz(Level::Novice))
            }
            Event::QuizScored(score) => self.score_quiz(score),
        }
    }

    fn activate(
        &mut self,
        chapter_id: String,
        tutor_limit: Option<u32>,
    ) -> Result<Transition, ProgressError> {
        if !self.chapters.iter().any(|c| c.id == chapter_id) {
            return Err(ProgressError::UnknownChapter(chapter_id));
        }
        if !self.unlocked.is_unlocked(&chapter_id) {
            return Err(ProgressError::ChapterLocked(chapter_id));
        }
        if let Some(previous) = &self.cursor {
            info!(from = %previous.chapter_id, to = %chapter_id, "switching chapter");
        }

        self.tokens.seed_on_activation(&chapter_id, tutor_limit);
        self.cursor = Some(ProgressionCursor {
            chapter_id: chapter_id.clone(),
            phase: Phase::Summary,
            level: Level::Novice,
        });
        self.activation += 1;
        self.epoch += 1;
        info!(chapter = %chapter_id, tokens = self.tokens.balance(&chapter_id), "chapter started");
        Ok(Transition::Activated { chapter_id })
    }

    fn score_quiz(&mut self, score: Score) -> Result<Transition, ProgressError> {
        let cursor = self.expect_phase(Phase::Quiz, &Event::QuizScored(score))?;
        let level = cursor.level;

        if !score.passed() {
            debug!(chapter = %cursor.chapter_id, %level, correct = score.correct, total = score.total, "level failed");
            return Ok(Transition::Retry(level));
        }

        if let Some(next) = level.next() {
            cursor.level = next;
            info!(chapter = %cursor.chapter_id, passed = %level, %next, "level passed");
            self.epoch += 1;
            return Ok(Transition::LevelPassed {
                passed: level,
                next,
            });
        }

        let chapter_id = cursor.chapter_id.clone();
        self.completed.complete(&chapter_id);
        let index = self.chapters.iter().position(|c| c.id == chapter_id);
        let next_id = index
            .and_then(|i| self.chapters.get(i + 1))
            .map(|c| c.id.clone());
        if let Some(next_id) = &next_id {
            self.unlocked.unlock(next_id);
            self.tokens.reset(next_id);
        }
        self.clear_cursor();
        info!(chapter = %chapter_id, unlocked = ?next_id, "chapter completed");
        Ok(Transition::ChapterCompleted {
            chapter_id,
            unlocked: next_id,
        })
    }

    fn expect_phase(
        &mut self,
        phase: Phase,
        event: &Event,
    ) -> Result<&mut ProgressionCursor, ProgressError> {
        let cursor = self.cursor.as_mut().ok_or(ProgressError::NoActiveChapter)?;
        if cursor.phase != phase {
            return Err(ProgressError::UnexpectedEvent {
                event: event.name(),
                phase: cursor.phase,
            });
        }
        Ok(cursor)
    }

    fn clear_cursor(&mut self) {
        self.cursor = None;
        self.epoch += 1;
    }
}

/// Pure form of [`ProgressionState::apply`]: the input state is left as is.
pub fn transition(
    state: &ProgressionState,
    event: Event,
) -> Result<(ProgressionState, Transition), ProgressError> {
    let mut next = state.clone();
    let step = next.apply(event)?;
    Ok((next, step))
}
