use tracing::{debug, info, warn};

use super::state::{Event, Phase, ProgressionCursor, ProgressionState, Transition};
use super::ProgressError;
use crate::config::Config;
use crate::content::{
    baseline_questions, BaselineQuestion, Chapter, ChapterContent, ChapterContentStore,
    HttpContentStore, Level, LevelBuckets, ManifestStore, QuizItem,
};
use crate::error::Result as ServiceResult;
use crate::quiz::{AnswerSheet, Score};
use crate::tutor::{HttpTutor, TutorAnswer, TutorBackend, TutorSession};

type Result<T> = std::result::Result<T, ProgressError>;

/// Somewhere to send per-item baseline marks; replies with a suggested level.
pub trait BaselineReporter {
    fn report_baseline(&self, user_id: &str, marks: &[u8]) -> ServiceResult<Level>;
}

/// Content of the chapter being worked through, loaded on activation.
#[derive(Debug, Clone)]
pub struct ActiveChapter {
    pub chapter: Chapter,
    pub content: ChapterContent,
    pub baseline: Vec<BaselineQuestion>,
    /// what the baseline service suggested, informational only
    pub assigned_level: Option<Level>,
    buckets: LevelBuckets,
}

impl ActiveChapter {
    fn new(chapter: Chapter, content: ChapterContent) -> Self {
        let baseline = baseline_questions(&content.baseline_items);
        let buckets = LevelBuckets::from_pool(&content.quiz_pool);
        Self {
            chapter,
            content,
            baseline,
            assigned_level: None,
            buckets,
        }
    }

    pub fn bucket(&self, level: Level) -> &[QuizItem] {
        self.buckets.items(level)
    }

    pub fn baseline_items(&self) -> Vec<QuizItem> {
        self.baseline.iter().map(BaselineQuestion::as_quiz_item).collect()
    }
}

/// A manifest entry with its derived state, as shown on the chapter grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterCard<'a> {
    pub chapter: &'a Chapter,
    pub unlocked: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: Score,
    pub transition: Transition,
}

/// Drives one learner through the chapters of a manifest.
pub struct ProgressionController<S, T> {
    store: S,
    tutor: T,
    state: ProgressionState,
    active: Option<ActiveChapter>,
    reporter: Option<(Box<dyn BaselineReporter>, String)>,
}

impl ProgressionController<HttpContentStore, HttpTutor> {
    /// Content and tutor over HTTP at the configured endpoints.
    pub fn connect(config: &Config) -> Result<Self> {
        Self::load(
            HttpContentStore::new(&config.content_url),
            HttpTutor::new(&config.tutor_url),
            config.default_tutor_tokens,
        )
    }
}

impl<S, T> ProgressionController<S, T>
where
    S: ManifestStore + ChapterContentStore,
    T: TutorBackend,
{
    pub fn load(store: S, tutor: T, default_tokens: u32) -> Result<Self> {
        let chapters = store.load_manifest()?;
        info!(chapters = chapters.len(), "progression ready");
        Ok(Self {
            state: ProgressionState::new(chapters, default_tokens),
            store,
            tutor,
            active: None,
            reporter: None,
        })
    }

    /// Also send baseline marks to `reporter` under `user_id`.
    pub fn with_baseline_reporter(
        mut self,
        reporter: impl BaselineReporter + 'static,
        user_id: impl Into<String>,
    ) -> Self {
        self.reporter = Some((Box::new(reporter), user_id.into()));
        self
    }

    /// Re-fetches the manifest on demand; earned unlocks are kept.
    pub fn reload_manifest(&mut self) -> Result<()> {
        let chapters = self.store.load_manifest()?;
        self.state.refresh_manifest(chapters);
        if self.state.cursor().is_none() {
            self.active = None;
        }
        Ok(())
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn cursor(&self) -> Option<&ProgressionCursor> {
        self.state.cursor()
    }

    pub fn active(&self) -> Option<&ActiveChapter> {
        self.active.as_ref()
    }

    pub fn cards(&self) -> Vec<ChapterCard<'_>> {
        self.state
            .chapters()
            .iter()
            .map(|chapter| ChapterCard {
                chapter,
                unlocked: self.state.is_unlocked(&chapter.id),
                completed: self.state.is_completed(&chapter.id),
            })
            .collect()
    }

    /// Loads the chapter's content and starts it at the summary.
    pub fn activate(&mut self, id: &str) -> Result<&ActiveChapter> {
        let chapter = self
            .state
            .chapters()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ProgressError::UnknownChapter(id.to_string()))?;
        if !self.state.is_unlocked(id) {
            return Err(ProgressError::ChapterLocked(id.to_string()));
        }

        let content = self.store.load_chapter(id)?;
        self.state.apply(Event::Activate {
            chapter_id: id.to_string(),
            tutor_limit: content.ai_tutor_limit,
        })?;
        Ok(&*self.active.insert(ActiveChapter::new(chapter, content)))
    }

    pub fn finish_reading(&mut self) -> Result<Transition> {
        self.state.apply(Event::FinishedReading)
    }

    pub fn baseline_sheet(&self) -> Result<AnswerSheet> {
        let active = self.require_phase(Phase::Baseline)?;
        Ok(AnswerSheet::new(active.baseline_items()))
    }

    /// Any complete submission advances to the novice quiz.
    pub fn submit_baseline(&mut self, sheet: AnswerSheet) -> Result<Transition> {
        let active = self.require_phase(Phase::Baseline)?;
        if sheet.items() != active.baseline_items().as_slice() {
            return Err(ProgressError::SheetMismatch("baseline"));
        }
        let attempt = sheet.submit()?;
        let score = attempt.score();

        if let Some((reporter, user_id)) = &self.reporter {
            match reporter.report_baseline(user_id, &attempt.marks()) {
                Ok(level) => {
                    info!(%level, "baseline service assigned a level");
                    if let Some(active) = self.active.as_mut() {
                        active.assigned_level = Some(level);
                    }
                }
                Err(e) => warn!(error = %e, "could not report baseline"),
            }
        }

        self.state.apply(Event::BaselineSubmitted(score))
    }

    pub fn quiz_sheet(&self) -> Result<AnswerSheet> {
        let active = self.require_phase(Phase::Quiz)?;
        let level = self.current_level()?;
        Ok(AnswerSheet::new(active.bucket(level).to_vec()))
    }

    /// Scores a full attempt at the current level. A failed level stays put
    /// and needs a fresh sheet from [`Self::quiz_sheet`].
    pub fn submit_quiz(&mut self, sheet: AnswerSheet) -> Result<QuizOutcome> {
        let active = self.require_phase(Phase::Quiz)?;
        let level = self.current_level()?;
        if sheet.items() != active.bucket(level) {
            return Err(ProgressError::SheetMismatch("quiz level"));
        }
        let score = sheet.submit()?.score();
        let transition = self.state.apply(Event::QuizScored(score))?;
        if matches!(transition, Transition::ChapterCompleted { .. }) {
            self.active = None;
        }
        Ok(QuizOutcome { score, transition })
    }

    pub fn tokens_left(&self) -> Option<u32> {
        self.cursor().map(|c| self.state.tokens_left(&c.chapter_id))
    }

    /// Asks the tutor about the active chapter, spending a token on success.
    pub fn ask_tutor(&mut self, question: &str) -> Result<TutorAnswer> {
        let ticket = self.state.ticket().ok_or(ProgressError::NoActiveChapter)?;
        let mut session =
            TutorSession::new(ticket.chapter_id.clone(), self.state.tokens_left(&ticket.chapter_id));
        let answer = session.ask(&self.tutor, question)?;
        if self.state.apply_if_live(&ticket, Event::TutorAnswered)?.is_none() {
            debug!(chapter = %ticket.chapter_id, "tutor answered a finished activation, no token spent");
        }
        Ok(answer)
    }

    pub fn exit(&mut self) -> Result<Transition> {
        let transition = self.state.apply(Event::Exit)?;
        self.active = None;
        Ok(transition)
    }

    fn current_level(&self) -> Result<Level> {
        self.cursor()
            .map(|c| c.level)
            .ok_or(ProgressError::NoActiveChapter)
    }

    fn require_phase(&self, phase: Phase) -> Result<&ActiveChapter> {
        let cursor = self.cursor().ok_or(ProgressError::NoActiveChapter)?;
        if cursor.phase != phase {
            return Err(ProgressError::UnexpectedEvent {
                event: match phase {
                    Phase::Summary => "finished reading",
                    Phase::Baseline => "baseline submitted",
                    Phase::Quiz => "quiz scored",
                },
                phase: cursor.phase,
            });
        }
        self.active.as_ref().ok_or(ProgressError::NoActiveChapter)
    }
}
