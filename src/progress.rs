mod controller;
mod ledger;
mod state;

use thiserror::Error;

use crate::error::{ServiceError, ValidationError};

pub use controller::{ActiveChapter, BaselineReporter, ChapterCard, ProgressionController, QuizOutcome};
pub use ledger::{CompletionLedger, TokenLedger, UnlockLedger};
pub use state::{
    transition, Event, Phase, ProgressionCursor, ProgressionState, Ticket, Transition,
};

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("no chapter is active")]
    NoActiveChapter,

    #[error("chapter '{0}' is not in the manifest")]
    UnknownChapter(String),

    #[error("chapter '{0}' is locked")]
    ChapterLocked(String),

    #[error("'{event}' is not expected during the {phase:?} phase")]
    UnexpectedEvent { event: &'static str, phase: Phase },

    #[error("answer sheet does not belong to the current {0}")]
    SheetMismatch(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}
