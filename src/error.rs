use thiserror::Error;

/// Failures surfaced by the collaborator clients and the tutor session.
///
/// None of these are meant to escape to the shell as faults: callers turn
/// them into inline messages with [`ServiceError::user_message`].
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("chapter content not found: {0}")]
    ContentNotFound(String),

    #[error("service unavailable{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    ServiceUnavailable {
        status: Option<u16>,
        message: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("no tutor tokens left for this chapter")]
    NoTokensLeft,

    #[error("{answered} of {total} items answered")]
    IncompleteSubmission { answered: usize, total: usize },

    #[error("answer index {index} out of range for {total} items")]
    AnswerOutOfRange { index: usize, total: usize },
}

impl ServiceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        ServiceError::ServiceUnavailable {
            status: None,
            message: message.into(),
        }
    }

    /// Short text fit for an inline alert.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Validation(ValidationError::EmptyQuestion) => {
                "Please enter a question.".to_string()
            }
            ServiceError::Validation(ValidationError::NoTokensLeft) => {
                "You have used all your AI Help tokens for this chapter.".to_string()
            }
            ServiceError::Validation(e) => format!("Please answer every question first ({e})."),
            ServiceError::NotFound(what) => format!("{what} could not be found."),
            ServiceError::ContentNotFound(id) => format!("Chapter {id} is not available."),
            ServiceError::ServiceUnavailable { .. } | ServiceError::MalformedResponse(_) => {
                "The service is not available right now.".to_string()
            }
            ServiceError::Rejected(message) => message.clone(),
        }
    }
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
