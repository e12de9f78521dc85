use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, ServiceError, ValidationError};
use crate::http::post_json;

const PREVIEW_CHARS: usize = 180;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorAnswer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

/// A passage the tutor drew its answer from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default)]
    pub preview: String,
}

impl SourceRef {
    /// `"p.4"`, or nothing when the page is unknown or not positive.
    pub fn page_label(&self) -> Option<String> {
        self.page.filter(|&p| p > 0).map(|p| format!("p.{p}"))
    }

    /// Preview with whitespace collapsed, cut at 180 characters.
    pub fn short_preview(&self) -> String {
        let collapsed = self.preview.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.chars().count() > PREVIEW_CHARS {
            let cut: String = collapsed.chars().take(PREVIEW_CHARS).collect();
            format!("{cut}…")
        } else {
            collapsed
        }
    }

    /// Chapter code taken from the source file name, e.g. `uploads/eemh103.pdf` → `eemh103`.
    pub fn chapter_label(&self) -> Option<&str> {
        let file = self.source.rsplit(['/', '\\']).next()?;
        let stem = match file.len().checked_sub(4) {
            Some(cut) if file.is_char_boundary(cut) && file[cut..].eq_ignore_ascii_case(".pdf") => {
                &file[..cut]
            }
            _ => file,
        };
        (!stem.is_empty()).then_some(stem)
    }
}

#[derive(Serialize)]
struct AskRequest<'a> {
    chapter: &'a str,
    question: &'a str,
}

/// The retrieval service that answers learner questions.
pub trait TutorBackend {
    fn ask(&self, chapter: &str, question: &str) -> Result<TutorAnswer>;
}

pub struct HttpTutor {
    agent: ureq::Agent,
    url: String,
}

impl HttpTutor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new(),
            url: url.into(),
        }
    }
}

pub fn parse_answer(body: Value) -> Result<TutorAnswer> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(ServiceError::unavailable(error));
    }
    serde_json::from_value(body)
        .map_err(|e| ServiceError::MalformedResponse(format!("tutor answer: {e}")))
}

impl TutorBackend for HttpTutor {
    fn ask(&self, chapter: &str, question: &str) -> Result<TutorAnswer> {
        let body = post_json(&self.agent, &self.url, &AskRequest { chapter, question })
            .map_err(|e| match e {
                // a missing tutor route is an outage, not missing content
                ServiceError::NotFound(url) => ServiceError::ServiceUnavailable {
                    status: Some(404),
                    message: format!("{url} not found"),
                },
                other => other,
            })?;
        parse_answer(body)
    }
}

/// Token-limited tutor access for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorSession {
    chapter_id: String,
    tokens_left: u32,
}

impl TutorSession {
    pub fn new(chapter_id: impl Into<String>, tokens_left: u32) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            tokens_left,
        }
    }

    pub fn tokens_left(&self) -> u32 {
        self.tokens_left
    }

    /// Asks one question. A token is spent only when an answer comes back;
    /// blank questions and an empty balance never reach the backend.
    pub fn ask(&mut self, backend: &dyn TutorBackend, question: &str) -> Result<TutorAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ValidationError::EmptyQuestion.into());
        }
        if self.tokens_left == 0 {
            return Err(ValidationError::NoTokensLeft.into());
        }

        match backend.ask(&self.chapter_id, question) {
            Ok(answer) => {
                self.tokens_left = self.tokens_left.saturating_sub(1);
                info!(chapter = %self.chapter_id, tokens_left = self.tokens_left, "tutor answered");
                Ok(answer)
            }
            Err(e) => {
                warn!(chapter = %self.chapter_id, error = %e, "tutor request failed");
                Err(e)
            }
        }
    }
}
