use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ServiceError};
use crate::http::de_string_like;

/// One entry of the chapter manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// unique and stable across sessions
    #[serde(deserialize_with = "de_string_like")]
    pub id: String,

    #[serde(alias = "title")]
    pub name: String,

    /// advisory, the unlock ledger has the final word
    #[serde(default)]
    pub locked: bool,

    #[serde(
        default,
        alias = "thumb",
        alias = "image",
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail: Option<String>,
}

/// A yes/no prompt as authored, e.g. `"Is a square a rectangle? yes"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBaselineItem(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,

    /// canonical correct answer, compared by value
    #[serde(deserialize_with = "de_string_like")]
    pub answer: String,
}

impl QuizItem {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterContent {
    pub title: String,
    pub learning_points: Vec<String>,
    pub baseline_items: Vec<RawBaselineItem>,
    pub quiz_pool: Vec<QuizItem>,
    pub ai_tutor_limit: Option<u32>,
}

#[derive(Deserialize)]
struct ChapterContentResponse {
    title: String,
    #[serde(default)]
    learning_points: Vec<String>,
    #[serde(default)]
    baseline_assessment: Vec<RawBaselineItem>,
    #[serde(default)]
    quiz: Vec<QuizItem>,
    #[serde(default)]
    ai_tutor_limit: Option<Value>,
}

pub fn parse_manifest(body: Value) -> Result<Vec<Chapter>> {
    if !body.is_array() {
        return Err(ServiceError::MalformedResponse(
            "chapter manifest must be an array".to_string(),
        ));
    }
    serde_json::from_value(body)
        .map_err(|e| ServiceError::MalformedResponse(format!("chapter manifest: {e}")))
}

pub fn parse_chapter(id: &str, body: Value) -> Result<ChapterContent> {
    let raw: ChapterContentResponse = serde_json::from_value(body)
        .map_err(|e| ServiceError::MalformedResponse(format!("chapter '{id}': {e}")))?;

    // numbers and numeric strings both show up in authored content
    let ai_tutor_limit = raw.ai_tutor_limit.as_ref().and_then(|v| match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    Ok(ChapterContent {
        title: raw.title,
        learning_points: raw.learning_points,
        baseline_items: raw.baseline_assessment,
        quiz_pool: raw.quiz,
        ai_tutor_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manifest_accepts_aliases_and_numeric_ids() {
        let chapters = parse_manifest(json!([
            { "id": 201, "name": "Fractions", "locked": false, "thumb": "/img/201.png" },
            { "id": "202", "title": "Decimals", "locked": true, "image": "/chapters/202.png" },
            { "id": "203", "name": "Area" }
        ]))
        .unwrap();

        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].id, "201");
        assert_eq!(chapters[0].thumbnail.as_deref(), Some("/img/201.png"));
        assert_eq!(chapters[1].name, "Decimals");
        assert!(chapters[1].locked);
        assert!(!chapters[2].locked);
        assert_eq!(chapters[2].thumbnail, None);
    }

    #[test]
    fn manifest_must_be_an_array() {
        let err = parse_manifest(json!({ "chapters": [] })).unwrap_err();
        assert!(matches!(err, ServiceError::MalformedResponse(_)));
    }

    #[test]
    fn chapter_content_defaults_missing_sections() {
        let content = parse_chapter(
            "eemh103",
            json!({
                "title": "How Many Squares?",
                "learning_points": ["Count unit squares"],
                "quiz": [
                    { "question": "Squares in a 2x2 grid?", "answer": 4 },
                    { "question": "Shape with 4 equal sides?", "answer": "square" }
                ],
                "ai_tutor_limit": "5"
            }),
        )
        .unwrap();

        assert_eq!(content.title, "How Many Squares?");
        assert!(content.baseline_items.is_empty());
        assert_eq!(content.quiz_pool[0].answer, "4");
        assert_eq!(content.quiz_pool[1].answer, "square");
        assert_eq!(content.ai_tutor_limit, Some(5));
    }

    #[test]
    fn chapter_without_title_is_malformed() {
        let err = parse_chapter("x", json!({ "quiz": [] })).unwrap_err();
        match err {
            ServiceError::MalformedResponse(msg) => assert!(msg.contains("chapter 'x'")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
