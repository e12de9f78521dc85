//! Client for the student service: baseline bank, level assignment,
//! per-level question bank and chapter key concepts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::content::{Level, QuizItem};
use crate::error::{Result, ServiceError};
use crate::http::{get_json, join, post_json};
use crate::progress::BaselineReporter;

/// A multiple-choice question whose answer is the index of the right choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceQuestion {
    pub question: String,
    pub choices: Vec<String>,
    pub answer: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainedChoice {
    pub text: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeveledQuestion {
    pub question: String,
    pub choices: Vec<ExplainedChoice>,
    pub answer: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPoint {
    #[serde(default)]
    pub icon: String,
    pub title: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub title: String,
    #[serde(default)]
    pub keypoints: Vec<KeyPoint>,
}

/// Turns an index-answered question into one scored by value, so the
/// choices can be reordered freely for display.
fn by_value(question: &str, choices: &[&str], answer: usize) -> Result<QuizItem> {
    let correct = choices.get(answer).ok_or_else(|| {
        ServiceError::MalformedResponse(format!(
            "answer {answer} out of range for '{question}' ({} choices)",
            choices.len()
        ))
    })?;
    Ok(QuizItem::new(question, *correct))
}

impl ChoiceQuestion {
    pub fn to_quiz_item(&self) -> Result<QuizItem> {
        let choices: Vec<&str> = self.choices.iter().map(String::as_str).collect();
        by_value(&self.question, &choices, self.answer)
    }
}

impl LeveledQuestion {
    pub fn to_quiz_item(&self) -> Result<QuizItem> {
        let choices: Vec<&str> = self.choices.iter().map(|c| c.text.as_str()).collect();
        by_value(&self.question, &choices, self.answer)
    }

    pub fn explanation_for(&self, choice: &str) -> Option<&str> {
        self.choices
            .iter()
            .find(|c| c.text == choice)
            .map(|c| c.explanation.as_str())
            .filter(|e| !e.is_empty())
    }
}

#[derive(Serialize)]
struct BaselineSubmission<'a> {
    user_id: &'a str,
    scores: &'a [u8],
}

#[derive(Deserialize)]
struct AssignedLevel {
    assigned_level: String,
}

fn parse<T: serde::de::DeserializeOwned>(what: &str, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| ServiceError::MalformedResponse(format!("{what}: {e}")))
}

pub struct StudentService {
    agent: ureq::Agent,
    base_url: String,
}

impl StudentService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base_url: base_url.into(),
        }
    }

    pub fn baseline_questions(&self) -> Result<Vec<ChoiceQuestion>> {
        let body = get_json(&self.agent, &join(&self.base_url, "student/baseline"))?;
        parse("baseline questions", body)
    }

    /// Sends one 1/0 mark per baseline question; returns the assigned level.
    pub fn submit_baseline(&self, user_id: &str, scores: &[u8]) -> Result<Level> {
        let url = join(&self.base_url, "student/baseline/submit");
        let body = post_json(&self.agent, &url, &BaselineSubmission { user_id, scores })?;
        let reply: AssignedLevel = parse("baseline submit", body)?;
        let level = reply
            .assigned_level
            .parse::<Level>()
            .map_err(ServiceError::MalformedResponse)?;
        info!(%user_id, %level, "baseline submitted");
        Ok(level)
    }

    pub fn leveled_quiz(&self, level: Level, chapter: &str) -> Result<Vec<LeveledQuestion>> {
        let url = join(&self.base_url, &format!("student/mcq/{level}/{chapter}"));
        let body = get_json(&self.agent, &url)?;
        parse("leveled quiz", body)
    }

    pub fn chapter_summary(&self, chapter: &str) -> Result<ChapterSummary> {
        let url = join(&self.base_url, &format!("student/chapter_summary/{chapter}"));
        let body = get_json(&self.agent, &url).map_err(|e| match e {
            ServiceError::NotFound(_) => ServiceError::ContentNotFound(chapter.to_string()),
            other => other,
        })?;
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(ServiceError::Rejected(error.to_string()));
        }
        parse("chapter summary", body)
    }
}

impl BaselineReporter for StudentService {
    fn report_baseline(&self, user_id: &str, marks: &[u8]) -> Result<Level> {
        self.submit_baseline(user_id, marks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::canned::CannedServer;
    use serde_json::json;

    #[test]
    fn http_round_trip() {
        let server = CannedServer::start(vec![
            (200, r#"{"assigned_level":"Intermediate"}"#),
            (200, r#"[{"question":"Which is bigger?","choices":[{"text":"0.5"},{"text":"0.05"}],"answer":0}]"#),
            (404, r#"{"error":"no such chapter"}"#),
            (200, r#"{"error":"Chapter summary not found"}"#),
        ]);
        let service = StudentService::new(&server.url);

        assert_eq!(service.report_baseline("u1", &[1, 0]).unwrap(), Level::Intermediate);
        let seen = server.next_request();
        assert_eq!(seen.line, "POST /student/baseline/submit HTTP/1.1");
        assert_eq!(
            serde_json::from_str::<Value>(&seen.body).unwrap(),
            json!({ "user_id": "u1", "scores": [1, 0] })
        );

        let quiz = service.leveled_quiz(Level::Advanced, "eemh108").unwrap();
        assert_eq!(quiz[0].to_quiz_item().unwrap().answer, "0.5");
        assert_eq!(server.next_request().line, "GET /student/mcq/advanced/eemh108 HTTP/1.1");

        assert!(matches!(
            service.chapter_summary("eemh199"),
            Err(ServiceError::ContentNotFound(id)) if id == "eemh199"
        ));
        assert!(matches!(
            service.chapter_summary("eemh108"),
            Err(ServiceError::Rejected(_))
        ));
    }

    #[test]
    fn leveled_question_scores_by_choice_text() {
        let questions: Vec<LeveledQuestion> = parse(
            "leveled quiz",
            json!([{
                "question": "Which shape has 3 sides?",
                "choices": [
                    { "text": "Square", "explanation": "A square has 4 sides." },
                    { "text": "Triangle", "explanation": "Tri means three." }
                ],
                "answer": 1
            }]),
        )
        .unwrap();

        let item = questions[0].to_quiz_item().unwrap();
        assert_eq!(item.answer, "Triangle");
        assert_eq!(questions[0].explanation_for("Square"), Some("A square has 4 sides."));
        assert_eq!(questions[0].explanation_for("Circle"), None);
    }

    #[test]
    fn answer_index_out_of_range_is_malformed() {
        let q = ChoiceQuestion {
            question: "2 + 2?".into(),
            choices: vec!["3".into(), "4".into()],
            answer: 2,
        };
        assert!(matches!(q.to_quiz_item(), Err(ServiceError::MalformedResponse(_))));
    }

    #[test]
    fn baseline_submission_shape() {
        let body = serde_json::to_value(BaselineSubmission {
            user_id: "test_user",
            scores: &[1, 0, 1],
        })
        .unwrap();
        assert_eq!(body, json!({ "user_id": "test_user", "scores": [1, 0, 1] }));

        let reply: AssignedLevel = parse("baseline submit", json!({ "assigned_level": "Advanced" })).unwrap();
        assert_eq!(reply.assigned_level.parse::<Level>(), Ok(Level::Advanced));
    }

    #[test]
    fn summary_keypoints_default() {
        let summary: ChapterSummary = parse(
            "chapter summary",
            json!({ "title": "Smart Charts!", "keypoints": [{ "title": "Tally marks", "icon": "📊" }] }),
        )
        .unwrap();
        assert_eq!(summary.keypoints[0].details.len(), 0);
        assert_eq!(summary.keypoints[0].visual, None);
    }
}
