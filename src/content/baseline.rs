use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::{QuizItem, RawBaselineItem};

pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// A baseline prompt turned into a two-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaselineQuestion {
    pub question: String,
    /// always `"Yes"` or `"No"`
    pub expected: &'static str,
}

impl BaselineQuestion {
    pub fn choices(&self) -> [&'static str; 2] {
        [YES, NO]
    }

    pub fn as_quiz_item(&self) -> QuizItem {
        QuizItem::new(self.question.clone(), self.expected)
    }
}

fn suffix_regex() -> &'static Regex {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    SUFFIX.get_or_init(|| Regex::new(r"(?i)\s*\b(yes|no)\s*$").expect("static regex"))
}

impl From<&RawBaselineItem> for BaselineQuestion {
    /// Prompts without a trailing yes/no expect "Yes".
    fn from(raw: &RawBaselineItem) -> Self {
        let text = raw.0.trim();
        match suffix_regex().captures(text) {
            Some(caps) => {
                let expected = if caps[1].eq_ignore_ascii_case("no") { NO } else { YES };
                let whole = caps.get(0).map_or(text.len(), |m| m.start());
                BaselineQuestion {
                    question: text[..whole].trim().to_string(),
                    expected,
                }
            }
            None => BaselineQuestion {
                question: text.to_string(),
                expected: YES,
            },
        }
    }
}

pub fn baseline_questions(items: &[RawBaselineItem]) -> Vec<BaselineQuestion> {
    items.iter().map(BaselineQuestion::from).collect()
}
