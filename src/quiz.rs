use serde::Serialize;

use crate::content::QuizItem;
use crate::error::ValidationError;

/// Score needed to pass a level, as a fraction of the items.
pub const PASS_NUMERATOR: usize = 4;
pub const PASS_DENOMINATOR: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    pub fn new(correct: usize, total: usize) -> Self {
        Self { correct, total }
    }

    /// `correct / total >= 0.8`; an empty quiz passes.
    pub fn passed(&self) -> bool {
        self.total == 0 || self.correct * PASS_DENOMINATOR >= self.total * PASS_NUMERATOR
    }
}

/// Answers being collected for one set of items. Each new attempt starts
/// from an empty sheet; nothing carries over from a failed one.
#[derive(Debug, Clone)]
pub struct AnswerSheet {
    items: Vec<QuizItem>,
    responses: Vec<Option<String>>,
}

impl AnswerSheet {
    pub fn new(items: Vec<QuizItem>) -> Self {
        let responses = vec![None; items.len()];
        Self { items, responses }
    }

    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    /// Records (or replaces) the response for item `index`, by choice value.
    pub fn answer(&mut self, index: usize, response: impl Into<String>) -> Result<(), ValidationError> {
        let total = self.items.len();
        let slot = self
            .responses
            .get_mut(index)
            .ok_or(ValidationError::AnswerOutOfRange { index, total })?;
        *slot = Some(response.into());
        Ok(())
    }

    pub fn answered(&self) -> usize {
        self.responses.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.answered() == self.items.len()
    }

    /// Locks the sheet for scoring once every item has a response.
    pub fn submit(self) -> Result<Attempt, ValidationError> {
        let total = self.items.len();
        let answered = self.answered();
        if answered < total {
            return Err(ValidationError::IncompleteSubmission { answered, total });
        }
        let responses = self.responses.into_iter().flatten().collect();
        Ok(Attempt {
            items: self.items,
            responses,
        })
    }
}

/// A complete submission: exactly one response per item.
#[derive(Debug, Clone)]
pub struct Attempt {
    items: Vec<QuizItem>,
    responses: Vec<String>,
}

impl Attempt {
    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    /// 1 for a correct response, 0 otherwise, in item order.
    pub fn marks(&self) -> Vec<u8> {
        self.items
            .iter()
            .zip(&self.responses)
            .map(|(item, response)| u8::from(*response == item.answer))
            .collect()
    }

    pub fn score(&self) -> Score {
        let correct = self.marks().iter().filter(|&&m| m == 1).count();
        Score::new(correct, self.items.len())
    }
}
