use std::collections::{HashMap, HashSet};

use crate::content::Chapter;

/// Which chapters a learner may start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlockLedger(HashMap<String, bool>);

impl UnlockLedger {
    /// Every chapter per its own flag, then the first one forced open.
    pub fn seed(chapters: &[Chapter]) -> Self {
        let map = chapters
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i == 0 || !c.locked))
            .collect();
        Self(map)
    }

    /// Keeps what was already decided for known ids, seeds new ones.
    pub fn merge(&mut self, chapters: &[Chapter]) {
        for (i, chapter) in chapters.iter().enumerate() {
            let entry = self.0.entry(chapter.id.clone()).or_insert(!chapter.locked);
            if i == 0 {
                *entry = true;
            }
        }
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.0.get(id).copied().unwrap_or(false)
    }

    pub(crate) fn unlock(&mut self, id: &str) -> bool {
        let entry = self.0.entry(id.to_string()).or_insert(false);
        !std::mem::replace(entry, true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionLedger(HashSet<String>);

impl CompletionLedger {
    pub fn is_completed(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Returns false if the chapter was already completed.
    pub(crate) fn complete(&mut self, id: &str) -> bool {
        self.0.insert(id.to_string())
    }
}

/// Tutor tokens left per chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLedger {
    default: u32,
    balances: HashMap<String, u32>,
    limits: HashMap<String, u32>,
    seeded: HashSet<String>,
}

impl TokenLedger {
    pub fn new(default: u32, chapters: &[Chapter]) -> Self {
        let mut ledger = Self {
            default,
            balances: HashMap::new(),
            limits: HashMap::new(),
            seeded: HashSet::new(),
        };
        ledger.merge(chapters);
        ledger
    }

    pub fn merge(&mut self, chapters: &[Chapter]) {
        for chapter in chapters {
            self.balances.entry(chapter.id.clone()).or_insert(self.default);
        }
    }

    /// The chapter's own limit when it sets a positive one, else the default.
    pub fn allowance(&self, id: &str) -> u32 {
        self.limits.get(id).copied().unwrap_or(self.default)
    }

    pub fn balance(&self, id: &str) -> u32 {
        self.balances.get(id).copied().unwrap_or_else(|| self.allowance(id))
    }

    /// First activation of a chapter fixes its limit and fills its balance.
    /// Later activations keep whatever is left.
    pub(crate) fn seed_on_activation(&mut self, id: &str, limit: Option<u32>) {
        if let Some(limit) = limit.filter(|&l| l > 0) {
            self.limits.insert(id.to_string(), limit);
        }
        if self.seeded.insert(id.to_string()) {
            let allowance = self.allowance(id);
            self.balances.insert(id.to_string(), allowance);
        }
    }

    pub(crate) fn reset(&mut self, id: &str) {
        let allowance = self.allowance(id);
        self.balances.insert(id.to_string(), allowance);
    }

    pub(crate) fn spend(&mut self, id: &str) -> u32 {
        let left = self.balance(id).saturating_sub(1);
        self.balances.insert(id.to_string(), left);
        left
    }
}
