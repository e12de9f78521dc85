use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::QuizItem;

/// Only the first this many pool items are ever quizzed.
pub const POOL_LIMIT: usize = 12;
pub const BUCKET_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Novice,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Novice, Level::Intermediate, Level::Advanced];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Level> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Level> {
        Self::from_index(self.index() + 1)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Novice => "novice",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "novice" => Ok(Level::Novice),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(format!("unknown level '{other}'")),
        }
    }
}

/// The quiz pool split into one bucket per level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelBuckets {
    buckets: [Vec<QuizItem>; 3],
}

impl LevelBuckets {
    /// Item `i` of the first twelve goes to level `i mod 3`.
    pub fn from_pool(pool: &[QuizItem]) -> Self {
        let mut buckets: [Vec<QuizItem>; 3] = Default::default();
        for (i, item) in pool.iter().take(POOL_LIMIT).enumerate() {
            let bucket = &mut buckets[i % Level::ALL.len()];
            if bucket.len() < BUCKET_CAPACITY {
                bucket.push(item.clone());
            }
        }
        Self { buckets }
    }

    pub fn items(&self, level: Level) -> &[QuizItem] {
        &self.buckets[level.index()]
    }
}
