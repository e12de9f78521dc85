//! Chapter progression for the EduAI learning portal: manifest and chapter
//! content loading, the summary → baseline → leveled quiz flow with its
//! unlock and completion ledgers, and the token-limited AI tutor.

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
mod http;
pub mod progress;
pub mod quiz;
pub mod student;
pub mod tutor;

pub use config::Config;
pub use error::{ServiceError, ValidationError};
pub use progress::{ProgressError, ProgressionController, ProgressionState};
