use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{quiz::DEFAULT_OPTIONS_PER_QUESTION, QuizError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub quiz: QuizConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields fall back to defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quiz.options_per_question < 2 {
            return Err(QuizError::msg(format!(
                "options_per_question must be at least 2, got {}",
                self.quiz.options_per_question
            )));
        }
        Ok(())
    }
}

/// Round parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub options_per_question: usize,
    /// How long a resolved round stays on screen before the next one.
    pub answer_delay_ms: u64,
    /// Fixed seed for reproducible games; entropy is used when absent.
    pub seed: Option<u64>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            options_per_question: DEFAULT_OPTIONS_PER_QUESTION,
            answer_delay_ms: 1000,
            seed: None,
        }
    }
}

impl QuizConfig {
    pub fn answer_delay(&self) -> Duration {
        Duration::from_millis(self.answer_delay_ms)
    }
}

/// Where scores and an optional custom catalog live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub score_path: PathBuf,
    /// Uses the bundled catalog when absent.
    pub catalog_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            score_path: PathBuf::from("classical-quiz-scores.json"),
            catalog_path: None,
        }
    }
}
