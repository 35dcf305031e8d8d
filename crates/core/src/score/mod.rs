use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Current and best score of the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub high: u32,
}

/// Persisted integer key-value store for the two scores.
///
/// Each setter is an independent write; there is no transaction spanning the
/// current and the high score. Unset values read as 0.
pub trait ScoreStore {
    fn current_score(&self) -> Result<u32>;
    fn set_current_score(&mut self, score: u32) -> Result<()>;
    fn high_score(&self) -> Result<u32>;
    fn set_high_score(&mut self, score: u32) -> Result<()>;

    fn snapshot(&self) -> Result<ScoreState> {
        Ok(ScoreState {
            current: self.current_score()?,
            high: self.high_score()?,
        })
    }
}

/// Store that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryScoreStore {
    state: ScoreState,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ScoreState) -> Self {
        Self { state }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn current_score(&self) -> Result<u32> {
        Ok(self.state.current)
    }

    fn set_current_score(&mut self, score: u32) -> Result<()> {
        self.state.current = score;
        Ok(())
    }

    fn high_score(&self) -> Result<u32> {
        Ok(self.state.high)
    }

    fn set_high_score(&mut self, score: u32) -> Result<()> {
        self.state.high = score;
        Ok(())
    }
}

/// Store backed by a small JSON document on disk, so scores survive restarts.
#[derive(Debug, Clone)]
pub struct JsonScoreStore {
    path: PathBuf,
}

impl JsonScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<ScoreState> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(ScoreState::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn update(&mut self, apply: impl FnOnce(&mut ScoreState)) -> Result<()> {
        let mut state = self.load()?;
        apply(&mut state);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&state)?)?;
        tracing::trace!(path = ?self.path, ?state, "persisted scores");
        Ok(())
    }
}

impl ScoreStore for JsonScoreStore {
    fn current_score(&self) -> Result<u32> {
        Ok(self.load()?.current)
    }

    fn set_current_score(&mut self, score: u32) -> Result<()> {
        self.update(|state| state.current = score)
    }

    fn high_score(&self) -> Result<u32> {
        Ok(self.load()?.high)
    }

    fn set_high_score(&mut self, score: u32) -> Result<()> {
        self.update(|state| state.high = score)
    }
}
