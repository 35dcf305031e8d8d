//! Core library for the Classical Music Quiz.
//!
//! A round plays an excerpt of a classical piece and asks the player to pick
//! its composer from a handful of options. The modules here hold everything
//! that is not rendering or audio decoding: the sample catalog, score
//! persistence, the round controller, the owned game session that walks the
//! round state machine, and the media-session bookkeeping a host mirrors its
//! player into.

pub mod catalog;
pub mod config;
pub mod error;
pub mod playback;
pub mod quiz;
pub mod score;
pub mod session;

pub use catalog::{Sample, SampleCatalog, SampleId, StaticCatalog};
pub use config::{AppConfig, QuizConfig, StorageConfig};
pub use error::{QuizError, Result};
pub use playback::{
    LoggingPlayer, MediaSession, Player, PlayerCommand, PlayerStatus, SessionState,
    TransportAction,
};
pub use quiz::{Question, QuizRoundController, RoundOutcome, SamplePool};
pub use score::{JsonScoreStore, MemoryScoreStore, ScoreState, ScoreStore};
pub use session::{GamePhase, GameSession};
