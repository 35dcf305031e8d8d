use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::{
    Question, QuizError, QuizRoundController, Result, RoundOutcome, Sample, SampleCatalog,
    SampleId, SamplePool, ScoreState, ScoreStore,
};

/// Where a game session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamePhase {
    NotStarted,
    /// A question is on screen waiting for a choice.
    InRound(Question),
    /// The answer is being shown; the host calls [`GameSession::advance`]
    /// once the display interval has passed.
    RoundResolved {
        question: Question,
        outcome: RoundOutcome,
    },
    GameOver(ScoreState),
}

/// A single player's game: owns its controller and pool, and walks the round
/// state machine. Independent sessions share nothing mutable.
#[derive(Debug)]
pub struct GameSession<C, S, R> {
    controller: QuizRoundController<C, S, R>,
    pool: SamplePool,
    phase: GamePhase,
    answer_delay: Duration,
    rounds_played: usize,
}

impl<C, S, R> GameSession<C, S, R>
where
    C: SampleCatalog,
    S: ScoreStore,
    R: Rng,
{
    pub fn new(controller: QuizRoundController<C, S, R>) -> Self {
        Self {
            controller,
            pool: SamplePool::default(),
            phase: GamePhase::NotStarted,
            answer_delay: Duration::from_millis(1000),
            rounds_played: 0,
        }
    }

    pub fn with_answer_delay(mut self, delay: Duration) -> Self {
        self.answer_delay = delay;
        self
    }

    /// Starts a fresh game with the full catalog and a zeroed score.
    pub fn start(&mut self) -> Result<&GamePhase> {
        self.ensure_idle("start")?;
        self.pool = self.controller.start_new_game()?;
        self.rounds_played = 0;
        self.enter_round()
    }

    /// Continues a game from a pool saved after an earlier round.
    pub fn resume(&mut self, pool: SamplePool) -> Result<&GamePhase> {
        self.ensure_idle("resume")?;
        self.pool = self.controller.resume_game(pool);
        self.enter_round()
    }

    /// Resolves the current round with the chosen sample id.
    pub fn answer(&mut self, chosen: SampleId) -> Result<RoundOutcome> {
        let question = match &self.phase {
            GamePhase::InRound(question) => question.clone(),
            other => return Err(wrong_phase("answer", other)),
        };

        let outcome = self
            .controller
            .evaluate_answer(&question, chosen, self.pool.clone())?;
        self.pool = outcome.pool.clone();
        self.rounds_played += 1;
        self.phase = GamePhase::RoundResolved {
            question,
            outcome: outcome.clone(),
        };
        Ok(outcome)
    }

    /// Resolves the current round with the option at a button position.
    pub fn answer_at(&mut self, index: usize) -> Result<RoundOutcome> {
        let chosen = match &self.phase {
            GamePhase::InRound(question) => question.option_at(index).ok_or_else(|| {
                QuizError::msg(format!("there is no option at position {index}"))
            })?,
            other => return Err(wrong_phase("answer", other)),
        };
        self.answer(chosen)
    }

    /// Moves past a resolved round: either the next question or game over.
    pub fn advance(&mut self) -> Result<&GamePhase> {
        if !matches!(self.phase, GamePhase::RoundResolved { .. }) {
            return Err(wrong_phase("advance", &self.phase));
        }
        self.enter_round()
    }

    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    pub fn pool(&self) -> &SamplePool {
        &self.pool
    }

    pub fn question(&self) -> Option<&Question> {
        match &self.phase {
            GamePhase::InRound(question) | GamePhase::RoundResolved { question, .. } => {
                Some(question)
            }
            _ => None,
        }
    }

    /// The sample whose excerpt belongs to the question on screen.
    pub fn current_sample(&self) -> Option<&Sample> {
        self.question()
            .and_then(|question| self.controller.catalog().sample(question.answer()))
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver(_))
    }

    pub fn answer_delay(&self) -> Duration {
        self.answer_delay
    }

    pub fn rounds_played(&self) -> usize {
        self.rounds_played
    }

    pub fn controller(&self) -> &QuizRoundController<C, S, R> {
        &self.controller
    }

    fn ensure_idle(&self, action: &str) -> Result<()> {
        match self.phase {
            GamePhase::NotStarted | GamePhase::GameOver(_) => Ok(()),
            ref other => Err(wrong_phase(action, other)),
        }
    }

    fn enter_round(&mut self) -> Result<&GamePhase> {
        self.phase = if self.controller.is_game_over(&self.pool) {
            GamePhase::GameOver(self.controller.end_game()?)
        } else {
            GamePhase::InRound(self.controller.generate_question(&self.pool)?)
        };
        debug!(remaining = self.pool.len(), phase = phase_name(&self.phase), "entered phase");
        Ok(&self.phase)
    }
}

fn phase_name(phase: &GamePhase) -> &'static str {
    match phase {
        GamePhase::NotStarted => "not started",
        GamePhase::InRound(_) => "in round",
        GamePhase::RoundResolved { .. } => "round resolved",
        GamePhase::GameOver(_) => "game over",
    }
}

fn wrong_phase(action: &str, phase: &GamePhase) -> QuizError {
    QuizError::msg(format!("cannot {action} while {}", phase_name(phase)))
}
