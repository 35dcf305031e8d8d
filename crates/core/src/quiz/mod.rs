use std::collections::BTreeSet;

use rand::{
    seq::{IteratorRandom, SliceRandom},
    Rng,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{QuizError, Result, SampleCatalog, SampleId, ScoreState, ScoreStore};

/// Number of options offered when nothing else is configured.
pub const DEFAULT_OPTIONS_PER_QUESTION: usize = 4;

/// A pool smaller than this cannot produce another round.
pub const MIN_POOL_SIZE: usize = 2;

/// Sample ids that have not yet been used as an answer in the current game.
///
/// Serialises as a plain array so a host can hand it from one round to the
/// next (or across a process restart).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SamplePool {
    ids: BTreeSet<SampleId>,
}

impl SamplePool {
    pub fn new(ids: impl IntoIterator<Item = SampleId>) -> Self {
        ids.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: SampleId) -> bool {
        self.ids.contains(&id)
    }

    /// Removes `id`, returning whether it was present.
    pub fn remove(&mut self, id: SampleId) -> bool {
        self.ids.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = SampleId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<SampleId> for SamplePool {
    fn from_iter<I: IntoIterator<Item = SampleId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// One round's options together with the id of the correct one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    options: Vec<SampleId>,
    answer: SampleId,
}

impl Question {
    /// Distinct option ids in presentation order; the answer appears once.
    pub fn options(&self) -> &[SampleId] {
        &self.options
    }

    pub fn answer(&self) -> SampleId {
        self.answer
    }

    /// Sample id shown at the given button position.
    pub fn option_at(&self, index: usize) -> Option<SampleId> {
        self.options.get(index).copied()
    }

    pub fn option_index(&self, id: SampleId) -> Option<usize> {
        self.options.iter().position(|option| *option == id)
    }

    pub fn is_answer(&self, id: SampleId) -> bool {
        id == self.answer
    }
}

/// Resolved round, returned by [`QuizRoundController::evaluate_answer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub correct: bool,
    pub chosen: SampleId,
    pub answer: SampleId,
    /// The pool with this round's answer removed.
    pub pool: SamplePool,
    pub score: ScoreState,
    pub high_score_raised: bool,
}

/// Owns the round logic of a quiz: picking questions from a pool, checking
/// answers and keeping the persisted scores up to date.
///
/// Randomness is injected so that a seeded generator reproduces a game.
#[derive(Debug)]
pub struct QuizRoundController<C, S, R> {
    catalog: C,
    store: S,
    rng: R,
    options_per_question: usize,
}

impl<C, S, R> QuizRoundController<C, S, R>
where
    C: SampleCatalog,
    S: ScoreStore,
    R: Rng,
{
    pub fn new(catalog: C, store: S, rng: R) -> Self {
        Self {
            catalog,
            store,
            rng,
            options_per_question: DEFAULT_OPTIONS_PER_QUESTION,
        }
    }

    /// Overrides how many options a question offers. At least one option (the
    /// answer) is always produced.
    pub fn with_options_per_question(mut self, options: usize) -> Self {
        self.options_per_question = options.max(1);
        self
    }

    pub fn options_per_question(&self) -> usize {
        self.options_per_question
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Resets the current score and returns every catalog id as a fresh pool.
    pub fn start_new_game(&mut self) -> Result<SamplePool> {
        self.store.set_current_score(0)?;
        let pool: SamplePool = self.catalog.all_ids().into_iter().collect();
        info!(samples = pool.len(), "starting new game");
        Ok(pool)
    }

    /// Continues a game with the pool left over from the previous round.
    pub fn resume_game(&self, pool: SamplePool) -> SamplePool {
        debug!(remaining = pool.len(), "resuming game");
        pool
    }

    /// Picks an answer uniformly from `pool` and pads it with decoys drawn
    /// from the whole catalog.
    ///
    /// When the catalog has fewer samples than the configured option count,
    /// every catalog id is offered. Callers must check
    /// [`is_game_over`](Self::is_game_over) first.
    pub fn generate_question(&mut self, pool: &SamplePool) -> Result<Question> {
        if self.catalog.is_empty() {
            return Err(QuizError::InsufficientSamples);
        }
        if let Some(unknown) = pool.iter().find(|id| !self.catalog.contains(*id)) {
            warn!(id = unknown, "pool references a sample missing from the catalog");
            return Err(QuizError::InvalidSampleId(unknown));
        }

        let answer = pool
            .iter()
            .choose(&mut self.rng)
            .ok_or(QuizError::InsufficientSamples)?;

        let wanted = self.options_per_question.min(self.catalog.len());
        let decoy_candidates: Vec<SampleId> = self
            .catalog
            .all_ids()
            .into_iter()
            .filter(|id| *id != answer)
            .collect();

        let mut options: Vec<SampleId> = decoy_candidates
            .choose_multiple(&mut self.rng, wanted - 1)
            .copied()
            .collect();
        options.push(answer);
        options.shuffle(&mut self.rng);

        debug!(answer, ?options, "generated question");
        Ok(Question { options, answer })
    }

    /// Checks `chosen` against the question and consumes the answer from
    /// `pool` whether or not the guess was right.
    ///
    /// A correct guess adds one to the current score and lifts the high score
    /// when it is beaten. A wrong guess leaves both scores as they were.
    pub fn evaluate_answer(
        &mut self,
        question: &Question,
        chosen: SampleId,
        mut pool: SamplePool,
    ) -> Result<RoundOutcome> {
        for id in [chosen, question.answer] {
            if !self.catalog.contains(id) {
                warn!(id, "answer references a sample missing from the catalog");
                return Err(QuizError::InvalidSampleId(id));
            }
        }
        if !pool.remove(question.answer) {
            return Err(QuizError::AnswerNotInPool(question.answer));
        }

        let correct = question.is_answer(chosen);
        let mut score = self.store.snapshot()?;
        let mut high_score_raised = false;

        if correct {
            score.current = score.current.saturating_add(1);
        }
        self.store.set_current_score(score.current)?;

        if correct && score.current > score.high {
            score.high = score.current;
            self.store.set_high_score(score.high)?;
            high_score_raised = true;
            info!(high_score = score.high, "new high score");
        }

        debug!(
            chosen,
            answer = question.answer,
            correct,
            remaining = pool.len(),
            "evaluated answer"
        );

        Ok(RoundOutcome {
            correct,
            chosen,
            answer: question.answer,
            pool,
            score,
            high_score_raised,
        })
    }

    pub fn is_game_over(&self, pool: &SamplePool) -> bool {
        pool.len() < MIN_POOL_SIZE
    }

    /// Finishes the game. Scores are already persisted round by round, so this
    /// only reports them; the next [`start_new_game`](Self::start_new_game)
    /// resets the current score.
    pub fn end_game(&mut self) -> Result<ScoreState> {
        let score = self.store.snapshot()?;
        info!(score = score.current, high_score = score.high, "game over");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::composers, MemoryScoreStore, StaticCatalog};
    use quickcheck::TestResult;
    use rand::{rngs::StdRng, SeedableRng};

    /// Memory store that also counts how often each key is written.
    #[derive(Debug, Default)]
    struct CountingStore {
        inner: MemoryScoreStore,
        current_writes: usize,
        high_writes: usize,
    }

    impl CountingStore {
        fn with_state(current: u32, high: u32) -> Self {
            Self {
                inner: MemoryScoreStore::with_state(ScoreState { current, high }),
                ..Default::default()
            }
        }
    }

    impl ScoreStore for CountingStore {
        fn current_score(&self) -> Result<u32> {
            self.inner.current_score()
        }

        fn set_current_score(&mut self, score: u32) -> Result<()> {
            self.current_writes += 1;
            self.inner.set_current_score(score)
        }

        fn high_score(&self) -> Result<u32> {
            self.inner.high_score()
        }

        fn set_high_score(&mut self, score: u32) -> Result<()> {
            self.high_writes += 1;
            self.inner.set_high_score(score)
        }
    }

    fn five_composers() -> StaticCatalog {
        composers(&[
            (1, "Bach"),
            (2, "Mozart"),
            (3, "Beethoven"),
            (4, "Chopin"),
            (5, "Liszt"),
        ])
    }

    fn controller(
        catalog: StaticCatalog,
        store: CountingStore,
        seed: u64,
    ) -> QuizRoundController<StaticCatalog, CountingStore, StdRng> {
        QuizRoundController::new(catalog, store, StdRng::seed_from_u64(seed))
    }

    fn wrong_option(question: &Question) -> SampleId {
        *question
            .options()
            .iter()
            .find(|id| !question.is_answer(**id))
            .unwrap()
    }

    #[test]
    fn new_game_resets_score_and_loads_catalog() {
        let mut quiz = controller(five_composers(), CountingStore::with_state(6, 9), 1);

        let pool = quiz.start_new_game().unwrap();

        assert_eq!(pool, SamplePool::new([1, 2, 3, 4, 5]));
        assert_eq!(quiz.store().current_score().unwrap(), 0);
        assert_eq!(quiz.store().high_score().unwrap(), 9);
    }

    #[test]
    fn resume_returns_pool_untouched() {
        let mut quiz = controller(five_composers(), CountingStore::with_state(2, 2), 1);
        let pool = SamplePool::new([2, 4]);

        assert_eq!(quiz.resume_game(pool.clone()), pool);
        assert_eq!(quiz.store_mut().current_writes, 0);
        assert_eq!(quiz.store().current_score().unwrap(), 2);
    }

    #[test]
    fn correct_answer_scores_and_shrinks_pool() {
        let mut quiz = controller(five_composers(), CountingStore::default(), 7);
        let pool = quiz.start_new_game().unwrap();

        let question = quiz.generate_question(&pool).unwrap();
        assert!(pool.contains(question.answer()));
        assert_eq!(question.options().len(), 4);

        let outcome = quiz
            .evaluate_answer(&question, question.answer(), pool)
            .unwrap();

        assert!(outcome.correct);
        assert_eq!(outcome.pool.len(), 4);
        assert!(!outcome.pool.contains(question.answer()));
        assert_eq!(outcome.score.current, 1);
        assert_eq!(quiz.store().current_score().unwrap(), 1);
    }

    #[test]
    fn two_sample_pool_ends_after_one_round() {
        let mut quiz = controller(five_composers(), CountingStore::default(), 3);
        let pool = SamplePool::new([1, 2]);
        assert!(!quiz.is_game_over(&pool));

        let question = quiz.generate_question(&pool).unwrap();
        let outcome = quiz
            .evaluate_answer(&question, wrong_option(&question), pool)
            .unwrap();

        assert_eq!(outcome.pool.len(), 1);
        assert!(quiz.is_game_over(&outcome.pool));
    }

    #[test]
    fn beating_high_score_persists_it() {
        let mut quiz = controller(five_composers(), CountingStore::with_state(3, 3), 11);
        let pool = SamplePool::new([1, 2, 3, 4, 5]);
        let question = quiz.generate_question(&pool).unwrap();

        let outcome = quiz
            .evaluate_answer(&question, question.answer(), pool)
            .unwrap();

        assert!(outcome.high_score_raised);
        assert_eq!(outcome.score, ScoreState { current: 4, high: 4 });
        assert_eq!(quiz.store().high_score().unwrap(), 4);
        assert_eq!(quiz.store().high_writes, 1);
    }

    #[test]
    fn wrong_answer_keeps_scores_and_skips_high_score_write() {
        let mut quiz = controller(five_composers(), CountingStore::with_state(4, 5), 5);
        let pool = SamplePool::new([1, 2, 3, 4, 5]);
        let question = quiz.generate_question(&pool).unwrap();

        let outcome = quiz
            .evaluate_answer(&question, wrong_option(&question), pool)
            .unwrap();

        assert!(!outcome.correct);
        assert!(!outcome.high_score_raised);
        assert_eq!(outcome.score, ScoreState { current: 4, high: 5 });
        assert_eq!(outcome.pool.len(), 4);
        assert_eq!(quiz.store().high_writes, 0);
        assert_eq!(quiz.store().high_score().unwrap(), 5);
    }

    #[test]
    fn small_catalog_offers_every_sample() {
        let catalog = composers(&[(1, "Bach"), (2, "Mozart"), (3, "Beethoven")]);
        let mut quiz = controller(catalog, CountingStore::default(), 2);
        let pool = SamplePool::new([1, 2, 3]);

        let question = quiz.generate_question(&pool).unwrap();

        let mut options = question.options().to_vec();
        options.sort_unstable();
        assert_eq!(options, vec![1, 2, 3]);
    }

    #[test]
    fn decoys_may_come_from_answered_samples() {
        let mut quiz = controller(five_composers(), CountingStore::default(), 9);
        let pool = SamplePool::new([4, 5]);

        let question = quiz.generate_question(&pool).unwrap();

        assert!(pool.contains(question.answer()));
        assert_eq!(question.options().len(), 4);
        assert!(question.options().iter().any(|id| !pool.contains(*id)));
    }

    #[test]
    fn empty_catalog_is_insufficient() {
        let mut quiz = controller(StaticCatalog::default(), CountingStore::default(), 1);

        assert!(matches!(
            quiz.generate_question(&SamplePool::new([1, 2])),
            Err(QuizError::InsufficientSamples)
        ));
    }

    #[test]
    fn empty_pool_is_insufficient() {
        let mut quiz = controller(five_composers(), CountingStore::default(), 1);

        assert!(matches!(
            quiz.generate_question(&SamplePool::default()),
            Err(QuizError::InsufficientSamples)
        ));
    }

    #[test]
    fn unknown_pool_id_fails_fast() {
        let mut quiz = controller(five_composers(), CountingStore::default(), 1);

        assert!(matches!(
            quiz.generate_question(&SamplePool::new([1, 99])),
            Err(QuizError::InvalidSampleId(99))
        ));
    }

    #[test]
    fn unknown_choice_fails_without_touching_scores() {
        let mut quiz = controller(five_composers(), CountingStore::with_state(1, 1), 1);
        let pool = SamplePool::new([1, 2, 3]);
        let question = quiz.generate_question(&pool).unwrap();

        let err = quiz.evaluate_answer(&question, 42, pool).unwrap_err();

        assert!(matches!(err, QuizError::InvalidSampleId(42)));
        assert_eq!(quiz.store().current_writes, 0);
    }

    #[test]
    fn answer_outside_pool_is_rejected() {
        let mut quiz = controller(five_composers(), CountingStore::default(), 1);
        let pool = SamplePool::new([1, 2, 3]);
        let question = quiz.generate_question(&pool).unwrap();
        let mut spent = pool.clone();
        spent.remove(question.answer());

        assert!(matches!(
            quiz.evaluate_answer(&question, question.answer(), spent),
            Err(QuizError::AnswerNotInPool(id)) if id == question.answer()
        ));
    }

    #[test]
    fn same_seed_reproduces_questions() {
        let pool = SamplePool::new([1, 2, 3, 4, 5]);
        let mut first = controller(five_composers(), CountingStore::default(), 42);
        let mut second = controller(five_composers(), CountingStore::default(), 42);

        for _ in 0..5 {
            assert_eq!(
                first.generate_question(&pool).unwrap(),
                second.generate_question(&pool).unwrap()
            );
        }
    }

    #[test]
    fn option_lookup_by_position() {
        let mut quiz = controller(five_composers(), CountingStore::default(), 8);
        let question = quiz.generate_question(&SamplePool::new([1, 2, 3])).unwrap();

        let index = question.option_index(question.answer()).unwrap();
        assert_eq!(question.option_at(index), Some(question.answer()));
        assert_eq!(question.option_at(question.options().len()), None);
    }

    #[test]
    fn game_over_below_two_samples() {
        let quiz = controller(five_composers(), CountingStore::default(), 1);

        assert!(quiz.is_game_over(&SamplePool::default()));
        assert!(quiz.is_game_over(&SamplePool::new([3])));
        assert!(!quiz.is_game_over(&SamplePool::new([3, 4])));
    }

    #[test]
    fn end_game_reports_without_writing() {
        let mut quiz = controller(five_composers(), CountingStore::with_state(3, 8), 1);

        let score = quiz.end_game().unwrap();

        assert_eq!(score, ScoreState { current: 3, high: 8 });
        assert_eq!(quiz.store().current_writes, 0);
        assert_eq!(quiz.store().high_writes, 0);
    }

    #[test]
    fn prop_question_answer_drawn_from_pool() {
        fn property(seed: u64, mask: u8) -> TestResult {
            let pool: SamplePool = (1..=5).filter(|id| mask & (1u8 << (id - 1)) != 0).collect();
            if pool.is_empty() {
                return TestResult::discard();
            }

            let mut quiz = controller(five_composers(), CountingStore::default(), seed);
            let question = quiz.generate_question(&pool).unwrap();
            let mut distinct = question.options().to_vec();
            distinct.sort_unstable();
            distinct.dedup();

            TestResult::from_bool(
                pool.contains(question.answer())
                    && question.options().contains(&question.answer())
                    && distinct.len() == question.options().len()
                    && question.options().len() == 4,
            )
        }

        quickcheck::QuickCheck::new()
            .tests(200)
            .quickcheck(property as fn(u64, u8) -> TestResult);
    }

    #[test]
    fn prop_each_round_consumes_exactly_the_answer() {
        fn property(seed: u64, guesses: Vec<bool>) -> bool {
            let mut quiz = controller(five_composers(), CountingStore::default(), seed);
            let mut pool = quiz.start_new_game().unwrap();

            for guess_right in guesses {
                if quiz.is_game_over(&pool) {
                    break;
                }
                let before = pool.len();
                let question = quiz.generate_question(&pool).unwrap();
                let chosen = if guess_right {
                    question.answer()
                } else {
                    wrong_option(&question)
                };
                let outcome = quiz.evaluate_answer(&question, chosen, pool).unwrap();

                if outcome.pool.len() != before - 1 || outcome.pool.contains(question.answer()) {
                    return false;
                }
                pool = outcome.pool;
            }
            true
        }

        quickcheck::QuickCheck::new()
            .tests(100)
            .quickcheck(property as fn(u64, Vec<bool>) -> bool);
    }

    #[test]
    fn prop_high_score_never_decreases() {
        fn property(seed: u64, guesses: Vec<bool>) -> bool {
            let mut quiz = controller(five_composers(), CountingStore::default(), seed);
            let mut pool = quiz.start_new_game().unwrap();
            let mut last_high = 0;

            for guess_right in guesses {
                if quiz.is_game_over(&pool) {
                    quiz.end_game().unwrap();
                    pool = quiz.start_new_game().unwrap();
                }
                let question = quiz.generate_question(&pool).unwrap();
                let chosen = if guess_right {
                    question.answer()
                } else {
                    wrong_option(&question)
                };
                let outcome = quiz.evaluate_answer(&question, chosen, pool).unwrap();

                if outcome.score.high < last_high || outcome.score.current > outcome.score.high {
                    return false;
                }
                last_high = outcome.score.high;
                pool = outcome.pool;
            }
            true
        }

        quickcheck::QuickCheck::new()
            .tests(100)
            .quickcheck(property as fn(u64, Vec<bool>) -> bool);
    }
}
