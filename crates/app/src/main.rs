use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use classical_quiz_core::{
    AppConfig, GamePhase, GameSession, JsonScoreStore, LoggingPlayer, MediaSession, Player, PlayerStatus,
    QuizError, QuizRoundController, SampleCatalog, SampleId, ScoreStore, StaticCatalog,
    TransportAction,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

type Session = GameSession<StaticCatalog, JsonScoreStore, StdRng>;

fn main() -> classical_quiz_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => run_play(args),
        Commands::Scores { scores, reset } => run_scores(scores, reset),
        Commands::Catalog { catalog } => run_catalog(catalog.as_deref()),
    }
}

fn run_play(args: PlayArgs) -> classical_quiz_core::Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.quiz.seed = Some(seed);
    }
    if let Some(delay) = args.delay_ms {
        config.quiz.answer_delay_ms = delay;
    }
    if let Some(path) = args.scores {
        config.storage.score_path = path;
    }
    if let Some(path) = args.catalog {
        config.storage.catalog_path = Some(path);
    }
    config.validate()?;

    tracing::info!(?config, "starting quiz");

    let catalog = load_catalog(config.storage.catalog_path.as_deref())?;
    let store = JsonScoreStore::new(&config.storage.score_path);
    let rng = match config.quiz.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let controller = QuizRoundController::new(catalog, store, rng)
        .with_options_per_question(config.quiz.options_per_question);
    let mut game = GameSession::new(controller).with_answer_delay(config.quiz.answer_delay());
    let mut media = MediaSession::new(LoggingPlayer::new());

    game.start()?;
    let result = play_rounds(&mut game, &mut media);
    media.release();
    result
}

fn play_rounds(
    game: &mut Session,
    media: &mut MediaSession<LoggingPlayer>,
) -> classical_quiz_core::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let question = match game.phase() {
            GamePhase::InRound(question) => question.clone(),
            GamePhase::GameOver(score) => {
                println!(
                    "Game over! You scored {} (high score {}).",
                    score.current, score.high
                );
                return Ok(());
            }
            other => return Err(QuizError::msg(format!("unexpected phase {other:?}"))),
        };

        if let Some(sample) = game.current_sample() {
            media.load(&sample.uri);
            media.on_player_state_changed(true, PlayerStatus::Ready);
        }

        println!();
        println!("Who composed this piece?");
        for (index, id) in question.options().iter().enumerate() {
            println!("  {}) {}", index + 1, composer_name(game, *id)?);
        }

        let outcome = loop {
            print!("Your answer [1-{}, p=play/pause, r=restart, q=quit]: ", question.options().len());
            io::stdout().flush()?;

            let Some(line) = lines.next() else {
                return Ok(());
            };
            match line?.trim() {
                "q" => return Ok(()),
                "p" => {
                    media.handle(TransportAction::PlayPause);
                    let state = media.on_player_state_changed(
                        media.player().play_when_ready(),
                        PlayerStatus::Ready,
                    );
                    println!("{state:?}");
                }
                "r" => media.handle(TransportAction::SkipToPrevious),
                choice => match choice.parse::<usize>() {
                    Ok(number) if (1..=question.options().len()).contains(&number) => {
                        break game.answer_at(number - 1)?;
                    }
                    _ => println!("Please pick one of the listed options."),
                },
            }
        };

        let answer = composer_name(game, outcome.answer)?;
        if outcome.correct {
            println!("Correct, it was {answer}!");
        } else {
            println!("Not quite, it was {answer}.");
        }
        if outcome.high_score_raised {
            println!("New high score!");
        }
        println!(
            "Score: {}  High score: {}  Remaining: {}",
            outcome.score.current,
            outcome.score.high,
            outcome.pool.len()
        );

        std::thread::sleep(game.answer_delay());
        media.release();
        game.advance()?;
    }
}

fn composer_name(game: &Session, id: SampleId) -> classical_quiz_core::Result<String> {
    Ok(game.controller().catalog().require(id)?.composer.clone())
}

fn run_scores(path: Option<PathBuf>, reset: bool) -> classical_quiz_core::Result<()> {
    let path = path.unwrap_or_else(|| AppConfig::default().storage.score_path);
    let mut store = JsonScoreStore::new(path);

    if reset {
        store.set_current_score(0)?;
        store.set_high_score(0)?;
        tracing::info!(path = ?store.path(), "scores reset");
    }

    let score = store.snapshot()?;
    println!("Current score: {}", score.current);
    println!("High score:    {}", score.high);
    Ok(())
}

fn run_catalog(path: Option<&Path>) -> classical_quiz_core::Result<()> {
    let catalog = load_catalog(path)?;
    for sample in catalog.samples() {
        println!("{:>3}  {:<28} {}", sample.id, sample.composer, sample.title);
    }
    Ok(())
}

fn load_catalog(path: Option<&Path>) -> classical_quiz_core::Result<StaticCatalog> {
    let catalog = match path {
        Some(path) => StaticCatalog::from_path(path)?,
        None => StaticCatalog::bundled()?,
    };
    if catalog.is_empty() {
        return Err(QuizError::InsufficientSamples);
    }
    tracing::debug!(samples = catalog.len(), "catalog loaded");
    Ok(catalog)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Guess the composer of classical excerpts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a game in the terminal.
    Play(PlayArgs),
    /// Show the persisted scores.
    Scores {
        /// Score file to read.
        #[arg(short, long)]
        scores: Option<PathBuf>,
        /// Reset both the current and the high score to zero.
        #[arg(long)]
        reset: bool,
    },
    /// List the samples in a catalog.
    Catalog {
        /// JSON catalog to list instead of the bundled one.
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON catalog to play instead of the bundled one.
    #[arg(short, long)]
    catalog: Option<PathBuf>,
    /// Score file to read and update.
    #[arg(short, long)]
    scores: Option<PathBuf>,
    /// Seed for a reproducible game.
    #[arg(long)]
    seed: Option<u64>,
    /// How long to show the answer before the next round, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,
}
