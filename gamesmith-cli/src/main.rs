//! # gamesmith CLI
//!
//! Asks the model for an interactive Python game, lets the player try it
//! while the model works, and prints the finished game.
//!
//! Usage:
//!   gamesmith
//!   gamesmith --request "Create a game that teaches how the random module works"
//!   gamesmith --profile learner.json --model gpt-4o
//!
//! Logs go to stderr; set `GAMESMITH_LOG` (e.g. `GAMESMITH_LOG=gamesmith_agent=debug`)
//! to change what is shown.

mod config;

use clap::Parser;
use config::CliConfig;
use gamesmith_agent::Generator;
use gamesmith_runtime::{
    Console, Error, Executor, GameArtifact, LearnerProfile, OpenAIProvider, PythonInterpreter,
    Result, StdConsole,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const INTRO: &str = "\n=== Python Game Learning Agent ===\n\n\
This agent will create an interactive game to help you learn Python concepts.\n\
Currently optimized for teaching about the random module and other Python concepts.\n\n\
Please enter your learning request (e.g., 'Create a game that teaches how the random module works'):\n";

const NO_RESULT: &str = "No valid response from the AI model.";

#[derive(Parser)]
#[command(name = "gamesmith")]
#[command(author, version, about = "gamesmith - interactive Python games for learners")]
struct Cli {
    /// Model to generate with (overrides GAMESMITH_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible API base URL (overrides OPENAI_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Python interpreter that runs the games (overrides GAMESMITH_PYTHON)
    #[arg(long)]
    python: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Learner profile JSON file (userId, userName, userExperience, userSkillset)
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Learning request; skips the interactive prompt
    #[arg(long)]
    request: Option<String>,

    /// Accept a game even if the model never ran its code
    #[arg(long)]
    no_require_execution: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GAMESMITH_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Ask the player what to build
fn read_request(console: &mut impl Console) -> Result<String> {
    console.write(INTRO)?;
    console.write("user: ")?;
    let request = console.read_line()?.unwrap_or_default();
    console.write("\nGenerating your interactive game... This may take a moment.\n\n")?;
    Ok(request)
}

fn load_profile(config: &CliConfig) -> Result<LearnerProfile> {
    match &config.profile {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading learner profile");
            LearnerProfile::load(path)
        }
        None => Ok(LearnerProfile::default()),
    }
}

fn render(artifact: &GameArtifact) -> String {
    format!(
        "=== Generated Game ===\n\
         Code:\n{}\n\n\n\
         Difficulty:\n{}\n\n\n\
         Keywords:\n{:?}\n\n\n\
         Response:\n{}\n\n\n\
         Walkthrough:\n{}\n\n",
        artifact.code(),
        artifact.difficulty(),
        artifact.keywords(),
        artifact.transcript(),
        artifact.walkthrough(),
    )
}

async fn run(cli: &Cli, config: &CliConfig) -> Result<GameArtifact> {
    let profile = load_profile(config)?;

    let mut console = StdConsole::new();
    let request = match &cli.request {
        Some(request) => {
            console.write("\nGenerating your interactive game... This may take a moment.\n\n")?;
            request.clone()
        }
        None => read_request(&mut console)?,
    };

    let python = PythonInterpreter::with_program(&config.python);
    if !python.is_available() {
        tracing::warn!(python = %python.program(), "python interpreter not found; games will fail to run");
    }

    let provider = OpenAIProvider::new(config.provider()).map_err(Error::from)?;
    let executor = Executor::new(python, console);
    let mut generator = Generator::with_config(provider, executor, config.generator());

    let artifact = generator.generate(&request, &profile).await?;
    tracing::debug!(
        calls = generator.usage().total_calls,
        tokens = generator.usage().total_tokens(),
        runs = generator.executor().runs(),
        "generation finished"
    );
    Ok(artifact)
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = CliConfig::from_env().merge(&cli);
    tracing::debug!(model = %config.model, python = %config.python, "configuration loaded");

    match run(&cli, &config).await {
        Ok(artifact) => print!("{}", render(&artifact)),
        Err(e) => {
            tracing::error!(kind = e.kind().as_str(), error = ?e, "generation failed");
            println!("{}", NO_RESULT);
        }
    }
}
