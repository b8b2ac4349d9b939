//! # gamesmith runtime
//!
//! The pieces the generator is built from.
//!
//! ## Core Concepts
//! - **Provider**: Trait-based LLM communication (OpenAI and compatible servers)
//! - **Schema**: The game artifact the model must return, its prompt and validation
//! - **Profile**: The learner the game is generated for
//! - **Executor**: Runs generated source with the player's console interposed

pub mod error;
pub mod executor;
pub mod profile;
pub mod provider;
pub mod schema;

pub use error::{Error, ErrorKind, Result};
pub use executor::{
    Console, ExecutionState, Executor, GameIo, Interpreter, Interposer, PythonInterpreter,
    ScriptedConsole, StdConsole, Transcript, FAULT_PREFIX, GAME_COMPLETED, GAME_STARTING,
};
pub use profile::LearnerProfile;
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, OpenAIProvider,
    ProviderConfig, ProviderError, ResponseFormat, Role, ToolCall, ToolDefinition, Usage,
    UsageTracker,
};
pub use schema::{
    ArtifactViolation, Difficulty, GameArtifact, GameSchema, EXAMPLE_GUESSING_GAME,
    RUN_CODE_TOOL,
};
