//! # gamesmith Agent
//!
//! The generator orchestrates the model <-> executor loop:
//! 1. The player describes the game they want
//! 2. The model writes a game and calls `run_code` to play it
//! 3. The executor runs it against the player's console and returns the transcript
//! 4. The model answers with the final artifact, which is validated
//! 5. Rejected answers are sent back with the reasons, up to the retry budget
//!
//! The model writes the game, the player plays it.

mod generator;
mod tools;

pub use generator::{Generator, GeneratorConfig};
pub use tools::{run_code_definition, RunCode, ToolRequest};
