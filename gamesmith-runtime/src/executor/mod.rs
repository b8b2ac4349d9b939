//! # Supervised executor
//!
//! Runs generated program source against the player's console and returns
//! everything that happened as one transcript string.
//!
//! - `Console`: real user I/O (`StdConsole`) or a fixed script (`ScriptedConsole`)
//! - `Interposer`: the per-run `GameIo` that tees output and records answers
//! - `Interpreter`: what actually runs the source (`PythonInterpreter`)
//!
//! `execute` never fails. A program fault ends the run early and becomes an
//! `Error while running code: ...` line in the returned transcript.

mod console;
mod frame;
mod interpose;
mod interpreter;
mod python;
mod transcript;

pub use console::{Console, ScriptedConsole, StdConsole};
pub use interpose::Interposer;
pub use interpreter::{GameIo, Interpreter};
pub use python::PythonInterpreter;
pub use transcript::Transcript;

use crate::error::Error;

/// Written before the program starts
pub const GAME_STARTING: &str = "\n=== GAME STARTING - Please interact below ===\n\n";
/// Written after the program finishes without a fault
pub const GAME_COMPLETED: &str = "\n=== GAME COMPLETED ===\n\n";
/// Prefix of the line that replaces a program fault
pub const FAULT_PREFIX: &str = "Error while running code: ";

/// Where the executor is in its run cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug)]
struct Lifecycle {
    state: ExecutionState,
    last_outcome: Option<ExecutionState>,
    runs: u64,
}

/// Holds the lifecycle in `Running` for one call and puts it back to `Idle`
/// on every exit path, unwinding included.
struct RunGuard<'a> {
    lifecycle: &'a mut Lifecycle,
}

impl<'a> RunGuard<'a> {
    fn enter(lifecycle: &'a mut Lifecycle) -> Self {
        debug_assert_eq!(lifecycle.state, ExecutionState::Idle);
        lifecycle.state = ExecutionState::Running;
        lifecycle.runs += 1;
        Self { lifecycle }
    }

    fn run_number(&self) -> u64 {
        self.lifecycle.runs
    }

    fn finish(&mut self, outcome: ExecutionState) {
        self.lifecycle.state = outcome;
        self.lifecycle.last_outcome = Some(outcome);
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.lifecycle.state == ExecutionState::Running {
            self.lifecycle.last_outcome = Some(ExecutionState::Failed);
        }
        self.lifecycle.state = ExecutionState::Idle;
    }
}

/// Runs program source with console interposition.
///
/// `execute` takes `&mut self`, so one executor can never run two programs
/// at once and its console is never interposed twice.
pub struct Executor<I, C> {
    interpreter: I,
    console: C,
    lifecycle: Lifecycle,
}

impl<I: Interpreter, C: Console> Executor<I, C> {
    pub fn new(interpreter: I, console: C) -> Self {
        Self {
            interpreter,
            console,
            lifecycle: Lifecycle {
                state: ExecutionState::Idle,
                last_outcome: None,
                runs: 0,
            },
        }
    }

    pub fn state(&self) -> ExecutionState {
        self.lifecycle.state
    }

    /// `Completed` or `Failed` for the most recent run
    pub fn last_outcome(&self) -> Option<ExecutionState> {
        self.lifecycle.last_outcome
    }

    pub fn runs(&self) -> u64 {
        self.lifecycle.runs
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// The console itself, outside of any run
    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Run `source` and return the transcript of the session
    pub fn execute(&mut self, source: &str) -> String {
        let mut guard = RunGuard::enter(&mut self.lifecycle);
        let mut io = Interposer::new(&mut self.console);
        let interpreter = &self.interpreter;

        tracing::info!(
            run = guard.run_number(),
            interpreter = interpreter.name(),
            bytes = source.len(),
            "game starting"
        );

        let outcome = io
            .print(GAME_STARTING)
            .map_err(Error::from)
            .and_then(|_| interpreter.run(source, &mut io))
            .and_then(|_| io.print(GAME_COMPLETED).map_err(Error::from));

        match outcome {
            Ok(()) => {
                guard.finish(ExecutionState::Completed);
                tracing::info!(
                    run = guard.run_number(),
                    answers = io.transcript().exchanges(),
                    "game completed"
                );
            }
            Err(err) => {
                guard.finish(ExecutionState::Failed);
                tracing::warn!(run = guard.run_number(), error = %err, "game failed");
                if let Err(e) = io.print(&format!("{}{}\n", FAULT_PREFIX, err.message())) {
                    tracing::warn!(error = %e, "could not show the fault on the console");
                }
            }
        }

        io.into_transcript().into_string()
    }
}
