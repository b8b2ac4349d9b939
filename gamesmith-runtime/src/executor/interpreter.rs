//! The seam between the executor and whatever actually runs the source

use crate::error::Result;
use std::io;

/// The only view of the console a running program gets
pub trait GameIo {
    /// Show program output to the player
    fn print(&mut self, text: &str) -> io::Result<()>;

    /// Show `prompt`, block for one line from the player and return it.
    /// Fails with `UnexpectedEof` once the player's input is closed.
    fn input(&mut self, prompt: &str) -> io::Result<String>;
}

/// Runs program source against a `GameIo`.
///
/// Implementations must not give the program access to the caller's own
/// state. A fault raised by the program is returned as an `ExecutionFault`
/// error whose message is the program's own error message.
pub trait Interpreter {
    /// Short name for logs (e.g. "python3")
    fn name(&self) -> &str;

    fn run(&self, source: &str, io: &mut dyn GameIo) -> Result<()>;
}
