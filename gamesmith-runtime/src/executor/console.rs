//! Real user I/O behind a trait, so the executor can be driven by a terminal
//! or by a fixed script of answers.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Where game output goes and where player answers come from
pub trait Console {
    /// Write text exactly as given and flush it
    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Block for one line of input, without its line terminator.
    /// `None` means the input is closed.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

impl<C: Console + ?Sized> Console for &mut C {
    fn write(&mut self, text: &str) -> io::Result<()> {
        (**self).write(text)
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        (**self).read_line()
    }
}

/// The process's stdin and stdout
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for StdConsole {
    fn write(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(trim_line_ending(line)))
    }
}

/// Answers come from a fixed list; output is kept in memory
#[derive(Debug, Default, Clone)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    output: String,
}

impl ScriptedConsole {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: String::new(),
        }
    }

    /// Everything written so far
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn remaining_inputs(&self) -> usize {
        self.inputs.len()
    }
}

impl Console for ScriptedConsole {
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.inputs.pop_front().map(trim_line_ending))
    }
}

fn trim_line_ending(mut line: String) -> String {
    if let Some(pos) = line.find('\n') {
        line.truncate(pos);
    }
    if line.ends_with('\r') {
        line.pop();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_console_replays_inputs() {
        let mut console = ScriptedConsole::new(["10", "5\r\n"]);
        assert_eq!(console.read_line().unwrap().as_deref(), Some("10"));
        assert_eq!(console.read_line().unwrap().as_deref(), Some("5"));
        assert_eq!(console.read_line().unwrap(), None);
        assert_eq!(console.remaining_inputs(), 0);
    }

    #[test]
    fn test_scripted_console_captures_output() {
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        console.write("Guess: ").unwrap();
        console.write("7\n").unwrap();
        assert_eq!(console.output(), "Guess: 7\n");
    }

    #[test]
    fn test_only_first_line_of_scripted_input_is_used() {
        let mut console = ScriptedConsole::new(["yes\nno"]);
        assert_eq!(console.read_line().unwrap().as_deref(), Some("yes"));
    }

    #[test]
    fn test_console_through_mut_ref() {
        fn drive<C: Console>(mut console: C) -> Option<String> {
            console.write("x").unwrap();
            console.read_line().unwrap()
        }

        let mut console = ScriptedConsole::new(["a"]);
        assert_eq!(drive(&mut console).as_deref(), Some("a"));
        assert_eq!(console.output(), "x");
    }
}
