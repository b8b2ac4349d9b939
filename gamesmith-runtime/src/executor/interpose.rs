//! Console interposition for one execution window

use super::console::Console;
use super::interpreter::GameIo;
use super::transcript::Transcript;
use std::io;

/// Tees program output to the console and the transcript, and records
/// every answered prompt. Lives exactly as long as one execution; once it
/// is consumed the console is back to talking to nobody but the user.
pub struct Interposer<'a> {
    console: &'a mut dyn Console,
    transcript: Transcript,
}

impl<'a> Interposer<'a> {
    pub fn new(console: &'a mut dyn Console) -> Self {
        Self {
            console,
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }
}

impl GameIo for Interposer<'_> {
    fn print(&mut self, text: &str) -> io::Result<()> {
        // Recorded first so the transcript stays whole if the console is gone.
        self.transcript.push_output(text);
        self.console.write(text)
    }

    fn input(&mut self, prompt: &str) -> io::Result<String> {
        self.console.write(prompt)?;
        let answer = self.console.read_line()?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "EOF when reading a line")
        })?;
        // Raw terminal input is not part of the program's output; echo it.
        self.console.write(&format!("{}\n", answer))?;
        self.transcript.push_exchange(prompt, &answer);
        Ok(answer)
    }
}
