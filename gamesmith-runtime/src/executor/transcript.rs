//! In-memory record of one execution

/// Program output and player answers, in the order they happened.
/// Owned by a single execution and consumed when it ends.
#[derive(Debug, Default)]
pub struct Transcript {
    text: String,
    exchanges: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_output(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Record a prompt and the line typed in answer, as one line
    pub fn push_exchange(&mut self, prompt: &str, answer: &str) {
        self.text.push_str(prompt);
        self.text.push_str(answer);
        self.text.push('\n');
        self.exchanges += 1;
    }

    /// Number of answered prompts
    pub fn exchanges(&self) -> usize {
        self.exchanges
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleaves_output_and_answers() {
        let mut transcript = Transcript::new();
        transcript.push_output("Welcome!\n");
        transcript.push_exchange("Your name? ", "Ada");
        transcript.push_output("Hi Ada\n");

        assert_eq!(transcript.as_str(), "Welcome!\nYour name? Ada\nHi Ada\n");
        assert_eq!(transcript.exchanges(), 1);
        assert_eq!(transcript.into_string(), "Welcome!\nYour name? Ada\nHi Ada\n");
    }
}
