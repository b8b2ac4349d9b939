//! # Game schema for structured generation
//!
//! Describes the artifact the model must return, renders the system
//! instructions (with one worked example) and validates what comes back.
//! The same field list drives the prompt, the JSON schema sent as the
//! `response_format`, and validation.

use crate::profile::LearnerProfile;
use crate::provider::ResponseFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the one capability the model may call during generation
pub const RUN_CODE_TOOL: &str = "run_code";

/// The worked example shown to the model
pub const EXAMPLE_GUESSING_GAME: &str = r#"import random

def number_guessing_game():
    print("Welcome to the Number Guessing Game!")
    print("I'm thinking of a number between 1 and 20.")
    secret_number = random.randint(1, 20)
    attempts = 0
    max_attempts = 5

    while attempts < max_attempts:
        try:
            guess = int(input("Enter your guess (1-20): "))
            attempts += 1

            if guess < secret_number:
                print("Too low! Try again.")
            elif guess > secret_number:
                print("Too high! Try again.")
            else:
                print(f"Congratulations! You guessed the number in {attempts} attempts!")
                return

            print(f"Attempts left: {max_attempts - attempts}")
        except ValueError:
            print("Please enter a valid number!")

    print(f"Game over! The secret number was {secret_number}.")

number_guessing_game()"#;

const EXAMPLE_TRANSCRIPT: &str = "Welcome to the Number Guessing Game!\n\
I'm thinking of a number between 1 and 20.\n\
Enter your guess (1-20): 10\n\
Too high! Try again.\n\
Attempts left: 4\n\
Enter your guess (1-20): 5\n\
Too low! Try again.\n\
Attempts left: 3\n\
Enter your guess (1-20): 7\n\
Congratulations! You guessed the number in 3 attempts!";

const EXAMPLE_WALKTHROUGH: &str = "This code creates a simple number guessing game. \
A while loop allows multiple guesses up to a maximum number of attempts, and the random \
module picks the secret number between 1 and 20. Each guess is read with input(), and a \
try/except block keeps the game running when the player types something that is not a \
number. if/elif/else compares the guess with the secret and tells the player whether to go \
higher or lower, so every answer changes what the game says next.";

// ============================================================================
// Artifact
// ============================================================================

/// Difficulty label of a generated game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "Very Easy")]
    VeryEasy,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::VeryEasy,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::VeryEasy => "Very Easy",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Exact match on the wire label
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == label)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated generation result. Every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameArtifact {
    code: String,
    difficulty: Difficulty,
    keywords: Vec<String>,
    #[serde(rename = "response")]
    transcript: String,
    walkthrough: String,
}

impl GameArtifact {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Output of a run of `code`, including the player's answers
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn walkthrough(&self) -> &str {
        &self.walkthrough
    }

    /// Replace the transcript with one captured from a real run.
    /// An empty transcript is ignored so the artifact stays valid.
    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        let transcript = transcript.into();
        if !transcript.trim().is_empty() {
            self.transcript = transcript;
        }
        self
    }

    /// Parse raw model output (JSON, possibly fenced) into a validated artifact
    pub fn parse(content: &str) -> Result<Self, Vec<ArtifactViolation>> {
        let json = extract_json(content);
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| vec![ArtifactViolation::NotJson(e.to_string())])?;
        raw.validate()
    }
}

/// What the model sent, before validation. Fields are optional so that every
/// problem can be reported at once instead of failing on the first one.
#[derive(Debug, Default, Deserialize)]
struct RawArtifact {
    code: Option<String>,
    difficulty: Option<String>,
    keywords: Option<Vec<String>>,
    response: Option<String>,
    walkthrough: Option<String>,
}

impl RawArtifact {
    fn validate(self) -> Result<GameArtifact, Vec<ArtifactViolation>> {
        let mut violations = Vec::new();

        let code = required_text("code", self.code, &mut violations);
        let transcript = required_text("response", self.response, &mut violations);
        let walkthrough = required_text("walkthrough", self.walkthrough, &mut violations);

        let difficulty = match self.difficulty {
            None => {
                violations.push(ArtifactViolation::MissingField("difficulty"));
                None
            }
            Some(label) => match Difficulty::parse(&label) {
                Some(d) => Some(d),
                None => {
                    violations.push(ArtifactViolation::UnknownDifficulty(label));
                    None
                }
            },
        };

        let keywords = match self.keywords {
            None => {
                violations.push(ArtifactViolation::MissingField("keywords"));
                None
            }
            Some(k) if k.is_empty() => {
                violations.push(ArtifactViolation::EmptyField("keywords"));
                None
            }
            Some(k) => {
                if let Some(index) = k.iter().position(|kw| kw.trim().is_empty()) {
                    violations.push(ArtifactViolation::BlankKeyword(index));
                }
                Some(k)
            }
        };

        match (code, difficulty, keywords, transcript, walkthrough) {
            (Some(code), Some(difficulty), Some(keywords), Some(transcript), Some(walkthrough))
                if violations.is_empty() =>
            {
                Ok(GameArtifact {
                    code,
                    difficulty,
                    keywords,
                    transcript,
                    walkthrough,
                })
            }
            _ => Err(violations),
        }
    }
}

fn required_text(
    field: &'static str,
    value: Option<String>,
    violations: &mut Vec<ArtifactViolation>,
) -> Option<String> {
    match value {
        None => {
            violations.push(ArtifactViolation::MissingField(field));
            None
        }
        Some(v) if v.trim().is_empty() => {
            violations.push(ArtifactViolation::EmptyField(field));
            None
        }
        Some(v) => Some(v),
    }
}

/// One reason an artifact was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactViolation {
    NotJson(String),
    MissingField(&'static str),
    EmptyField(&'static str),
    UnknownDifficulty(String),
    BlankKeyword(usize),
    /// `code` was never run through the execution tool
    NotExecuted,
    /// `code` differs from the last source run through the execution tool
    CodeMismatch,
    /// The model kept calling tools without producing an answer
    TooManyToolRounds(usize),
}

impl fmt::Display for ArtifactViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson(e) => write!(f, "the answer is not a valid JSON object: {}", e),
            Self::MissingField(field) => write!(f, "field `{}` is missing", field),
            Self::EmptyField(field) => write!(f, "field `{}` must not be empty", field),
            Self::UnknownDifficulty(label) => write!(
                f,
                "difficulty `{}` is not one of {}",
                label,
                Difficulty::ALL.map(|d| d.as_str()).join(", ")
            ),
            Self::BlankKeyword(index) => write!(f, "keyword #{} is blank", index + 1),
            Self::NotExecuted => write!(
                f,
                "the code was never run; call `{}` with the final code before answering",
                RUN_CODE_TOOL
            ),
            Self::CodeMismatch => write!(
                f,
                "`code` is not the code last run with `{}`; run the final code before answering",
                RUN_CODE_TOOL
            ),
            Self::TooManyToolRounds(limit) => {
                write!(f, "no answer after {} tool calls", limit)
            }
        }
    }
}

/// Strip a markdown fence the model may wrap around its whole answer.
/// Fences inside the JSON (a walkthrough showing code, say) are left alone.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    // Opening line may carry an info string such as `json`.
    let inner = match inner.split_once('\n') {
        Some((info, rest)) if !info.trim_start().starts_with('{') => rest,
        _ => inner,
    };
    inner.trim()
}

// ============================================================================
// Schema
// ============================================================================

/// Everything the model needs to know to produce a `GameArtifact`
#[derive(Debug, Clone)]
pub struct GameSchema {
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
    pub rules: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextList,
    Difficulty,
}

impl Default for GameSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSchema {
    pub fn new() -> Self {
        Self {
            description: "You are an expert Python game developer specializing in INTERACTIVE games \
                          that teach programming concepts.",
            fields: Self::define_fields(),
            rules: Self::define_rules(),
        }
    }

    fn define_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec {
                name: "code",
                description: "Fully executable Python code with MULTIPLE input() calls for user interaction",
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "difficulty",
                description: "Difficulty level of the game",
                kind: FieldKind::Difficulty,
            },
            FieldSpec {
                name: "keywords",
                description: "Main programming concepts the game teaches",
                kind: FieldKind::TextList,
            },
            FieldSpec {
                name: "response",
                description: "Output of the executed code as returned by the run_code tool, including user interactions",
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "walkthrough",
                description: "How the code works, how the keywords are used and how user inputs change the game",
                kind: FieldKind::Text,
            },
        ]
    }

    fn define_rules() -> Vec<&'static str> {
        vec![
            "The code MUST be interactive and call input() several times.",
            "The player's answers must change what the game does next.",
            "Build an actual game that needs the player, not a demonstration or tutorial.",
            "Call the run_code tool with your final code; it runs the game with a real player and returns the transcript.",
            "Put the transcript returned by run_code in the `response` field.",
            "Do not include markdown formatting, extra keys or any text outside the JSON object.",
        ]
    }

    /// The worked example as JSON
    pub fn example(&self) -> serde_json::Value {
        serde_json::json!({
            "code": EXAMPLE_GUESSING_GAME,
            "difficulty": Difficulty::Easy.as_str(),
            "keywords": ["loops", "conditionals", "user input", "random numbers", "error handling"],
            "response": EXAMPLE_TRANSCRIPT,
            "walkthrough": EXAMPLE_WALKTHROUGH,
        })
    }

    /// JSON schema of the artifact, in the strict subset OpenAI accepts
    pub fn json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for field in &self.fields {
            let property = match field.kind {
                FieldKind::Text => serde_json::json!({
                    "type": "string",
                    "description": field.description,
                }),
                FieldKind::TextList => serde_json::json!({
                    "type": "array",
                    "items": { "type": "string" },
                    "description": field.description,
                }),
                FieldKind::Difficulty => serde_json::json!({
                    "type": "string",
                    "enum": Difficulty::ALL.map(|d| d.as_str()),
                    "description": field.description,
                }),
            };
            properties.insert(field.name.to_string(), property);
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.fields.iter().map(|f| f.name).collect::<Vec<_>>(),
            "additionalProperties": false,
        })
    }

    pub fn response_format(&self) -> ResponseFormat {
        ResponseFormat {
            name: "game_result".into(),
            schema: self.json_schema(),
            strict: true,
        }
    }

    /// Render the system instructions for one learner
    pub fn system_prompt(&self, profile: &LearnerProfile) -> String {
        let mut out = String::new();

        out.push_str(self.description);
        out.push_str("\n\nYour goal is to generate a JSON object matching this schema:\n{\n");
        for field in &self.fields {
            let shape = match field.kind {
                FieldKind::Text => format!("\"{}\"", field.description),
                FieldKind::TextList => format!("[\"{}\"]", field.description),
                FieldKind::Difficulty => format!(
                    "\"one of: {}\"",
                    Difficulty::ALL.map(|d| d.as_str()).join(" / ")
                ),
            };
            out.push_str(&format!("  \"{}\": {},\n", field.name, shape));
        }
        out.push_str("}\n\n");

        out.push_str("## Rules\n\n");
        for rule in &self.rules {
            out.push_str(&format!("- {}\n", rule));
        }

        out.push_str("\n## Example answer\n\n");
        out.push_str(&serde_json::to_string_pretty(&self.example()).unwrap_or_default());
        out.push_str("\n\n");

        out.push_str(&profile.to_markdown());
        out
    }

    /// Message sent back to the model when its answer was rejected
    pub fn retry_prompt(&self, violations: &[ArtifactViolation]) -> String {
        let mut out = String::from("Your answer was rejected:\n");
        for v in violations {
            out.push_str(&format!("- {}\n", v));
        }
        out.push_str("\nFix these problems and answer again with only the JSON object.");
        out
    }
}
