//! Generator implementation - drives the model <-> executor loop

use crate::tools::{run_code_definition, ToolRequest};
use gamesmith_runtime::error;
use gamesmith_runtime::{
    ArtifactViolation, ChatMessage, CompletionRequest, Console, Error, Executor, GameArtifact,
    GameSchema, Interpreter, LearnerProfile, LlmProvider, Result, ToolCall, UsageTracker,
};

/// Configuration for the generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model override; the provider's default when unset
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// Answers the model may give before the request fails
    pub max_attempts: usize,
    /// Tool-call rounds allowed within one attempt
    pub max_tool_rounds: usize,
    /// Only accept code that was actually run through the executor
    pub require_execution: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: None,
            max_attempts: 3,
            max_tool_rounds: 8,
            require_execution: true,
        }
    }
}

/// The last program run through `run_code` during a generation
#[derive(Debug, Clone)]
struct ExecutedRun {
    source: String,
    transcript: String,
}

/// How one attempt ended, short of a backend failure
#[derive(Debug)]
enum Attempt {
    Accepted(GameArtifact),
    Rejected {
        content: String,
        violations: Vec<ArtifactViolation>,
    },
}

/// The generator - asks the model for a game and lets it play the game
/// through the executor while it works
pub struct Generator<P, I, C> {
    provider: P,
    executor: Executor<I, C>,
    schema: GameSchema,
    config: GeneratorConfig,
    usage: UsageTracker,
    last_run: Option<ExecutedRun>,
}

impl<P, I, C> Generator<P, I, C>
where
    P: LlmProvider,
    I: Interpreter,
    C: Console,
{
    pub fn new(provider: P, executor: Executor<I, C>) -> Self {
        Self::with_config(provider, executor, GeneratorConfig::default())
    }

    pub fn with_config(provider: P, executor: Executor<I, C>, config: GeneratorConfig) -> Self {
        Self {
            provider,
            executor,
            schema: GameSchema::new(),
            config,
            usage: UsageTracker::new(),
            last_run: None,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn executor(&self) -> &Executor<I, C> {
        &self.executor
    }

    /// Token usage across every call made so far
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Generate one game for `profile`
    pub async fn generate(
        &mut self,
        request: &str,
        profile: &LearnerProfile,
    ) -> Result<GameArtifact> {
        if request.trim().is_empty() {
            return Err(error::empty_request());
        }
        self.last_run = None;

        let mut messages = vec![
            ChatMessage::system(self.schema.system_prompt(profile)),
            ChatMessage::user(request),
        ];
        let mut violations = Vec::new();

        for attempt in 1..=self.config.max_attempts {
            tracing::info!(attempt, max = self.config.max_attempts, "requesting game");

            match self.attempt(&mut messages).await? {
                Attempt::Accepted(artifact) => {
                    tracing::info!(
                        attempt,
                        difficulty = %artifact.difficulty(),
                        tokens = self.usage.total_tokens(),
                        "game accepted"
                    );
                    return Ok(artifact);
                }
                Attempt::Rejected {
                    content,
                    violations: rejected,
                } => {
                    for v in &rejected {
                        tracing::warn!(attempt, violation = %v, "answer rejected");
                    }
                    messages.push(ChatMessage::assistant(content));
                    messages.push(ChatMessage::user(self.schema.retry_prompt(&rejected)));
                    violations = rejected;
                }
            }
        }

        let summary = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::malformed_artifact(format!(
            "no valid game after {} attempts",
            self.config.max_attempts
        ))
        .with_operation("generator::generate")
        .with_context("violations", summary))
    }

    /// One answer from the model, serving its tool calls on the way
    async fn attempt(&mut self, messages: &mut Vec<ChatMessage>) -> Result<Attempt> {
        let max_rounds = self.config.max_tool_rounds;

        for round in 0..=max_rounds {
            let response = self.provider.complete(self.request(messages)).await?;
            self.usage.track(&response.usage);

            if response.tool_calls.is_empty() {
                let content = response.content.unwrap_or_default();
                tracing::debug!(
                    provider = self.provider.name(),
                    model = %response.model,
                    chars = content.len(),
                    "final answer received"
                );
                return Ok(self.validate(content));
            }

            if round == max_rounds {
                return Ok(Attempt::Rejected {
                    content: response.content.unwrap_or_default(),
                    violations: vec![ArtifactViolation::TooManyToolRounds(max_rounds)],
                });
            }

            messages.push(ChatMessage::assistant_tool_calls(
                response.content,
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let result = self.dispatch(call);
                messages.push(ChatMessage::tool_result(&call.id, result));
            }
        }

        // max_rounds + 1 iterations always return above
        Err(Error::unexpected("tool loop ended without an answer"))
    }

    fn request(&self, messages: &[ChatMessage]) -> CompletionRequest {
        let model = self
            .config
            .model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model());

        let mut request = CompletionRequest::new(messages.to_vec())
            .with_model(model)
            .with_tools(vec![run_code_definition()])
            .with_response_format(self.schema.response_format());
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }

    /// Serve one tool call; its result is always a message for the model
    fn dispatch(&mut self, call: &ToolCall) -> String {
        match ToolRequest::from_call(call) {
            ToolRequest::RunCode(args) => {
                tracing::debug!(call = %call.id, bytes = args.code.len(), "running code");
                // Blocks this task until the game ends; the player is at the console.
                let transcript = self.executor.execute(&args.code);
                self.last_run = Some(ExecutedRun {
                    source: args.code,
                    transcript: transcript.clone(),
                });
                transcript
            }
            ToolRequest::Rejected(message) => {
                tracing::warn!(call = %call.id, tool = %call.name, "tool call rejected");
                message
            }
        }
    }

    fn validate(&self, content: String) -> Attempt {
        let artifact = match GameArtifact::parse(&content) {
            Ok(artifact) => artifact,
            Err(violations) => return Attempt::Rejected { content, violations },
        };

        let run = self
            .last_run
            .as_ref()
            .filter(|run| run.source.trim() == artifact.code().trim());

        match run {
            Some(run) => Attempt::Accepted(artifact.with_transcript(run.transcript.clone())),
            None if !self.config.require_execution => Attempt::Accepted(artifact),
            None => {
                let violation = if self.last_run.is_some() {
                    ArtifactViolation::CodeMismatch
                } else {
                    ArtifactViolation::NotExecuted
                };
                Attempt::Rejected {
                    content,
                    violations: vec![violation],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamesmith_runtime::{
        CompletionResponse, ErrorKind, GameIo, ProviderError, Role, ScriptedConsole, Usage,
        EXAMPLE_GUESSING_GAME, GAME_COMPLETED, GAME_STARTING, RUN_CODE_TOOL,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every request it was sent
    struct MockProvider {
        responses: Mutex<VecDeque<std::result::Result<CompletionResponse, ProviderError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockProvider {
        fn new(
            responses: impl IntoIterator<Item = std::result::Result<CompletionResponse, ProviderError>>,
        ) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn default_model(&self) -> &str {
            "mock-model"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Other("script exhausted".into())))
        }
    }

    /// Stands in for python: prints a fixed line for any source
    struct Played;

    impl Interpreter for Played {
        fn name(&self) -> &str {
            "played"
        }

        fn run(&self, _source: &str, io: &mut dyn GameIo) -> Result<()> {
            io.print("played\n")?;
            Ok(())
        }
    }

    type TestGenerator = Generator<MockProvider, Played, ScriptedConsole>;

    fn generator(
        responses: Vec<std::result::Result<CompletionResponse, ProviderError>>,
    ) -> TestGenerator {
        let executor = Executor::new(Played, ScriptedConsole::default());
        Generator::new(MockProvider::new(responses), executor)
    }

    fn generator_with(
        responses: Vec<std::result::Result<CompletionResponse, ProviderError>>,
        config: GeneratorConfig,
    ) -> TestGenerator {
        let executor = Executor::new(Played, ScriptedConsole::default());
        Generator::with_config(MockProvider::new(responses), executor, config)
    }

    fn response(content: Option<String>, tool_calls: Vec<ToolCall>) -> CompletionResponse {
        CompletionResponse {
            model: "mock-model".into(),
            content,
            tool_calls,
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        }
    }

    fn call(name: &str, arguments: String) -> ToolCall {
        ToolCall {
            id: format!("call_{}", name),
            name: name.into(),
            arguments,
        }
    }

    fn run_code(code: &str) -> std::result::Result<CompletionResponse, ProviderError> {
        let arguments = serde_json::json!({ "code": code }).to_string();
        Ok(response(None, vec![call(RUN_CODE_TOOL, arguments)]))
    }

    fn answer(content: impl Into<String>) -> std::result::Result<CompletionResponse, ProviderError> {
        Ok(response(Some(content.into()), Vec::new()))
    }

    fn valid_answer() -> std::result::Result<CompletionResponse, ProviderError> {
        answer(GameSchema::new().example().to_string())
    }

    fn played_transcript() -> String {
        format!("{}played\n{}", GAME_STARTING, GAME_COMPLETED)
    }

    #[tokio::test]
    async fn test_generates_after_running_code() {
        let mut agent = generator(vec![run_code(EXAMPLE_GUESSING_GAME), valid_answer()]);
        let artifact = agent
            .generate("make me a game", &LearnerProfile::default())
            .await
            .unwrap();

        assert_eq!(artifact.code(), EXAMPLE_GUESSING_GAME);
        assert_eq!(artifact.transcript(), played_transcript());
        assert_eq!(agent.executor().runs(), 1);
        assert_eq!(agent.usage().total_calls, 2);

        let requests = agent.provider().requests();
        assert_eq!(requests.len(), 2);

        let first = &requests[0];
        assert_eq!(first.model.as_deref(), Some("mock-model"));
        assert_eq!(first.messages[0].role, Role::System);
        assert!(first.messages[0]
            .content
            .as_deref()
            .unwrap()
            .contains("John Doe"));
        assert_eq!(first.messages[1].content.as_deref(), Some("make me a game"));
        assert_eq!(first.tools.as_ref().unwrap()[0].name, RUN_CODE_TOOL);
        assert_eq!(first.response_format.as_ref().unwrap().name, "game_result");

        let tool_result = requests[1].messages.last().unwrap();
        assert_eq!(tool_result.role, Role::Tool);
        assert_eq!(tool_result.content.as_deref(), Some(played_transcript().as_str()));
    }

    #[tokio::test]
    async fn test_retries_after_invalid_answer() {
        let mut incomplete = GameSchema::new().example();
        incomplete.as_object_mut().unwrap().remove("walkthrough");

        let mut agent = generator(vec![
            run_code(EXAMPLE_GUESSING_GAME),
            answer(incomplete.to_string()),
            valid_answer(),
        ]);
        let artifact = agent
            .generate("make me a game", &LearnerProfile::default())
            .await
            .unwrap();
        assert!(!artifact.walkthrough().is_empty());

        let requests = agent.provider().requests();
        assert_eq!(requests.len(), 3);
        let retry = requests[2].messages.last().unwrap();
        assert_eq!(retry.role, Role::User);
        let retry = retry.content.as_deref().unwrap();
        assert!(retry.starts_with("Your answer was rejected"));
        assert!(retry.contains("walkthrough"));
    }

    #[tokio::test]
    async fn test_three_failures_are_malformed() {
        let mut agent = generator(vec![
            answer("not json"),
            answer("still not json"),
            answer("{}"),
            valid_answer(),
        ]);
        let err = agent
            .generate("make me a game", &LearnerProfile::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedArtifact);
        assert!(err.context_value("violations").unwrap().contains("missing"));
        assert_eq!(agent.provider().requests().len(), 3);
    }

    #[tokio::test]
    async fn test_backend_failure_is_unavailable() {
        let mut agent = generator(vec![
            Err(ProviderError::Network("connection refused".into())),
            valid_answer(),
        ]);
        let err = agent
            .generate("make me a game", &LearnerProfile::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::GenerationUnavailable);
        assert_eq!(agent.provider().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_request_never_calls_backend() {
        let mut agent = generator(vec![valid_answer()]);
        let err = agent
            .generate("  \n", &LearnerProfile::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(agent.provider().requests().is_empty());
    }

    #[tokio::test]
    async fn test_answer_without_run_is_rejected() {
        let mut agent = generator(vec![
            valid_answer(),
            run_code(EXAMPLE_GUESSING_GAME),
            valid_answer(),
        ]);
        let artifact = agent
            .generate("make me a game", &LearnerProfile::default())
            .await
            .unwrap();
        assert_eq!(artifact.transcript(), played_transcript());

        let requests = agent.provider().requests();
        assert_eq!(requests.len(), 3);
        let retry = requests[1].messages.last().unwrap().content.clone().unwrap();
        assert!(retry.contains("the code was never run"));
    }

    #[tokio::test]
    async fn test_answer_with_other_code_is_rejected() {
        let mut agent = generator(vec![
            run_code("print('a different game')"),
            valid_answer(),
            run_code(EXAMPLE_GUESSING_GAME),
            valid_answer(),
        ]);
        let artifact = agent
            .generate("make me a game", &LearnerProfile::default())
            .await
            .unwrap();
        assert_eq!(artifact.code(), EXAMPLE_GUESSING_GAME);
        assert_eq!(agent.executor().runs(), 2);

        let retry = agent.provider().requests()[2]
            .messages
            .last()
            .unwrap()
            .content
            .clone()
            .unwrap();
        assert!(retry.contains("not the code last run"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_tolerated() {
        let mut agent = generator(vec![
            Ok(response(
                None,
                vec![
                    call("search", "{}".into()),
                    call(RUN_CODE_TOOL, "not json".into()),
                ],
            )),
            run_code(EXAMPLE_GUESSING_GAME),
            valid_answer(),
        ]);
        agent.generate("make me a game", &LearnerProfile::default())
            .await
            .unwrap();

        let requests = agent.provider().requests();
        let results: Vec<&str> = requests[1]
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.content.as_deref())
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].starts_with("error: unknown tool `search`"));
        assert!(results[1].starts_with("error: invalid arguments"));
    }

    #[tokio::test]
    async fn test_tool_rounds_are_bounded() {
        let config = GeneratorConfig {
            max_attempts: 1,
            max_tool_rounds: 1,
            ..GeneratorConfig::default()
        };
        let mut agent = generator_with(
            vec![run_code("print(1)"), run_code("print(2)"), valid_answer()],
            config,
        );
        let err = agent
            .generate("make me a game", &LearnerProfile::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedArtifact);
        assert!(err
            .context_value("violations")
            .unwrap()
            .contains("no answer after 1 tool calls"));
        assert_eq!(agent.executor().runs(), 1);
    }

    #[tokio::test]
    async fn test_execution_can_be_optional() {
        let config = GeneratorConfig {
            require_execution: false,
            model: Some("gpt-test".into()),
            temperature: Some(0.2),
            ..GeneratorConfig::default()
        };
        let mut agent = generator_with(vec![valid_answer()], config);
        let artifact = agent
            .generate("make me a game", &LearnerProfile::default())
            .await
            .unwrap();

        assert!(artifact.transcript().contains("Congratulations"));
        assert_eq!(agent.executor().runs(), 0);

        let request = &agent.provider().requests()[0];
        assert_eq!(request.model.as_deref(), Some("gpt-test"));
        assert_eq!(request.temperature, Some(0.2));
    }
}
