//! Settings for one CLI run: environment first, flags on top

use crate::Cli;
use gamesmith_agent::GeneratorConfig;
use gamesmith_runtime::ProviderConfig;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PYTHON: &str = "python3";

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub python: String,
    pub temperature: Option<f32>,
    pub profile: Option<PathBuf>,
    pub require_execution: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            python: DEFAULT_PYTHON.to_string(),
            temperature: None,
            profile: None,
            require_execution: true,
        }
    }
}

impl CliConfig {
    /// Read the process environment (after `.env` has been loaded)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_key: var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: var("OPENAI_BASE_URL"),
            model: var("GAMESMITH_MODEL").unwrap_or(defaults.model),
            python: var("GAMESMITH_PYTHON").unwrap_or(defaults.python),
            ..defaults
        }
    }

    /// Flags override whatever the environment said
    pub fn merge(mut self, cli: &Cli) -> Self {
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if let Some(base_url) = &cli.base_url {
            self.base_url = Some(base_url.clone());
        }
        if let Some(python) = &cli.python {
            self.python = python.clone();
        }
        if cli.temperature.is_some() {
            self.temperature = cli.temperature;
        }
        if cli.profile.is_some() {
            self.profile = cli.profile.clone();
        }
        if cli.no_require_execution {
            self.require_execution = false;
        }
        self
    }

    pub fn provider(&self) -> ProviderConfig {
        let config = ProviderConfig::openai(&self.api_key).with_model(&self.model);
        match &self.base_url {
            Some(url) => config.with_base_url(url),
            None => config,
        }
    }

    pub fn generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            model: Some(self.model.clone()),
            temperature: self.temperature,
            require_execution: self.require_execution,
            ..GeneratorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = CliConfig::from_lookup(lookup(&[]));
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.api_key, "");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.python, "python3");
        assert!(config.require_execution);
    }

    #[test]
    fn test_environment_is_read() {
        let config = CliConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:11434/v1"),
            ("GAMESMITH_MODEL", "llama3"),
            ("GAMESMITH_PYTHON", "/usr/bin/python3.12"),
        ]));
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(config.model, "llama3");
        assert_eq!(config.python, "/usr/bin/python3.12");
    }

    #[test]
    fn test_blank_variables_are_unset() {
        let config = CliConfig::from_lookup(lookup(&[("GAMESMITH_MODEL", "  ")]));
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::parse_from([
            "gamesmith",
            "--model",
            "gpt-4o",
            "--python",
            "python3.11",
            "--temperature",
            "0.5",
            "--no-require-execution",
        ]);
        let config = CliConfig::from_lookup(lookup(&[("GAMESMITH_MODEL", "llama3")])).merge(&cli);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.python, "python3.11");
        assert_eq!(config.temperature, Some(0.5));
        assert!(!config.require_execution);
    }

    #[test]
    fn test_provider_and_generator_settings() {
        let config = CliConfig {
            api_key: "sk-test".into(),
            base_url: Some("http://localhost:8000/v1".into()),
            model: "gpt-4o".into(),
            ..CliConfig::default()
        };

        let provider = config.provider();
        assert_eq!(provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(provider.base_url.as_deref(), Some("http://localhost:8000/v1"));
        assert_eq!(provider.default_model.as_deref(), Some("gpt-4o"));

        let generator = config.generator();
        assert_eq!(generator.model.as_deref(), Some("gpt-4o"));
        assert_eq!(generator.max_attempts, 3);
        assert!(generator.require_execution);
    }
}
