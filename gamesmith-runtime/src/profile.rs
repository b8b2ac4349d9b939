//! Learner profile passed as context to every generation call

use crate::error::{self, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Highest value on the experience scale
pub const MAX_EXPERIENCE: u8 = 5;

/// Who the game is being generated for. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    #[serde(rename = "userId")]
    id: u64,
    #[serde(rename = "userName")]
    name: String,
    /// 0 (never programmed) to 5 (expert)
    #[serde(rename = "userExperience")]
    experience: u8,
    #[serde(rename = "userSkillset")]
    skills: Vec<String>,
}

impl LearnerProfile {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        experience: u8,
        skills: Vec<String>,
    ) -> Result<Self> {
        let profile = Self {
            id,
            name: name.into(),
            experience,
            skills,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::from(e)
                .with_operation("profile::load")
                .with_context("path", path.display().to_string())
        })?;

        let profile: Self = serde_json::from_str(&content).map_err(|e| {
            Error::config_invalid(format!("invalid learner profile: {}", e))
                .with_operation("profile::load")
                .with_context("path", path.display().to_string())
                .set_source(e)
        })?;
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(error::invalid_profile("userName", "learner name must not be empty"));
        }
        if self.experience > MAX_EXPERIENCE {
            return Err(error::invalid_profile(
                "userExperience",
                format!(
                    "experience {} is outside 0..={}",
                    self.experience, MAX_EXPERIENCE
                ),
            ));
        }
        if self.skills.iter().any(|s| s.trim().is_empty()) {
            return Err(error::invalid_profile("userSkillset", "skills must not be blank"));
        }
        Ok(())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn experience(&self) -> u8 {
        self.experience
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Render as a markdown block for the system instructions
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("## Learner\n\n");
        out.push_str(&format!("- **userId**: {}\n", self.id));
        out.push_str(&format!("- **userName**: {}\n", self.name));
        out.push_str(&format!(
            "- **userExperience**: {} (scale 0-{})\n",
            self.experience, MAX_EXPERIENCE
        ));
        if self.skills.is_empty() {
            out.push_str("- **userSkillset**: none yet\n");
        } else {
            out.push_str(&format!("- **userSkillset**: {}\n", self.skills.join(", ")));
        }
        out
    }
}

impl Default for LearnerProfile {
    fn default() -> Self {
        Self {
            id: 1,
            name: "John Doe".into(),
            experience: 0,
            skills: vec!["Python".into(), "Data Structures".into()],
        }
    }
}
