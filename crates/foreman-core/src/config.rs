//! Runtime configuration, loaded from TOML. Every field has a default.

use std::collections::HashSet;
use std::fs;
use std::ops::Range;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::{MissingDependencyPolicy, RequeuePolicy, RetryPolicy};
use crate::domain::{AgentName, ConfigError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForemanConfig {
    /// Agent pool. Order is irrelevant to placement but kept for display.
    pub agents: Vec<String>,

    /// Pause between two worker cycles.
    pub poll_interval_ms: u64,

    pub execution: ExecutionConfig,

    /// Seed for placement and simulated execution. Random when unset.
    pub seed: Option<u64>,

    pub missing_dependency: MissingDependencyPolicy,
    pub retry: RetryPolicy,

    /// Upper bound for any single store call.
    pub store_timeout_ms: u64,

    pub requeue: RequeuePolicy,
}

/// Simulated execution parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,

    /// Results are drawn from `0..result_bound`.
    pub result_bound: i32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 5,
            max_delay_ms: 30,
            result_bound: 100,
        }
    }
}

impl ExecutionConfig {
    pub fn delay_range(&self) -> Range<u64> {
        self.min_delay_ms..self.max_delay_ms
    }
}

impl Default for ForemanConfig {
    fn default() -> Self {
        Self {
            agents: vec!["agent1".into(), "agent2".into(), "agent3".into()],
            poll_interval_ms: 5_000,
            execution: ExecutionConfig::default(),
            seed: None,
            missing_dependency: MissingDependencyPolicy::default(),
            retry: RetryPolicy::default(),
            store_timeout_ms: 2_000,
            requeue: RequeuePolicy::default(),
        }
    }
}

impl ForemanConfig {
    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading config");
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents.is_empty() {
            return Err(ConfigError::Invalid("agent pool is empty".into()));
        }
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.trim().is_empty() {
                return Err(ConfigError::Invalid("agent name is empty".into()));
            }
            if !seen.insert(agent.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate agent {agent}")));
            }
        }
        if self.execution.result_bound <= 0 {
            return Err(ConfigError::Invalid(
                "execution.result_bound must be positive".into(),
            ));
        }
        if self.execution.min_delay_ms > self.execution.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "execution.min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.execution.min_delay_ms, self.execution.max_delay_ms
            )));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::Invalid("store_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn agent_names(&self) -> Vec<AgentName> {
        self.agents.iter().map(AgentName::new).collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_documented_values() {
        let config = ForemanConfig::default();
        assert_eq!(config.agents, vec!["agent1", "agent2", "agent3"]);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.execution.delay_range(), 5..30);
        assert_eq!(config.execution.result_bound, 100);
        assert_eq!(config.missing_dependency, MissingDependencyPolicy::Ignore);
        assert_eq!(config.retry, RetryPolicy::Unbounded);
        assert!(config.seed.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(ForemanConfig::from_toml_str("").unwrap(), ForemanConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = ForemanConfig::from_toml_str(
            r#"
            agents = ["east", "west"]
            poll_interval_ms = 250
            seed = 7
            missing_dependency = "block"
            retry = "backoff_limit"

            [execution]
            result_bound = 10

            [requeue]
            base_delay_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.agent_names(), vec![AgentName::from("east"), AgentName::from("west")]);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.missing_dependency, MissingDependencyPolicy::Block);
        assert_eq!(config.retry, RetryPolicy::BackoffLimit);
        assert_eq!(config.execution.result_bound, 10);
        assert_eq!(config.execution.max_delay_ms, 30);
        assert_eq!(config.requeue.base_delay_ms, 50);
        assert_eq!(config.requeue.max_delay_ms, 60_000);
    }

    #[rstest]
    #[case::no_agents("agents = []")]
    #[case::blank_agent(r#"agents = ["a", " "]"#)]
    #[case::duplicate_agent(r#"agents = ["a", "b", "a"]"#)]
    #[case::zero_bound("[execution]\nresult_bound = 0")]
    #[case::inverted_delay("[execution]\nmin_delay_ms = 50\nmax_delay_ms = 10")]
    #[case::zero_timeout("store_timeout_ms = 0")]
    fn invalid_documents_are_rejected(#[case] doc: &str) {
        let err = ForemanConfig::from_toml_str(doc).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let err = ForemanConfig::from_toml_str(r#"retry = "forever""#).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ForemanConfig::load("/nonexistent/foreman.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
