//! Identifiers: job keys, store uids and agent names.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// `(namespace, name)` pair that identifies a job in the store.
///
/// Ordering is namespace first, then name, so a `BTreeMap<JobKey, _>` keeps
/// each namespace contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    pub namespace: String,
    pub name: String,
}

impl JobKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Store-assigned unique id of a job object.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobUid(Ulid);

impl JobUid {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for JobUid {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Ulid> for JobUid {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl fmt::Display for JobUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Name of an agent in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentName(String);

impl AgentName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AgentName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_key_displays_as_namespace_slash_name() {
        let key = JobKey::new("batch", "build");
        assert_eq!(key.to_string(), "batch/build");
    }

    #[test]
    fn job_keys_sort_by_namespace_first() {
        let mut keys = vec![
            JobKey::new("b", "a"),
            JobKey::new("a", "z"),
            JobKey::new("a", "b"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                JobKey::new("a", "b"),
                JobKey::new("a", "z"),
                JobKey::new("b", "a"),
            ]
        );
    }

    #[test]
    fn uids_are_unique_and_prefixed() {
        let a = JobUid::new();
        let b = JobUid::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("job-"));
    }

    #[test]
    fn agent_name_serializes_as_plain_string() {
        let name = AgentName::from("agent1");
        let s = serde_json::to_string(&name).unwrap();
        assert_eq!(s, "\"agent1\"");
    }
}
