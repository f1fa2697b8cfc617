//! Domain-specific newtypes for type safety and validation.

use crate::constants::{
    ALL_WORKSPACES, MAX_PARALLEL_WORKERS, MAX_WORKSPACE_NAMES, MIN_PARALLEL_WORKERS,
};
use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static SCHEMA_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_]+$")
        .expect("Failed to compile schema name regex - this is a bug in the code")
});

/// Destination schema identifier (alphanumeric and underscore only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaName(String);

impl SchemaName {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptySchemaName);
        }
        if !SCHEMA_NAME_PATTERN.is_match(&name) {
            return Err(ConfigError::InvalidSchemaName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Size of the bounded worker pool used by every fan-out stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCount(usize);

impl WorkerCount {
    pub fn new(count: usize) -> Result<Self, ConfigError> {
        if !(MIN_PARALLEL_WORKERS..=MAX_PARALLEL_WORKERS).contains(&count) {
            return Err(ConfigError::WorkerCountOutOfRange {
                actual: count,
                min: MIN_PARALLEL_WORKERS,
                max: MAX_PARALLEL_WORKERS,
            });
        }
        Ok(Self(count))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which workspaces a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceFilter {
    /// Every workspace the caller can see.
    All,
    /// Exact, case-sensitive workspace names.
    Named(Vec<String>),
}

impl WorkspaceFilter {
    /// Validates a raw workspace list. A single `All` entry (any case) is the sentinel.
    pub fn from_names(names: Vec<String>) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Err(ConfigError::EmptyWorkspaceFilter);
        }
        if names.len() > MAX_WORKSPACE_NAMES {
            return Err(ConfigError::TooManyWorkspaces {
                actual: names.len(),
                max: MAX_WORKSPACE_NAMES,
            });
        }
        if names.len() == 1 && names[0].eq_ignore_ascii_case(ALL_WORKSPACES) {
            return Ok(Self::All);
        }
        Ok(Self::Named(names))
    }

    pub fn admits(&self, workspace_name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(names) => names.iter().any(|n| n == workspace_name),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for WorkspaceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All (scanning all accessible workspaces)"),
            Self::Named(names) => write!(f, "{}", names.join(", ")),
        }
    }
}

/// Bearer token for the Power BI and Fabric APIs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Missing("access token is empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact token in debug output
        write!(f, "AccessToken(***)")
    }
}
