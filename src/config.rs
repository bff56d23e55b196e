//! Runtime configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SPRINT_TRACKER_TRELLO_URL` | `https://api.trello.com/1` |
//! | `SPRINT_TRACKER_TRELLO_KEY`, `SPRINT_TRACKER_TRELLO_TOKEN` | none |
//! | `SPRINT_TRACKER_TIMEOUT_SECS` | `30` |
//! | `SPRINT_TRACKER_DB` | platform data dir |
//! | `SPRINT_TRACKER_SCOPE` | `shared` |
//! | `SPRINT_TRACKER_IN_PROGRESS_LIST` | `in progress` |
//! | `SPRINT_TRACKER_REVIEW_LIST` | `code review` |
//! | `SPRINT_TRACKER_DONE_BOARD` | `dev done` |
//! | `SPRINT_TRACKER_DONE_LIST` | `ready` |
//! | `SPRINT_TRACKER_DEFERRED_LIST` | `awaiting epic completion` |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::board::{Scope, TrelloConfig, DEFAULT_TRELLO_URL};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid storage scope '{0}': expected 'shared' or 'private'")]
    InvalidScope(String),

    #[error("Invalid timeout '{0}': expected whole seconds")]
    InvalidTimeout(String),

    #[error("Trello credentials missing: set SPRINT_TRACKER_TRELLO_KEY and SPRINT_TRACKER_TRELLO_TOKEN")]
    MissingCredentials,
}

/// A custom field the workflow writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    StartDate,
    EndDate,
    Branch,
    Sprint,
    Blocker,
    Estimate,
}

/// Names the workflow looks for on the board.
///
/// List and board names are case-insensitive substrings; field names are
/// matched exactly first, then case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowNames {
    pub in_progress_list: String,
    pub review_list: String,
    pub done_board: String,
    pub done_list: String,
    pub deferred_list: String,
    pub start_date_field: String,
    pub end_date_field: String,
    pub branch_field: String,
    pub sprint_field: String,
    pub blocker_field: String,
    pub estimate_field: String,
}

impl Default for WorkflowNames {
    fn default() -> Self {
        Self {
            in_progress_list: "in progress".to_string(),
            review_list: "code review".to_string(),
            done_board: "dev done".to_string(),
            done_list: "ready".to_string(),
            deferred_list: "awaiting epic completion".to_string(),
            start_date_field: "Start Date".to_string(),
            end_date_field: "End Date".to_string(),
            branch_field: "Branch".to_string(),
            sprint_field: "Sprint".to_string(),
            blocker_field: "Blocker".to_string(),
            estimate_field: "estimate".to_string(),
        }
    }
}

impl WorkflowNames {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            in_progress_list: env_or("SPRINT_TRACKER_IN_PROGRESS_LIST", defaults.in_progress_list),
            review_list: env_or("SPRINT_TRACKER_REVIEW_LIST", defaults.review_list),
            done_board: env_or("SPRINT_TRACKER_DONE_BOARD", defaults.done_board),
            done_list: env_or("SPRINT_TRACKER_DONE_LIST", defaults.done_list),
            deferred_list: env_or("SPRINT_TRACKER_DEFERRED_LIST", defaults.deferred_list),
            ..defaults
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::StartDate => &self.start_date_field,
            Field::EndDate => &self.end_date_field,
            Field::Branch => &self.branch_field,
            Field::Sprint => &self.sprint_field,
            Field::Blocker => &self.blocker_field,
            Field::Estimate => &self.estimate_field,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub trello_url: String,
    pub trello_key: Option<String>,
    pub trello_token: Option<String>,
    pub timeout: Duration,
    /// Plugin-data database. `None` uses the platform data directory.
    pub database_path: Option<PathBuf>,
    pub scope: Scope,
    pub workflow: WorkflowNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trello_url: DEFAULT_TRELLO_URL.to_string(),
            trello_key: None,
            trello_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            database_path: None,
            scope: Scope::Shared,
            workflow: WorkflowNames::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let scope = match std::env::var("SPRINT_TRACKER_SCOPE") {
            Ok(raw) => parse_scope(&raw)?,
            Err(_) => Scope::Shared,
        };
        let timeout = match std::env::var("SPRINT_TRACKER_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            trello_url: env_or("SPRINT_TRACKER_TRELLO_URL", DEFAULT_TRELLO_URL.to_string()),
            trello_key: std::env::var("SPRINT_TRACKER_TRELLO_KEY").ok(),
            trello_token: std::env::var("SPRINT_TRACKER_TRELLO_TOKEN").ok(),
            timeout,
            database_path: std::env::var("SPRINT_TRACKER_DB").ok().map(PathBuf::from),
            scope,
            workflow: WorkflowNames::from_env(),
        })
    }

    /// Connection settings for the REST client. Fails without credentials.
    pub fn trello(&self) -> Result<TrelloConfig, ConfigError> {
        match (&self.trello_key, &self.trello_token) {
            (Some(key), Some(token)) if !key.is_empty() && !token.is_empty() => Ok(TrelloConfig {
                base_url: self.trello_url.clone(),
                api_key: key.clone(),
                token: token.clone(),
                timeout: self.timeout,
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

pub fn parse_scope(raw: &str) -> Result<Scope, ConfigError> {
    Scope::from_str(&raw.trim().to_ascii_lowercase())
        .ok_or_else(|| ConfigError::InvalidScope(raw.to_string()))
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidTimeout(raw.to_string()))
}
