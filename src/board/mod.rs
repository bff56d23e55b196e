//! Host platform capabilities.
//!
//! The workflow engine never talks to Trello directly. It consumes the traits
//! below, which keeps every operation runnable against the REST client, the
//! local plugin-data database, or the in-memory board used by tests.
//!
//! - [`PluginStorage`]: per-board key/value data in a shared or private scope
//! - [`BoardApi`]: custom fields, cards, lists, boards and the acting member
//! - [`Prompter`] and [`Clipboard`]: user-facing collaborators

mod client;
mod memory;
mod ui;

pub use client::{TrelloClient, TrelloConfig, DEFAULT_TRELLO_URL};
pub use memory::{FailPoint, MemoryBoard};
pub use ui::{NoClipboard, PresetAnswer, SystemClipboard, TerminalPrompter};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::*;

/// Errors raised by host adapters.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: check the Trello key and token")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// Visibility of plugin data on a board.
///
/// `Shared` data is visible to every member of the board; `Private` data is
/// per member. Sprint counters live in the shared scope unless configured
/// otherwise.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    Shared,
    Private,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Private => "private",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "shared" => Some(Self::Shared),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// Per-board key/value storage.
#[async_trait]
pub trait PluginStorage: Send + Sync {
    /// Read one key. `Ok(None)` when the key has never been written.
    async fn get(&self, workspace_id: &str, scope: Scope, key: &str)
        -> Result<Option<Value>, HostError>;

    /// Write every entry in one call. Either all entries are stored or none.
    async fn set(
        &self,
        workspace_id: &str,
        scope: Scope,
        entries: &Map<String, Value>,
    ) -> Result<(), HostError>;
}

/// Read and write access to board metadata.
#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn attribute_definitions(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<AttributeDefinition>, HostError>;

    /// Fetch a card including its members and custom field values.
    async fn card(&self, card_id: &str) -> Result<Card, HostError>;

    /// Open lists of a board in the host's listing order.
    async fn collections(&self, workspace_id: &str) -> Result<Vec<Collection>, HostError>;

    /// Boards visible to the acting member.
    async fn workspaces(&self) -> Result<Vec<Workspace>, HostError>;

    async fn current_member(&self) -> Result<Member, HostError>;

    async fn write_attribute(
        &self,
        card_id: &str,
        definition_id: &str,
        payload: &AttributePayload,
    ) -> Result<(), HostError>;

    /// Remove a card's value for a field, whatever the field's kind.
    async fn clear_attribute(&self, card_id: &str, definition_id: &str) -> Result<(), HostError>;

    /// Move a card to the top of a list, possibly on another board.
    async fn move_card(&self, card_id: &str, target: &CardMove) -> Result<(), HostError>;

    async fn add_member(&self, card_id: &str, member_id: &str) -> Result<(), HostError>;

    async fn attach(&self, card_id: &str, attachment: &Attachment) -> Result<(), HostError>;
}

/// How prominently an alert should be shown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Severity an outcome should be reported with.
    pub fn for_outcome(outcome: &TransitionOutcome) -> Self {
        if !outcome.succeeded {
            Self::Error
        } else if outcome.warnings.is_empty() {
            Self::Info
        } else {
            Self::Warning
        }
    }
}

/// User-facing dialogs. Only `confirm` feeds back into an operation.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn alert(&self, message: &str, severity: Severity, duration: Duration);

    async fn confirm(&self, message: &str) -> bool;

    async fn popup(&self, title: &str, url: &str, args: &Value);
}

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn copy(&self, text: &str) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_names_round_trip() {
        assert_eq!(Scope::from_str("shared"), Some(Scope::Shared));
        assert_eq!(Scope::from_str(Scope::Private.as_str()), Some(Scope::Private));
        assert_eq!(Scope::from_str("board"), None);
        assert_eq!(Scope::default(), Scope::Shared);
    }

    #[test]
    fn severity_follows_outcome() {
        let ok = TransitionOutcome::success("ok");
        assert_eq!(Severity::for_outcome(&ok), Severity::Info);

        let warned = TransitionOutcome::success("ok").with_warnings(vec!["no clipboard".into()]);
        assert_eq!(Severity::for_outcome(&warned), Severity::Warning);

        let failed = TransitionOutcome::failure("Start failed");
        assert_eq!(Severity::for_outcome(&failed), Severity::Error);
    }
}
