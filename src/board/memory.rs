//! In-memory board for tests and offline demos.
//!
//! Implements both [`BoardApi`] and [`PluginStorage`] over one shared state.
//! Individual operations can be made to fail with [`MemoryBoard::fail`] to
//! exercise partial-failure paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{BoardApi, HostError, PluginStorage, Scope};
use crate::models::*;

/// An operation [`MemoryBoard`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    StorageRead,
    StorageWrite,
    Definitions,
    CardRead,
    Collections,
    Workspaces,
    CurrentMember,
    AttributeWrite,
    Move,
    AddMember,
    Attach,
}

#[derive(Default)]
struct MemoryState {
    member: Option<Member>,
    workspaces: Vec<Workspace>,
    collections: Vec<Collection>,
    definitions: HashMap<String, Vec<AttributeDefinition>>,
    cards: HashMap<String, Card>,
    attachments: HashMap<String, Vec<Attachment>>,
    plugin_data: HashMap<(String, Scope, String), Value>,
    moves: Vec<(String, CardMove)>,
    failures: HashSet<FailPoint>,
}

/// A board held entirely in memory. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryBoard {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory board lock poisoned")
    }

    fn check(&self, point: FailPoint) -> Result<(), HostError> {
        if self.lock().failures.contains(&point) {
            Err(HostError::Unavailable(format!("{:?} disabled", point)))
        } else {
            Ok(())
        }
    }

    // ============================================================
    // Setup
    // ============================================================

    pub fn set_member(&self, id: &str, username: &str) {
        self.lock().member = Some(Member {
            id: id.to_string(),
            username: username.to_string(),
            full_name: None,
        });
    }

    pub fn add_workspace(&self, id: &str, name: &str) {
        self.lock().workspaces.push(Workspace {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    pub fn add_collection(&self, workspace_id: &str, id: &str, name: &str) {
        self.lock().collections.push(Collection {
            id: id.to_string(),
            name: name.to_string(),
            workspace_id: workspace_id.to_string(),
        });
    }

    pub fn define_attribute(&self, workspace_id: &str, id: &str, name: &str, kind: AttributeKind) {
        self.lock()
            .definitions
            .entry(workspace_id.to_string())
            .or_default()
            .push(AttributeDefinition {
                id: id.to_string(),
                name: name.to_string(),
                kind,
            });
    }

    pub fn add_card(&self, workspace_id: &str, collection_id: &str, id: &str, name: &str) {
        self.lock().cards.insert(
            id.to_string(),
            Card {
                id: id.to_string(),
                name: name.to_string(),
                collection_id: collection_id.to_string(),
                workspace_id: workspace_id.to_string(),
                member_ids: Vec::new(),
                attributes: Vec::new(),
            },
        );
    }

    /// Store a value directly, bypassing failure injection.
    pub fn put_attribute(&self, card_id: &str, definition_id: &str, payload: AttributePayload) {
        let mut state = self.lock();
        if let Some(card) = state.cards.get_mut(card_id) {
            upsert_attribute(card, definition_id, payload);
        }
    }

    pub fn put_plugin_value(&self, workspace_id: &str, scope: Scope, key: &str, value: Value) {
        self.lock()
            .plugin_data
            .insert((workspace_id.to_string(), scope, key.to_string()), value);
    }

    pub fn fail(&self, point: FailPoint) {
        self.lock().failures.insert(point);
    }

    pub fn recover(&self, point: FailPoint) {
        self.lock().failures.remove(&point);
    }

    // ============================================================
    // Inspection
    // ============================================================

    pub fn card_snapshot(&self, card_id: &str) -> Option<Card> {
        self.lock().cards.get(card_id).cloned()
    }

    /// Current payload of a card's custom field.
    pub fn attribute_payload(
        &self,
        card_id: &str,
        definition_id: &str,
    ) -> Option<AttributePayload> {
        self.lock()
            .cards
            .get(card_id)?
            .attribute(definition_id)?
            .value
            .clone()
    }

    pub fn attachments(&self, card_id: &str) -> Vec<Attachment> {
        self.lock()
            .attachments
            .get(card_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn plugin_value(&self, workspace_id: &str, scope: Scope, key: &str) -> Option<Value> {
        self.lock()
            .plugin_data
            .get(&(workspace_id.to_string(), scope, key.to_string()))
            .cloned()
    }

    /// Every move request received, in order.
    pub fn moves(&self) -> Vec<(String, CardMove)> {
        self.lock().moves.clone()
    }
}

fn upsert_attribute(card: &mut Card, definition_id: &str, payload: AttributePayload) {
    match card
        .attributes
        .iter_mut()
        .find(|item| item.id_custom_field == definition_id)
    {
        Some(item) => item.value = Some(payload),
        None => card.attributes.push(AttributeValue {
            id_custom_field: definition_id.to_string(),
            value: Some(payload),
        }),
    }
}

#[async_trait]
impl PluginStorage for MemoryBoard {
    async fn get(
        &self,
        workspace_id: &str,
        scope: Scope,
        key: &str,
    ) -> Result<Option<Value>, HostError> {
        self.check(FailPoint::StorageRead)?;
        Ok(self.plugin_value(workspace_id, scope, key))
    }

    async fn set(
        &self,
        workspace_id: &str,
        scope: Scope,
        entries: &Map<String, Value>,
    ) -> Result<(), HostError> {
        self.check(FailPoint::StorageWrite)?;
        let mut state = self.lock();
        for (key, value) in entries {
            state
                .plugin_data
                .insert((workspace_id.to_string(), scope, key.clone()), value.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl BoardApi for MemoryBoard {
    async fn attribute_definitions(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<AttributeDefinition>, HostError> {
        self.check(FailPoint::Definitions)?;
        Ok(self
            .lock()
            .definitions
            .get(workspace_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn card(&self, card_id: &str) -> Result<Card, HostError> {
        self.check(FailPoint::CardRead)?;
        self.card_snapshot(card_id)
            .ok_or_else(|| HostError::NotFound(format!("card {}", card_id)))
    }

    async fn collections(&self, workspace_id: &str) -> Result<Vec<Collection>, HostError> {
        self.check(FailPoint::Collections)?;
        Ok(self
            .lock()
            .collections
            .iter()
            .filter(|c| c.workspace_id == workspace_id)
            .cloned()
            .collect())
    }

    async fn workspaces(&self) -> Result<Vec<Workspace>, HostError> {
        self.check(FailPoint::Workspaces)?;
        Ok(self.lock().workspaces.clone())
    }

    async fn current_member(&self) -> Result<Member, HostError> {
        self.check(FailPoint::CurrentMember)?;
        self.lock()
            .member
            .clone()
            .ok_or(HostError::Unauthorized)
    }

    async fn write_attribute(
        &self,
        card_id: &str,
        definition_id: &str,
        payload: &AttributePayload,
    ) -> Result<(), HostError> {
        self.check(FailPoint::AttributeWrite)?;
        let mut state = self.lock();
        let card = state
            .cards
            .get_mut(card_id)
            .ok_or_else(|| HostError::NotFound(format!("card {}", card_id)))?;
        upsert_attribute(card, definition_id, payload.clone());
        Ok(())
    }

    async fn clear_attribute(&self, card_id: &str, definition_id: &str) -> Result<(), HostError> {
        self.check(FailPoint::AttributeWrite)?;
        let mut state = self.lock();
        let card = state
            .cards
            .get_mut(card_id)
            .ok_or_else(|| HostError::NotFound(format!("card {}", card_id)))?;
        card.attributes.retain(|item| item.id_custom_field != definition_id);
        Ok(())
    }

    async fn move_card(&self, card_id: &str, target: &CardMove) -> Result<(), HostError> {
        self.check(FailPoint::Move)?;
        let mut state = self.lock();
        state.moves.push((card_id.to_string(), target.clone()));
        let card = state
            .cards
            .get_mut(card_id)
            .ok_or_else(|| HostError::NotFound(format!("card {}", card_id)))?;
        card.collection_id = target.collection_id.clone();
        if let Some(ref workspace_id) = target.workspace_id {
            card.workspace_id = workspace_id.clone();
        }
        Ok(())
    }

    async fn add_member(&self, card_id: &str, member_id: &str) -> Result<(), HostError> {
        self.check(FailPoint::AddMember)?;
        let mut state = self.lock();
        let card = state
            .cards
            .get_mut(card_id)
            .ok_or_else(|| HostError::NotFound(format!("card {}", card_id)))?;
        if !card.has_member(member_id) {
            card.member_ids.push(member_id.to_string());
        }
        Ok(())
    }

    async fn attach(&self, card_id: &str, attachment: &Attachment) -> Result<(), HostError> {
        self.check(FailPoint::Attach)?;
        self.lock()
            .attachments
            .entry(card_id.to_string())
            .or_default()
            .push(attachment.clone());
        Ok(())
    }
}
