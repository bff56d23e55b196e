use serde::{Deserialize, Serialize};

use super::attribute::AttributeValue;

/// A board: the shared container owning counters, custom fields and lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

/// A list on a board. Lists are the workflow columns a card moves through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(rename = "idBoard")]
    pub workspace_id: String,
}

/// A card as seen by the workflow engine.
///
/// The engine never owns cards; it reads them to decide what to write and
/// issues mutation requests against their id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "idList")]
    pub collection_id: String,
    #[serde(rename = "idBoard")]
    pub workspace_id: String,
    #[serde(rename = "idMembers", default)]
    pub member_ids: Vec<String>,
    #[serde(rename = "customFieldItems", default)]
    pub attributes: Vec<AttributeValue>,
}

impl Card {
    pub fn has_member(&self, member_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == member_id)
    }

    pub fn attribute(&self, definition_id: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|item| item.id_custom_field == definition_id)
    }
}

/// The acting principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Where a card should land after a move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardMove {
    pub collection_id: String,
    /// Set when the card leaves its current board.
    pub workspace_id: Option<String>,
}

/// A link attached to a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn card_deserializes_from_trello_shape() {
        let card: Card = serde_json::from_value(json!({
            "id": "c1",
            "name": "Login page",
            "idList": "l1",
            "idBoard": "b1",
            "idMembers": ["m1"],
            "customFieldItems": [
                { "idCustomField": "f1", "value": { "number": "3" } }
            ]
        }))
        .unwrap();

        assert_eq!(card.collection_id, "l1");
        assert!(card.has_member("m1"));
        assert!(!card.has_member("m2"));
        let estimate = card.attribute("f1").and_then(|item| item.value.as_ref());
        assert_eq!(estimate.and_then(|p| p.as_number()), Some(3.0));
    }

    #[test]
    fn card_tolerates_missing_optional_arrays() {
        let card: Card =
            serde_json::from_value(json!({ "id": "c1", "idList": "l1", "idBoard": "b1" })).unwrap();
        assert!(card.member_ids.is_empty());
        assert!(card.attributes.is_empty());
    }
}
