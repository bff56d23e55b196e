//! Custom field lookup and typed writes.

use serde_json::Value;

use crate::board::BoardApi;
use crate::models::*;

/// Pick the definition named `name`: exact match first, then
/// case-insensitive. The first definition in board order wins a tie.
pub fn pick_definition<'d>(
    definitions: &'d [AttributeDefinition],
    name: &str,
) -> Option<&'d AttributeDefinition> {
    definitions
        .iter()
        .find(|d| d.name == name)
        .or_else(|| definitions.iter().find(|d| d.name.eq_ignore_ascii_case(name)))
}

/// Find a board's custom field by name. A board without the field is a
/// normal condition and yields `None`; so does a failed lookup, after
/// logging it.
pub async fn resolve_definition(
    board: &dyn BoardApi,
    workspace_id: &str,
    name: &str,
) -> Option<AttributeDefinition> {
    match board.attribute_definitions(workspace_id).await {
        Ok(definitions) => pick_definition(&definitions, name).cloned(),
        Err(e) => {
            tracing::warn!(
                "Failed to load custom fields for board {}: {}",
                workspace_id,
                e
            );
            None
        }
    }
}

/// Encode `raw` for the definition's kind and store it on the card.
/// Returns whether the value was written.
pub async fn write_value(
    board: &dyn BoardApi,
    card_id: &str,
    definition: &AttributeDefinition,
    raw: &Value,
) -> bool {
    let payload = match AttributePayload::encode(definition.kind, raw) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Cannot encode '{}' on card {}: {}", definition.name, card_id, e);
            return false;
        }
    };
    write_payload(board, card_id, definition, &payload).await
}

async fn write_payload(
    board: &dyn BoardApi,
    card_id: &str,
    definition: &AttributeDefinition,
    payload: &AttributePayload,
) -> bool {
    match board.write_attribute(card_id, &definition.id, payload).await {
        Ok(()) => {
            tracing::info!("Set '{}' on card {}", definition.name, card_id);
            true
        }
        Err(e) => {
            tracing::warn!("Failed to set '{}' on card {}: {}", definition.name, card_id, e);
            false
        }
    }
}

/// Remove the card's value for the field. Returns whether it was cleared.
pub async fn clear_value(
    board: &dyn BoardApi,
    card_id: &str,
    definition: &AttributeDefinition,
) -> bool {
    match board.clear_attribute(card_id, &definition.id).await {
        Ok(()) => {
            tracing::info!("Cleared '{}' on card {}", definition.name, card_id);
            true
        }
        Err(e) => {
            tracing::warn!("Failed to clear '{}' on card {}: {}", definition.name, card_id, e);
            false
        }
    }
}

/// The card's numeric estimate.
///
/// `None` when the card has no field values, the board has no number field
/// called `field_name`, or the card leaves it unset. Non-positive values are
/// returned as-is; callers decide whether they are usable.
pub async fn read_estimate(board: &dyn BoardApi, card: &Card, field_name: &str) -> Option<f64> {
    if card.attributes.is_empty() {
        return None;
    }
    let definition = resolve_definition(board, &card.workspace_id, field_name).await?;
    if definition.kind != AttributeKind::Number {
        tracing::debug!(
            "Field '{}' on board {} is {}, not a number",
            definition.name,
            card.workspace_id,
            definition.kind.as_str()
        );
        return None;
    }
    card.attribute(&definition.id)?.value.as_ref()?.as_number()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FailPoint, MemoryBoard};
    use serde_json::json;

    fn definition(id: &str, name: &str, kind: AttributeKind) -> AttributeDefinition {
        AttributeDefinition {
            id: id.to_string(),
            name: name.to_string(),
            kind,
        }
    }

    fn number(value: &str) -> AttributePayload {
        AttributePayload {
            number: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn exact_name_beats_case_insensitive_match() {
        let definitions = vec![
            definition("f1", "SPRINT", AttributeKind::Text),
            definition("f2", "Sprint", AttributeKind::Number),
        ];
        assert_eq!(pick_definition(&definitions, "Sprint").unwrap().id, "f2");
        assert_eq!(pick_definition(&definitions, "sprint").unwrap().id, "f1");
        assert!(pick_definition(&definitions, "Branch").is_none());
    }

    #[tokio::test]
    async fn write_value_encodes_by_kind() {
        let board = MemoryBoard::new();
        board.add_card("b1", "l1", "c1", "Card");
        let sprint = definition("f1", "Sprint", AttributeKind::Number);

        assert!(write_value(&board, "c1", &sprint, &json!("5")).await);
        assert_eq!(board.attribute_payload("c1", "f1"), Some(number("5")));
    }

    #[tokio::test]
    async fn write_value_reports_failures() {
        let board = MemoryBoard::new();
        board.add_card("b1", "l1", "c1", "Card");
        let sprint = definition("f1", "Sprint", AttributeKind::Number);

        assert!(!write_value(&board, "c1", &sprint, &json!("five")).await);

        board.fail(FailPoint::AttributeWrite);
        assert!(!write_value(&board, "c1", &sprint, &json!(5)).await);
        assert_eq!(board.attribute_payload("c1", "f1"), None);
    }

    #[tokio::test]
    async fn clear_value_works_for_non_text_fields() {
        let board = MemoryBoard::new();
        board.add_card("b1", "l1", "c1", "Card");
        board.put_attribute("c1", "f1", number("2"));
        let blocker = definition("f1", "Blocker", AttributeKind::Number);

        assert!(clear_value(&board, "c1", &blocker).await);
        assert_eq!(board.attribute_payload("c1", "f1"), None);

        board.put_attribute("c1", "f1", number("2"));
        board.fail(FailPoint::AttributeWrite);
        assert!(!clear_value(&board, "c1", &blocker).await);
        assert_eq!(board.attribute_payload("c1", "f1"), Some(number("2")));
    }

    #[tokio::test]
    async fn estimate_is_read_from_number_field() {
        let board = MemoryBoard::new();
        board.define_attribute("b1", "est", "Estimate", AttributeKind::Number);
        board.add_card("b1", "l1", "c1", "Card");
        board.put_attribute("c1", "est", number("3"));

        let card = board.card_snapshot("c1").unwrap();
        assert_eq!(read_estimate(&board, &card, "estimate").await, Some(3.0));
    }

    #[tokio::test]
    async fn text_estimate_field_counts_as_absent() {
        let board = MemoryBoard::new();
        board.define_attribute("b1", "est", "estimate", AttributeKind::Text);
        board.add_card("b1", "l1", "c1", "Card");
        board.put_attribute(
            "c1",
            "est",
            AttributePayload {
                text: Some("3".to_string()),
                ..Default::default()
            },
        );

        let card = board.card_snapshot("c1").unwrap();
        assert_eq!(read_estimate(&board, &card, "estimate").await, None);
    }

    #[tokio::test]
    async fn estimate_absent_without_values_or_definition() {
        let board = MemoryBoard::new();
        board.add_card("b1", "l1", "c1", "Card");
        let card = board.card_snapshot("c1").unwrap();
        assert_eq!(read_estimate(&board, &card, "estimate").await, None);

        board.put_attribute("c1", "other", number("2"));
        let card = board.card_snapshot("c1").unwrap();
        assert_eq!(read_estimate(&board, &card, "estimate").await, None);
    }

    #[tokio::test]
    async fn zero_estimate_is_returned_for_the_caller_to_reject() {
        let board = MemoryBoard::new();
        board.define_attribute("b1", "est", "estimate", AttributeKind::Number);
        board.add_card("b1", "l1", "c1", "Card");
        board.put_attribute("c1", "est", number("0"));

        let card = board.card_snapshot("c1").unwrap();
        assert_eq!(read_estimate(&board, &card, "estimate").await, Some(0.0));
    }
}
