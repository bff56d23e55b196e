use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The value type of a custom field definition.
///
/// Trello calls booleans `checkbox`; both spellings are accepted. Kinds this
/// crate does not write to (dropdown lists and future host types) are kept as
/// `Unknown` and encoded as text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Number,
    Text,
    Date,
    #[serde(alias = "checkbox")]
    Boolean,
    #[serde(other)]
    Unknown,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Text => "text",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Unknown => "unknown",
        }
    }
}

/// A custom field defined once on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttributeKind,
}

/// The typed payload of a custom field value, in the host's wire shape.
///
/// Exactly one field is set for a stored value. Numbers, dates and checkbox
/// states travel as strings (`{"number": "3"}`, `{"checked": "true"}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<String>,
}

impl AttributePayload {
    /// Encode a raw value for a field of the given kind.
    ///
    /// - `number`: parsed as floating point (JSON numbers or numeric strings)
    /// - `text` and unknown kinds: stringified
    /// - `date`: passed through as an ISO-8601 string
    /// - `boolean`: truthiness of the raw value
    pub fn encode(kind: AttributeKind, raw: &Value) -> Result<Self, String> {
        match kind {
            AttributeKind::Number => {
                let number = parse_number(raw)
                    .ok_or_else(|| format!("'{}' is not a number", stringify(raw)))?;
                Ok(Self {
                    number: Some(number.to_string()),
                    ..Default::default()
                })
            }
            AttributeKind::Date => Ok(Self {
                date: Some(stringify(raw)),
                ..Default::default()
            }),
            AttributeKind::Boolean => Ok(Self {
                checked: Some(is_truthy(raw).to_string()),
                ..Default::default()
            }),
            AttributeKind::Text | AttributeKind::Unknown => Ok(Self {
                text: Some(stringify(raw)),
                ..Default::default()
            }),
        }
    }

    /// Numeric content, if this payload holds a parseable number.
    pub fn as_number(&self) -> Option<f64> {
        self.number.as_deref()?.trim().parse().ok()
    }
}

/// A custom field value stored on a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub id_custom_field: String,
    /// `None` when the host reports the field without a value.
    #[serde(default)]
    pub value: Option<AttributePayload>,
}

fn parse_number(raw: &Value) -> Option<f64> {
    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn stringify(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(_) | Value::Object(_) => true,
    }
}
