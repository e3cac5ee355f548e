//! Action variants and their raw structural content

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Ordering key for actions; lower values dispatch earlier.
///
/// Any finite number is accepted, fractional values included. Compare with
/// [`f64::total_cmp`].
pub type Priority = f64;

/// Priority used when an action does not carry one.
pub const DEFAULT_PRIORITY: Priority = 0.0;

/// Where an inserted fragment lands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Immediately preceding the target within its parent
    Before,

    /// Immediately following the target within its parent
    After,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Before => "before",
            Position::After => "after",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported position: {0}")]
pub struct PositionError(pub String);

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "before" => Ok(Position::Before),
            "after" => Ok(Position::After),
            other => Err(PositionError(other.to_string())),
        }
    }
}

/// The four known action variants, plus a catch-all for anything else.
///
/// Required fields are kept optional here: an action that lacks one still
/// deserializes, and the dispatcher rejects it in isolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Remove {
        selector: Option<String>,
    },
    Replace {
        selector: Option<String>,
        new_element: Option<String>,
    },
    Insert {
        target: Option<String>,
        element: Option<String>,
        position: Option<String>,
    },
    Alter {
        old_value: Option<String>,
        new_value: Option<String>,
    },
    /// `type` was missing or named no known variant
    Unknown {
        type_name: Option<String>,
    },
}

impl ActionKind {
    /// Tag name as it appears in configuration documents.
    pub fn name(&self) -> &str {
        match self {
            ActionKind::Remove { .. } => "remove",
            ActionKind::Replace { .. } => "replace",
            ActionKind::Insert { .. } => "insert",
            ActionKind::Alter { .. } => "alter",
            ActionKind::Unknown { type_name } => type_name.as_deref().unwrap_or("<missing>"),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ActionKind::Unknown { .. })
    }

    fn from_raw(raw: &Value) -> Self {
        let type_name = string_field(raw, "type");
        match type_name.as_deref() {
            Some("remove") => ActionKind::Remove {
                selector: string_field(raw, "selector"),
            },
            Some("replace") => ActionKind::Replace {
                selector: string_field(raw, "selector"),
                new_element: string_field(raw, "newElement"),
            },
            Some("insert") => ActionKind::Insert {
                target: string_field(raw, "target"),
                element: string_field(raw, "element"),
                position: string_field(raw, "position"),
            },
            Some("alter") => ActionKind::Alter {
                old_value: string_field(raw, "oldValue"),
                new_value: string_field(raw, "newValue"),
            },
            _ => ActionKind::Unknown { type_name },
        }
    }
}

/// One declarative DOM-mutation instruction.
///
/// The raw structural content is retained so that failures can be reported
/// with the action exactly as it was authored.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    kind: ActionKind,
    priority: Option<Priority>,
    raw: Value,
}

impl Action {
    /// Build an action from an arbitrary structural value. Never fails.
    pub fn from_value(raw: Value) -> Self {
        let kind = ActionKind::from_raw(&raw);
        let priority = raw.get("priority").and_then(priority_value);
        Self {
            kind,
            priority,
            raw,
        }
    }

    pub fn remove(selector: impl Into<String>) -> Self {
        Self::from_value(json!({ "type": "remove", "selector": selector.into() }))
    }

    pub fn replace(selector: impl Into<String>, new_element: impl Into<String>) -> Self {
        Self::from_value(json!({
            "type": "replace",
            "selector": selector.into(),
            "newElement": new_element.into(),
        }))
    }

    pub fn insert(
        target: impl Into<String>,
        element: impl Into<String>,
        position: Position,
    ) -> Self {
        Self::from_value(json!({
            "type": "insert",
            "target": target.into(),
            "element": element.into(),
            "position": position.as_str(),
        }))
    }

    pub fn alter(old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self::from_value(json!({
            "type": "alter",
            "oldValue": old_value.into(),
            "newValue": new_value.into(),
        }))
    }

    /// Return a copy carrying the given priority.
    pub fn with_priority(self, priority: impl Into<Priority>) -> Self {
        let priority = priority.into();
        let mut raw = match self.raw {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        // integral values stay integers in the raw content
        let value = if priority.fract() == 0.0 && priority.abs() < i64::MAX as f64 {
            json!(priority as i64)
        } else {
            json!(priority)
        };
        raw.insert("priority".to_string(), value);
        Self::from_value(Value::Object(raw))
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Explicit priority, if the action carries a usable one.
    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// Priority used for ordering.
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    /// The action as it was authored.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Action::from_value(raw))
    }
}

/// Scalars are accepted in their string form; anything else counts as absent.
fn string_field(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn priority_value(value: &Value) -> Option<Priority> {
    // adding 0.0 folds -0.0 into 0.0 so both compare equal under total_cmp
    value.as_f64().filter(|f| f.is_finite()).map(|f| f + 0.0)
}
