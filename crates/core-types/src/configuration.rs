use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::action::Action;

/// One parsed configuration document.
///
/// Deserialization is total: a document whose top level is not a mapping, or
/// whose `actions` is not a sequence, yields an empty configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Configuration {
    pub actions: Vec<Action>,
}

impl Configuration {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn from_value(value: Value) -> Self {
        let actions = match value {
            Value::Object(mut map) => match map.remove("actions") {
                Some(Value::Array(items)) => items.into_iter().map(Action::from_value).collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self { actions }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<'de> Deserialize<'de> for Configuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Configuration::from_value(value))
    }
}

/// All loaded configurations' actions, concatenated in load order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedConfiguration {
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl MergedConfiguration {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl From<Configuration> for MergedConfiguration {
    fn from(config: Configuration) -> Self {
        Self {
            actions: config.actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionKind;

    #[test]
    fn parses_yaml_document() {
        let yaml = r##"
actions:
  - type: remove
    selector: "#banner"
    priority: 2
  - type: alter
    oldValue: foo
    newValue: bar
"##;
        let config: Configuration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.actions.len(), 2);
        assert_eq!(config.actions[0].priority(), Some(2.0));
        assert_eq!(config.actions[1].kind().name(), "alter");
    }

    #[test]
    fn malformed_shapes_are_empty() {
        let scalar: Configuration = serde_yaml::from_str("just text").unwrap();
        assert!(scalar.is_empty());

        let wrong_actions: Configuration = serde_yaml::from_str("actions: nope").unwrap();
        assert!(wrong_actions.is_empty());

        let missing: Configuration = serde_yaml::from_str("other: 1").unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn odd_entries_still_count_as_actions() {
        let config: Configuration =
            serde_json::from_str(r#"{"actions": [{"type": "remove"}, 7]}"#).unwrap();
        assert_eq!(config.actions.len(), 2);
        assert_eq!(
            config.actions[0].kind(),
            &ActionKind::Remove { selector: None }
        );
        assert!(!config.actions[1].kind().is_known());
    }
}
