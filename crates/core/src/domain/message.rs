use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityValue {
    pub value: String,
}

impl EntityValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

pub type Entities = BTreeMap<String, Vec<EntityValue>>;

/// Intent label and entities extracted from exactly one inbound message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub intent: String,
    #[serde(default)]
    pub entities: Entities,
}

impl ClassificationResult {
    pub fn new(intent: impl Into<String>) -> Self {
        Self { intent: intent.into(), entities: Entities::new() }
    }

    pub fn with_entity<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values = values.into_iter().map(EntityValue::new).collect();
        self.entities.insert(name.into(), values);
        self
    }

    /// Looks up an entity by exact name, then by a `name:role` key. An empty
    /// exact entry does not hide a populated role-qualified one.
    pub fn entity_values(&self, name: &str) -> Option<&[EntityValue]> {
        let exact = self.entities.get(name).map(Vec::as_slice);
        if exact.is_some_and(|values| !values.is_empty()) {
            return exact;
        }

        self.entities
            .iter()
            .filter(|(key, _)| key.split_once(':').is_some_and(|(entity, _)| entity == name))
            .map(|(_, values)| values.as_slice())
            .find(|values| !values.is_empty())
            .or(exact)
    }

    pub fn first_entity_value(&self, name: &str) -> Option<&str> {
        self.entity_values(name)
            .and_then(|values| values.first())
            .map(|entity| entity.value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerOutcome {
    pub text: String,
}

impl HandlerOutcome {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
