use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_yaml::{Number, Value};

// Re-inserting a label replaces the value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: Vec<(String, String)>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn extend(&mut self, other: LabelMap) {
        for (label, value) in other.entries {
            self.insert(label, value);
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(label, value)| (label.as_str(), value.as_str()))
    }

}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (label, value) in iter {
            map.insert(label, value);
        }
        map
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSummary {
    pub fields: LabelMap,
    pub demultiplexing: LabelMap,
}

pub const UNKNOWN_BOUND: &str = "unknown";

// Bounds stay raw until a mapped handler needs them; unmapped handlers may
// carry anything.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThresholdRecord {
    pub name: String,
    #[serde(default)]
    pub warning: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    LessThan,
    GreaterThan,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LessThan => "lt",
            Self::GreaterThan => "gt",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    pub reported_key: String,
    pub direction: Direction,
    pub warn: Option<Number>,
    pub fail: Option<Number>,
}

// `{fail: [{lt: n}], warn: [{lt: n}]}`, absent clauses omitted.
impl Serialize for ThresholdRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let clauses = [("fail", &self.fail), ("warn", &self.warn)];
        let present = clauses.iter().filter(|(_, bound)| bound.is_some()).count();

        let mut map = serializer.serialize_map(Some(present))?;
        for (name, bound) in clauses {
            if let Some(bound) = bound {
                let clause = BTreeMap::from([(self.direction.as_str(), bound)]);
                map.serialize_entry(name, &[clause])?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FormattingRules {
    pub table_cond_formatting_rules: BTreeMap<String, ThresholdRule>,
}

impl FormattingRules {
    pub fn from_rules(rules: Vec<ThresholdRule>) -> Self {
        Self {
            table_cond_formatting_rules: rules
                .into_iter()
                .map(|rule| (rule.reported_key.clone(), rule))
                .collect(),
        }
    }
}
