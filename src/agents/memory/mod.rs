//! Per-agent memory
//!
//! Three stores live side by side:
//! - short-term: latest output per plan-step action, volatile
//! - long-term: append-only log of task outcomes, trimmed to a bound
//! - entities: mention counts for names seen in outputs

mod entity;

pub use entity::{CapitalizedPhraseExtractor, EntityExtractor};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::agents::config::MemoryLimits;

/// One entry of the long-term log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LongTermMemory {
    pub timestamp: DateTime<Utc>,
    pub context: String,
    pub data: Value,
}

impl LongTermMemory {
    fn mentions(&self, query: &str) -> bool {
        self.context.contains(query) || self.data.to_string().contains(query)
    }
}

/// What is known about an entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityRecord {
    #[serde(default)]
    pub properties: Map<String, Value>,
    pub mentions: u32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMemory {
    short_term: HashMap<String, Value>,
    long_term: Vec<LongTermMemory>,
    entities: HashMap<String, EntityRecord>,
    #[serde(skip)]
    limits: MemoryLimits,
}

impl AgentMemory {
    pub fn new(limits: MemoryLimits) -> Self {
        Self {
            short_term: HashMap::new(),
            long_term: Vec::new(),
            entities: HashMap::new(),
            limits,
        }
    }

    /// Append to the long-term log.
    ///
    /// Once the log grows past the capacity it is cut back to the most
    /// recent `trim_to` entries.
    pub fn remember(&mut self, context: impl Into<String>, data: Value) {
        self.long_term.push(LongTermMemory {
            timestamp: Utc::now(),
            context: context.into(),
            data,
        });

        if self.long_term.len() > self.limits.long_term_capacity {
            let remove_count = self.long_term.len().saturating_sub(self.limits.trim_to);
            self.long_term.drain(0..remove_count);
        }
    }

    /// Up to `limit` entries whose context or data contains `query`, newest first
    pub fn recall(&self, query: &str, limit: usize) -> Vec<&LongTermMemory> {
        self.long_term
            .iter()
            .rev()
            .filter(|m| m.mentions(query))
            .take(limit)
            .collect()
    }

    /// Recall with the configured limit
    pub fn recall_relevant(&self, query: &str) -> Vec<&LongTermMemory> {
        self.recall(query, self.limits.recall_limit)
    }

    /// Overwrite the short-term value for a plan action
    pub fn record_step(&mut self, action: impl Into<String>, output: Value) {
        self.short_term.insert(action.into(), output);
    }

    pub fn step_output(&self, action: &str) -> Option<&Value> {
        self.short_term.get(action)
    }

    /// Count every entity mention in `text`
    pub fn observe_entities(&mut self, text: &str, extractor: &dyn EntityExtractor) {
        let now = Utc::now();
        for name in extractor.extract(text) {
            let record = self.entities.entry(name).or_insert_with(|| EntityRecord {
                properties: Map::from_iter([("first_seen".to_string(), json!(now))]),
                mentions: 0,
                last_updated: now,
            });
            record.mentions += 1;
            record.last_updated = now;
        }
    }

    pub fn entity(&self, name: &str) -> Option<&EntityRecord> {
        self.entities.get(name)
    }

    pub fn entities(&self) -> &HashMap<String, EntityRecord> {
        &self.entities
    }

    pub fn long_term(&self) -> &[LongTermMemory] {
        &self.long_term
    }

    pub fn short_term(&self) -> &HashMap<String, Value> {
        &self.short_term
    }

    /// Number of long-term entries
    pub fn entry_count(&self) -> usize {
        self.long_term.len()
    }

    pub fn clear(&mut self) {
        self.short_term.clear();
        self.long_term.clear();
        self.entities.clear();
    }
}

impl Default for AgentMemory {
    fn default() -> Self {
        Self::new(MemoryLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_term_is_bounded() {
        let mut memory = AgentMemory::default();
        for i in 0..100 {
            memory.remember(format!("task {i}"), json!(i));
        }
        assert_eq!(memory.entry_count(), 100);

        memory.remember("task 100", json!(100));
        assert_eq!(memory.entry_count(), 50);
        assert_eq!(memory.long_term()[0].data, json!(51));
        assert_eq!(memory.long_term()[49].data, json!(100));

        for i in 101..400 {
            memory.remember(format!("task {i}"), json!(i));
            assert!(memory.entry_count() <= 100);
        }
    }

    #[test]
    fn test_recall_newest_first_and_limited() {
        let mut memory = AgentMemory::default();
        for i in 0..8 {
            memory.remember("Build the hero section", json!({"run": i}));
        }
        memory.remember("Unrelated", json!({"note": "pricing"}));

        let recalled = memory.recall("hero", 5);
        assert_eq!(recalled.len(), 5);
        assert_eq!(recalled[0].data, json!({"run": 7}));
        assert_eq!(recalled[4].data, json!({"run": 3}));

        // data is searched too
        assert_eq!(memory.recall("pricing", 5).len(), 1);
        assert!(memory.recall("footer", 5).is_empty());
    }

    #[test]
    fn test_entities_count_mentions() {
        let mut memory = AgentMemory::default();
        memory.observe_entities("Acme Corp ships fast.", &CapitalizedPhraseExtractor);
        memory.observe_entities("Acme Corp again, with Globex.", &CapitalizedPhraseExtractor);

        let acme = memory.entity("Acme Corp").unwrap();
        assert_eq!(acme.mentions, 2);
        assert!(acme.properties.contains_key("first_seen"));
        assert_eq!(memory.entity("Globex").unwrap().mentions, 1);
    }

    #[test]
    fn test_short_term_keeps_latest_per_action() {
        let mut memory = AgentMemory::default();
        memory.record_step("draft", json!("v1"));
        memory.record_step("draft", json!("v2"));
        assert_eq!(memory.step_output("draft"), Some(&json!("v2")));

        memory.clear();
        assert!(memory.short_term().is_empty());
        assert_eq!(memory.entry_count(), 0);
    }
}
