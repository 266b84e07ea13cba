use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::agents::config::{AgentConfig, CrewDefinition, MemoryLimits};
use crate::agents::presets;
use crate::config::Settings;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cross-reference error: {0}")]
    CrossReference(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_memory(&settings.memory) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_agents(&settings.agents) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_crews(&settings.crews) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_cross_references(settings) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_memory(memory: &MemoryLimits) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if memory.long_term_capacity == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "memory.long_term_capacity".to_string(),
                reason: "Capacity must be greater than 0".to_string(),
            });
        }

        if memory.trim_to > memory.long_term_capacity {
            errors.push(ValidationError::InvalidValue {
                field: "memory.trim_to".to_string(),
                reason: format!(
                    "Cannot keep {} entries when capacity is {}",
                    memory.trim_to, memory.long_term_capacity
                ),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_agents(agents: &[AgentConfig]) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen_ids = HashMap::new();

        for (idx, agent) in agents.iter().enumerate() {
            if let Some(prev_idx) = seen_ids.insert(&agent.id, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Agent id '{}' appears at indices {} and {}",
                    agent.id, prev_idx, idx
                )));
            }

            if agent.name.is_empty() {
                errors.push(ValidationError::MissingField(format!("agents[{}].name", idx)));
            }

            if let Err(e) = agent.validate() {
                errors.push(ValidationError::InvalidValue {
                    field: format!("agents[{}]", idx),
                    reason: e.to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_crews(crews: &[CrewDefinition]) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen_ids = HashMap::new();

        for (idx, crew) in crews.iter().enumerate() {
            if let Some(prev_idx) = seen_ids.insert(&crew.id, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Crew id '{}' appears at indices {} and {}",
                    crew.id, prev_idx, idx
                )));
            }

            if crew.id.is_empty() {
                errors.push(ValidationError::MissingField(format!("crews[{}].id", idx)));
            }

            if crew.agents.is_empty() {
                errors.push(ValidationError::InvalidValue {
                    field: format!("crews[{}].agents", idx),
                    reason: "A crew needs at least one agent".to_string(),
                });
            }

            if crew.max_execution == 0 {
                errors.push(ValidationError::InvalidValue {
                    field: format!("crews[{}].max_execution", idx),
                    reason: "Must allow at least one task".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Crew members must be preset agents or agents declared in settings
    fn validate_cross_references(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let known: HashSet<String> = presets::preset_agents()
            .into_iter()
            .map(|a| a.id)
            .chain(settings.agents.iter().map(|a| a.id.clone()))
            .collect();

        for crew in &settings.crews {
            for agent_id in &crew.agents {
                if !known.contains(agent_id) {
                    errors.push(ValidationError::CrossReference(format!(
                        "Crew '{}' references unknown agent '{}'",
                        crew.id, agent_id
                    )));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::{AgentRole, ProcessType};

    fn crew(id: &str, agents: &[&str]) -> CrewDefinition {
        CrewDefinition {
            id: id.to_string(),
            name: id.to_string(),
            agents: agents.iter().map(|a| a.to_string()).collect(),
            process: ProcessType::Sequential,
            verbose: false,
            memory_enabled: true,
            max_execution: 10,
        }
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(ConfigValidator::validate(&Settings::default()).is_ok());
    }

    #[test]
    fn test_duplicate_and_invalid_agents() {
        let settings = Settings {
            agents: vec![
                AgentConfig::new("seo", "SEO", AgentRole::Optimizer),
                AgentConfig::new("seo", "SEO again", AgentRole::Optimizer).with_temperature(2.5),
            ],
            ..Default::default()
        };

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Duplicate(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidValue { .. })));
    }

    #[test]
    fn test_crew_references() {
        let settings = Settings {
            agents: vec![AgentConfig::new("seo", "SEO", AgentRole::Optimizer)],
            crews: vec![crew("audit", &["seo", "qa_tester"]), crew("broken", &["ghost"])],
            ..Default::default()
        };

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("'ghost'"));
    }

    #[test]
    fn test_crew_limits() {
        let mut empty = crew("empty", &[]);
        empty.max_execution = 0;
        let settings = Settings {
            crews: vec![empty],
            ..Default::default()
        };
        assert_eq!(ConfigValidator::validate(&settings).unwrap_err().len(), 2);
    }

    #[test]
    fn test_memory_limits() {
        let settings = Settings {
            memory: MemoryLimits {
                long_term_capacity: 10,
                trim_to: 20,
                recall_limit: 5,
            },
            ..Default::default()
        };
        assert!(ConfigValidator::validate(&settings).is_err());
    }
}
