//! Agent cards and the descriptors resolved from them

use serde::{Deserialize, Serialize};

/// Well-known path of the agent card on a remote agent
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// Discovery document published by a remote agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
    #[serde(default)]
    pub default_input_modes: Vec<String>,
    #[serde(default)]
    pub default_output_modes: Vec<String>,
}

/// One capability advertised on an agent card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSkill {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// A remote agent resolved at startup.
///
/// `url` is the base URL the card was fetched from, which is also where
/// invocations are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub url: String,
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            skills: Vec::new(),
            description: None,
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    /// Build a descriptor from a card fetched at `base_url`
    pub fn from_card(card: AgentCard, base_url: impl Into<String>) -> Self {
        Self {
            name: card.name,
            url: base_url.into(),
            skills: card.skills.into_iter().map(|s| s.name).collect(),
            description: card.description,
        }
    }
}
