//! In-memory transport for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::card::{AgentCard, AgentDescriptor, AgentSkill};
use super::transport::RemoteTransport;
use crate::error::{LabError, Result};

/// Transport with canned cards and replies that records every invocation
#[derive(Default)]
pub(crate) struct StubTransport {
    cards: HashMap<String, AgentCard>,
    replies: HashMap<String, std::result::Result<String, String>>,
    card_requests: AtomicUsize,
    invocations: Mutex<Vec<(String, String)>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_card(mut self, url: &str, name: &str, skills: &[&str]) -> Self {
        let card = AgentCard {
            name: name.to_string(),
            description: None,
            url: Some(url.to_string()),
            version: Some("1.0.0".to_string()),
            skills: skills
                .iter()
                .map(|s| AgentSkill {
                    id: s.to_lowercase().replace(' ', "_"),
                    name: s.to_string(),
                    description: None,
                    tags: Vec::new(),
                    examples: Vec::new(),
                })
                .collect(),
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
        };
        self.cards.insert(url.to_string(), card);
        self
    }

    pub(crate) fn with_reply(mut self, url: &str, reply: &str) -> Self {
        self.replies.insert(url.to_string(), Ok(reply.to_string()));
        self
    }

    pub(crate) fn with_failure(mut self, url: &str, reason: &str) -> Self {
        self.replies.insert(url.to_string(), Err(reason.to_string()));
        self
    }

    pub(crate) fn card_requests(&self) -> usize {
        self.card_requests.load(Ordering::SeqCst)
    }

    /// `(url, payload)` of every `send_message` call
    pub(crate) fn invocations(&self) -> Vec<(String, String)> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteTransport for StubTransport {
    async fn fetch_card(&self, base_url: &str) -> Result<AgentCard> {
        self.card_requests.fetch_add(1, Ordering::SeqCst);
        self.cards
            .get(base_url)
            .cloned()
            .ok_or_else(|| LabError::Discovery {
                url: base_url.to_string(),
                reason: "connection refused".to_string(),
            })
    }

    async fn send_message(&self, descriptor: &AgentDescriptor, payload: &str) -> Result<String> {
        self.invocations
            .lock()
            .unwrap()
            .push((descriptor.url.clone(), payload.to_string()));

        match self.replies.get(&descriptor.url) {
            Some(Ok(reply)) => Ok(reply.clone()),
            Some(Err(reason)) => Err(LabError::RemoteInvocation {
                agent: descriptor.name.clone(),
                reason: reason.clone(),
            }),
            None => Err(LabError::RemoteInvocation {
                agent: descriptor.name.clone(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}
