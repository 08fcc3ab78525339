//! Registry of remote agents resolved at startup
//!
//! The registry is an ordered mapping from agent name to descriptor, built
//! once per process by [`resolve`] and then shared read-only with the router.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = HttpTransport::new(Duration::from_secs(30))?;
//! let registry = resolve(&config.remote_agents.urls, &transport).await;
//! if let Some(outline) = registry.get("AI Foundry Outline Agent") {
//!     println!("{} at {}", outline.name, outline.url);
//! }
//! ```

use indexmap::IndexMap;
use tracing::{info, warn};

use super::card::AgentDescriptor;
use super::transport::RemoteTransport;

/// Ordered name → descriptor mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentRegistry {
    agents: IndexMap<String, AgentDescriptor>,
}

impl AgentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor.
    ///
    /// A descriptor whose name is already present replaces the earlier one
    /// and moves to the end (last wins). Returns the replaced descriptor.
    pub fn insert(&mut self, descriptor: AgentDescriptor) -> Option<AgentDescriptor> {
        let replaced = self.agents.shift_remove(&descriptor.name);
        self.agents.insert(descriptor.name.clone(), descriptor);
        replaced
    }

    /// Get a descriptor by exact name
    pub fn get(&self, name: &str) -> Option<&AgentDescriptor> {
        self.agents.get(name)
    }

    /// Agent names in resolution order
    pub fn names(&self) -> Vec<&str> {
        self.agents.keys().map(|s| s.as_str()).collect()
    }

    /// Descriptors in resolution order
    pub fn descriptors(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl FromIterator<AgentDescriptor> for AgentRegistry {
    fn from_iter<I: IntoIterator<Item = AgentDescriptor>>(iter: I) -> Self {
        let mut registry = AgentRegistry::new();
        for descriptor in iter {
            registry.insert(descriptor);
        }
        registry
    }
}

/// Resolve each URL into a descriptor.
///
/// URLs that fail (network error, bad status, malformed card) are skipped
/// with a warning; resolution of the remaining URLs continues. An empty
/// registry is a valid result.
pub async fn resolve(urls: &[String], transport: &dyn RemoteTransport) -> AgentRegistry {
    let mut registry = AgentRegistry::new();

    if urls.is_empty() {
        warn!("No remote agent URLs provided. Set REMOTE_AGENT_URLS or TITLE_AGENT_URL/OUTLINE_AGENT_URL.");
        return registry;
    }

    for url in urls {
        match transport.fetch_card(url).await {
            Ok(card) => {
                let descriptor = AgentDescriptor::from_card(card, url.as_str());
                info!(
                    name = %descriptor.name,
                    url = %url,
                    skills = ?descriptor.skills,
                    "Discovered remote agent"
                );
                if let Some(previous) = registry.insert(descriptor) {
                    warn!(
                        name = %previous.name,
                        previous_url = %previous.url,
                        url = %url,
                        "Duplicate remote agent name, keeping the later URL"
                    );
                }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Skipping remote agent; check that the server is running and /health returns 200");
            }
        }
    }

    if registry.is_empty() {
        warn!("No remote agents available; delegate_to_agent calls will fail");
    }

    registry
}
