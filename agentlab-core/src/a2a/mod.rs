//! Agent-to-Agent discovery
//!
//! Remote agents publish an agent card at a well-known path. At startup the
//! configured base URLs are resolved into an [`AgentRegistry`]; the router
//! later sends task text to the matching agent through a [`RemoteTransport`].

mod card;
mod registry;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use card::{AGENT_CARD_PATH, AgentCard, AgentDescriptor, AgentSkill};
pub use registry::{AgentRegistry, resolve};
pub use transport::{HttpTransport, RemoteTransport, extract_reply_text};
