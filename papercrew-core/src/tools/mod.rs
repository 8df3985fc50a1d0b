//! Capabilities available to roles
//!
//! - [`capability`]: the closed set of integrations a role may declare
//! - [`search`]: the web search capability (Serper)

pub mod capability;
pub mod search;

pub use capability::{Capability, CapabilitySet};
pub use search::{SearchResult, SearchTool, SerperSearchTool, format_results};
