//! Shared plumbing for the flight-disruption assistant: configuration, the
//! tool registry, downstream service clients and the static asset publisher.

pub mod assets;
pub mod config;
pub mod error;
pub mod llm;
pub mod registry;
pub mod services;
pub mod signing;
pub mod util;

pub use config::Settings;
pub use error::{ServiceError, ToolError};
pub use registry::{Registry, Tool, ToolEnvelope, ToolInvocation};
pub use services::Services;
