//! Error taxonomy shared by the dispatcher, the service clients and the publisher.

use thiserror::Error;

/// Failure talking to a downstream managed service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{service} is not configured: {reason}")]
    NotConfigured {
        service: &'static str,
        reason: String,
    },

    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to sign request to {service}: {reason}")]
    Signing {
        service: &'static str,
        reason: String,
    },

    #[error("malformed response from {service}: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },
}

impl ServiceError {
    pub fn transport(service: &'static str, source: reqwest::Error) -> Self {
        ServiceError::Transport { service, source }
    }

    pub fn signing(service: &'static str, reason: impl ToString) -> Self {
        ServiceError::Signing {
            service,
            reason: reason.to_string(),
        }
    }

    pub fn decode(service: &'static str, reason: impl ToString) -> Self {
        ServiceError::Decode {
            service,
            reason: reason.to_string(),
        }
    }
}

/// Dispatch failures, each with an HTTP-analog status.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("toolName is required")]
    MissingToolName,

    #[error("Tool not found: {0}")]
    UnknownTool(String),

    #[error("invalid input for {tool}: {source}")]
    InvalidInput {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    pub fn status_code(&self) -> u16 {
        match self {
            ToolError::MissingToolName => 400,
            ToolError::UnknownTool(_) => 404,
            ToolError::InvalidInput { .. } | ToolError::Execution(_) => 500,
        }
    }
}

impl From<ServiceError> for ToolError {
    fn from(e: ServiceError) -> Self {
        ToolError::Execution(e.to_string())
    }
}
