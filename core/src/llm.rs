use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Url;
use tracing::info;

use crate::config::Settings;
use crate::error::ServiceError;
use crate::services::http_client;
use crate::signing::RequestAuth;

const AGENT_RUNTIME: &str = "agent runtime";

/// The hosted conversational agent. It owns the model and decides which
/// tools to call; we only ship it a payload and read back its reply.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Sends `payload` to the runtime and returns the full (concatenated)
    /// response body.
    async fn invoke(
        &self,
        runtime_arn: &str,
        qualifier: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, ServiceError>;
}

pub struct HttpAgentRuntime {
    http: reqwest::Client,
    endpoint: String,
    auth: RequestAuth,
}

impl HttpAgentRuntime {
    pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
        let endpoint = settings.agent_runtime_endpoint.clone().unwrap_or_else(|| {
            format!("https://bedrock-agentcore.{}.amazonaws.com", settings.region)
        });

        let auth = RequestAuth::resolve(
            settings.bedrock_bearer_token.clone(),
            settings.aws_credentials.clone(),
            &settings.region,
            "bedrock-agentcore",
        );

        info!("Agent runtime endpoint: {} ({})", endpoint, auth.describe());
        Ok(Self {
            http: http_client()?,
            endpoint,
            auth,
        })
    }
}

/// `{endpoint}/runtimes/{arn}/invocations?qualifier={qualifier}`, with the
/// ARN encoded as a single path segment.
pub fn invocation_url(
    endpoint: &str,
    runtime_arn: &str,
    qualifier: &str,
) -> Result<Url, ServiceError> {
    let not_configured = |reason: String| ServiceError::NotConfigured {
        service: AGENT_RUNTIME,
        reason,
    };

    let mut url = Url::parse(endpoint)
        .map_err(|e| not_configured(format!("bad endpoint '{}': {}", endpoint, e)))?;
    url.path_segments_mut()
        .map_err(|_| not_configured(format!("endpoint '{}' cannot carry a path", endpoint)))?
        .pop_if_empty()
        .extend(["runtimes", runtime_arn, "invocations"]);
    url.query_pairs_mut().append_pair("qualifier", qualifier);
    Ok(url)
}

#[async_trait]
impl AgentRuntime for HttpAgentRuntime {
    async fn invoke(
        &self,
        runtime_arn: &str,
        qualifier: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, ServiceError> {
        if runtime_arn.is_empty() {
            return Err(ServiceError::NotConfigured {
                service: AGENT_RUNTIME,
                reason: "AGENT_RUNTIME_ARN is empty".into(),
            });
        }

        let url = invocation_url(&self.endpoint, runtime_arn, qualifier)?;
        info!("Invoking agent runtime {} ({})", runtime_arn, qualifier);

        let request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .body(payload)
            .build()
            .map_err(|e| ServiceError::transport(AGENT_RUNTIME, e))?;
        let request = self.auth.authorize(AGENT_RUNTIME, request)?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| ServiceError::transport(AGENT_RUNTIME, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                service: AGENT_RUNTIME,
                status: status.as_u16(),
                body,
            });
        }

        // The runtime streams its reply; stitch the chunks back together.
        let mut body = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| ServiceError::transport(AGENT_RUNTIME, e))?;
            body.extend_from_slice(&chunk);
        }

        info!("Agent runtime replied with {} bytes", body.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arn_is_a_single_encoded_segment() {
        let url = invocation_url(
            "https://bedrock-agentcore.us-east-1.amazonaws.com/",
            "arn:aws:bedrock-agentcore:us-east-1:123:runtime/agent-1",
            "DEFAULT",
        )
        .unwrap();

        assert_eq!(url.path_segments().unwrap().count(), 3);
        let prefix = "/runtimes/arn:aws:bedrock-agentcore:us-east-1:123:runtime%2Fagent-1";
        assert!(url.path().starts_with(prefix));
        assert!(url.path().ends_with("/invocations"));
        assert_eq!(url.query(), Some("qualifier=DEFAULT"));
    }

    #[test]
    fn bad_endpoint_is_not_configured() {
        let err = invocation_url("not a url", "arn", "DEFAULT").unwrap_err();
        assert!(matches!(err, ServiceError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn empty_arn_fails_before_any_request() {
        let runtime = HttpAgentRuntime::from_settings(&Settings::default()).unwrap();
        let err = runtime.invoke("", "DEFAULT", b"{}".to_vec()).await.unwrap_err();
        assert!(err.to_string().contains("AGENT_RUNTIME_ARN"));
    }
}
