//! Chat proxy: terminates browser chat requests and forwards them to the
//! hosted agent runtime.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use disruption_core::llm::AgentRuntime;
use disruption_core::util::preview;

use crate::api::{AgentPayload, AgentResult, ChatRequest, ChatResponse};

pub const ALLOWED_HEADERS: &str = "Content-Type,X-Amz-Date,Authorization,X-Api-Key";
pub const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";

#[derive(Clone)]
pub struct ProxyState {
    pub runtime: Arc<dyn AgentRuntime>,
    pub runtime_arn: String,
    pub qualifier: String,
}

#[derive(Debug)]
pub enum ProxyError {
    InvalidJson,
    MissingMessage,
    NotFound { method: Method, path: String },
    Agent(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ProxyError::InvalidJson => {
                (StatusCode::BAD_REQUEST, json!({ "error": "Invalid JSON" }))
            }
            ProxyError::MissingMessage => {
                (StatusCode::BAD_REQUEST, json!({ "error": "Message is required" }))
            }
            ProxyError::NotFound { method, path } => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("Not found: {} {}", method, path) }),
            ),
            ProxyError::Agent(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to invoke agent", "message": message }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/chat", any(chat))
        .route("/chatv2", any(chat))
        .route("/health", any(health))
        .route("/chatv2/health", any(health))
        .fallback(not_found)
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answers preflight requests without touching any handler and stamps the
/// CORS header set onto every response.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        Json(json!({ "message": "OK" })).into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    response
}

async fn not_found(method: Method, uri: Uri) -> ProxyError {
    info!("No route for {} {}", method, uri.path());
    ProxyError::NotFound {
        method,
        path: uri.path().to_string(),
    }
}

async fn health(method: Method, uri: Uri) -> Result<Json<serde_json::Value>, ProxyError> {
    if method != Method::GET {
        return Err(not_found(method, uri).await);
    }
    Ok(Json(json!({ "status": "healthy", "agent": "agentcore-runtime" })))
}

async fn chat(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Json<ChatResponse>, ProxyError> {
    if method != Method::POST {
        return Err(not_found(method, uri).await);
    }

    let request = ChatRequest::from_body(&body)?;
    info!("Chat request: {}", preview(&request.message, 100));

    let result = invoke_agent(&state, &request).await.map_err(|e| {
        error!("Error invoking agent runtime: {}", e);
        ProxyError::Agent(e)
    })?;

    Ok(Json(ChatResponse::from(result)))
}

async fn invoke_agent(state: &ProxyState, request: &ChatRequest) -> Result<AgentResult, String> {
    let payload = serde_json::to_vec(&AgentPayload {
        message: &request.message,
        context: &request.context,
    })
    .map_err(|e| e.to_string())?;

    let raw = state
        .runtime
        .invoke(&state.runtime_arn, &state.qualifier, payload)
        .await
        .map_err(|e| e.to_string())?;

    let text = String::from_utf8(raw).map_err(|e| format!("agent response is not UTF-8: {}", e))?;
    info!("Agent runtime response: {}", preview(&text, 500));

    serde_json::from_str(&text).map_err(|e| format!("agent response is not valid JSON: {}", e))
}
