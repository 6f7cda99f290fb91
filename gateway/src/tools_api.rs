//! Tool dispatch endpoint called by the agent runtime, plus the synthetic
//! passenger manifest used to seed demo sessions.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use disruption_core::{Registry, ToolEnvelope};
use disruption_tools::manifest::{focus_passengers, generate_manifest, ManifestRequest, Passenger};
use disruption_tools::SharedRng;

/// Largest manifest a single request may ask for.
pub const MAX_MANIFEST_SIZE: usize = 1000;

#[derive(Clone)]
pub struct ToolsState {
    pub registry: Arc<Registry>,
    pub rng: SharedRng,
}

#[derive(Debug, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
pub struct ManifestResponse {
    pub count: usize,
    pub passengers: Vec<Passenger>,
    pub focus: Vec<Passenger>,
}

pub fn router(state: ToolsState) -> Router {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/invoke", post(invoke_tool))
        .route("/manifest", post(manifest))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_tools(State(state): State<ToolsState>) -> Json<Vec<ToolSummary>> {
    let tools = state
        .registry
        .names()
        .into_iter()
        .filter_map(|name| state.registry.get(name))
        .map(|tool| ToolSummary {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters(),
        })
        .collect();
    Json(tools)
}

/// Always answers HTTP 200; the dispatch outcome lives in the envelope's
/// own `statusCode`.
async fn invoke_tool(State(state): State<ToolsState>, body: Bytes) -> Json<ToolEnvelope> {
    let event: Value = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("Rejected tool event with invalid JSON: {}", e);
            return Json(ToolEnvelope::new(400, &json!({ "error": "Invalid JSON" })));
        }
    };

    Json(state.registry.dispatch(&event).await)
}

async fn manifest(State(state): State<ToolsState>, body: Bytes) -> Response {
    let request: ManifestRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected manifest request: {}", e);
            let error = format!("Invalid manifest request: {}", e);
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": error }))).into_response();
        }
    };
    if request.count > MAX_MANIFEST_SIZE {
        let error = format!("count must be at most {}", MAX_MANIFEST_SIZE);
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": error }))).into_response();
    }

    let passengers = state.rng.with(|rng| generate_manifest(rng, &request));
    info!(
        "Generated manifest of {} for {} {}->{}",
        passengers.len(),
        request.flight_number,
        request.origin,
        request.destination
    );

    Json(ManifestResponse {
        count: passengers.len(),
        focus: focus_passengers(&passengers),
        passengers,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use disruption_core::{Services, Settings};
    use disruption_tools::registry_with_rng;
    use tower::ServiceExt;

    fn app() -> Router {
        let settings = Settings {
            use_bedrock: false,
            use_comprehend: false,
            ..Settings::default()
        };
        // Every integration is switched off, so the HTTP clients are never used.
        let services = Services::from_settings(&settings).unwrap();
        let rng = SharedRng::seeded(5);
        router(ToolsState {
            registry: Arc::new(registry_with_rng(&settings, &services, rng.clone())),
            rng,
        })
    }

    async fn invoke(body: &str) -> ToolEnvelope {
        let request = Request::builder()
            .method("POST")
            .uri("/tools/invoke")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn confirms_a_booking() {
        let envelope = invoke(
            r#"{"toolName":"confirm_booking","toolInput":{"passenger_id":"P1","option_id":"B"}}"#,
        )
        .await;
        assert_eq!(envelope.status_code, 200);
        let body = envelope.json().unwrap();
        assert_eq!(body["status"], "CONFIRMED");
        assert_eq!(body["option_id"], "B");
    }

    #[tokio::test]
    async fn policy_falls_back_when_disabled() {
        let envelope = invoke(r#"{"toolName":"query_policy","toolInput":{"query":"pets"}}"#).await;
        let body = envelope.json().unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["fallback"], true);
    }

    #[tokio::test]
    async fn missing_tool_name_and_bad_json() {
        assert_eq!(invoke(r#"{"toolInput":{}}"#).await.status_code, 400);
        assert_eq!(invoke("not json").await.status_code, 400);
        assert_eq!(invoke(r#"{"toolName":"nope"}"#).await.status_code, 404);
    }

    #[tokio::test]
    async fn lists_registered_tools() {
        let request = Request::builder().uri("/tools").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let tools: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(tools.as_array().unwrap().len(), 6);
        assert_eq!(tools[0]["name"], "analyze_passenger_sentiment");

        for tool in tools.as_array().unwrap() {
            assert_eq!(tool["parameters"]["type"], "object", "{}", tool["name"]);
            for required in tool["parameters"]["required"].as_array().unwrap() {
                let key = required.as_str().unwrap();
                assert!(!tool["parameters"]["properties"][key].is_null(), "{key}");
            }
        }
        let rebooking = tools
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["name"] == "generate_rebooking_options")
            .unwrap();
        assert_eq!(
            rebooking["parameters"]["required"],
            json!(["passenger_id", "origin", "destination", "tier"])
        );
    }

    #[tokio::test]
    async fn positional_tool_input_is_a_500() {
        let envelope = invoke(r#"{"toolName":"confirm_booking","toolInput":["P1","B"]}"#).await;
        assert_eq!(envelope.status_code, 500);
    }

    async fn post_manifest(body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/manifest")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn generates_a_manifest_with_focus_set() {
        let (status, body) = post_manifest(
            r#"{"origin":"FRA","destination":"JFK","flightNumber":"LH400","date":"d","count":50}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 50);
        assert_eq!(body["passengers"].as_array().unwrap().len(), 50);
        assert!(body["focus"].as_array().unwrap().len() <= 5);
        assert_eq!(body["passengers"][0]["origin"], "FRA");
    }

    #[tokio::test]
    async fn manifest_defaults_to_two_hundred() {
        let (status, body) = post_manifest(
            r#"{"origin":"FRA","destination":"JFK","flightNumber":"LH400","date":"2025-03-01"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 200);
    }

    #[tokio::test]
    async fn manifest_rejects_bad_requests() {
        let (status, _) = post_manifest(r#"{"origin":"FRA"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post_manifest(
            r#"{"origin":"FRA","destination":"JFK","flightNumber":"LH1","date":"d","count":5000}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("1000"));
    }
}
