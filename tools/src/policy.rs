use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use disruption_core::registry::{parse_args, Tool};
use disruption_core::services::KnowledgeBase;
use disruption_core::{Settings, ToolError};

pub const POLICY_UNAVAILABLE: &str = "I'm having trouble accessing the policy database \
     right now. Please try again or contact an agent.";
pub const POLICY_NOT_ENABLED: &str =
    "Knowledge base is not enabled. Please contact an agent for policy information.";

/// A policy document a fallback answer points the passenger to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyReference {
    pub title: &'static str,
    pub uri: &'static str,
}

const EU261_RIGHTS: PolicyReference = PolicyReference {
    title: "EU Regulation 261/2004: Passenger Rights",
    uri: "knowledge-base/eu261-regulation.md",
};
const COMPENSATION_POLICY: PolicyReference = PolicyReference {
    title: "Airline Compensation Policy",
    uri: "knowledge-base/airline-policy.md",
};
const REFUNDS_FAQ: PolicyReference = PolicyReference {
    title: "Disruption FAQ: Refunds & Claims",
    uri: "knowledge-base/disruption-faq.md",
};
const CARE_FAQ: PolicyReference = PolicyReference {
    title: "Disruption FAQ: Care & Assistance",
    uri: "knowledge-base/disruption-faq.md",
};
const EU261_DUTY_OF_CARE: PolicyReference = PolicyReference {
    title: "EU Regulation 261/2004: Duty of Care",
    uri: "knowledge-base/eu261-regulation.md",
};
const GDPR_HANDLING: PolicyReference = PolicyReference {
    title: "GDPR Data Handling Policy",
    uri: "knowledge-base/gdpr-data-handling.md",
};
const GENERAL_POLICY: PolicyReference = PolicyReference {
    title: "Airline Policy: General",
    uri: "knowledge-base/airline-policy.md",
};

// Keywords (matched as lowercase substrings) and the documents they point to.
const REFERENCE_RULES: [(&[&str], &[PolicyReference]); 4] = [
    (
        &["eu261", "compensation", "entitled", "rights"],
        &[EU261_RIGHTS, COMPENSATION_POLICY],
    ),
    (&["refund", "how long", "claim"], &[REFUNDS_FAQ]),
    (
        &["hotel", "meal", "care", "assistance"],
        &[CARE_FAQ, EU261_DUTY_OF_CARE],
    ),
    (&["gdpr", "data", "privacy"], &[GDPR_HANDLING]),
];

/// Static references for a query the knowledge base could not answer.
/// Never empty: unmatched queries get the general policy document.
pub fn fallback_citations(query: &str) -> Vec<PolicyReference> {
    let query = query.to_lowercase();
    let mut citations: Vec<PolicyReference> = REFERENCE_RULES
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|keyword| query.contains(keyword)))
        .flat_map(|(_, references)| references.iter().copied())
        .collect();

    if citations.is_empty() {
        citations.push(GENERAL_POLICY);
    }
    citations
}

#[derive(Debug, Deserialize)]
struct PolicyArgs {
    query: String,
}

/// Answers airline policy questions from the knowledge base.
pub struct QueryPolicy {
    enabled: bool,
    knowledge_base: Arc<dyn KnowledgeBase>,
}

impl QueryPolicy {
    pub fn new(settings: &Settings, knowledge_base: Arc<dyn KnowledgeBase>) -> Self {
        Self {
            enabled: settings.knowledge_base_enabled(),
            knowledge_base,
        }
    }
}

#[async_trait]
impl Tool for QueryPolicy {
    fn name(&self) -> &'static str {
        "query_policy"
    }

    fn description(&self) -> &'static str {
        "Query the airline policy knowledge base"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Policy question in plain language" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: PolicyArgs = parse_args(self.name(), input)?;
        info!("[TOOL] query_policy: {}", args.query);

        if !self.enabled {
            return Ok(json!({
                "success": true,
                "query": args.query,
                "answer": POLICY_NOT_ENABLED,
                "citations": fallback_citations(&args.query),
                "fallback": true,
            }));
        }

        match self.knowledge_base.retrieve_and_generate(&args.query).await {
            Ok(answer) => Ok(json!({
                "success": true,
                "query": args.query,
                "answer": answer.answer,
                "citations": answer.citations,
            })),
            Err(e) => {
                error!("Knowledge base query failed: {}", e);
                Ok(json!({
                    "success": false,
                    "query": args.query,
                    "answer": POLICY_UNAVAILABLE,
                    "citations": fallback_citations(&args.query),
                    "error": e.to_string(),
                }))
            }
        }
    }
}
