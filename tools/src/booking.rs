//! Rebooking, confirmation and escalation. All three are mock data
//! generators: nothing is looked up and nothing is persisted.

use async_trait::async_trait;
use chrono::{Duration, Local, SecondsFormat, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use disruption_core::registry::{parse_args, Tool};
use disruption_core::ToolError;

use crate::flights::{generate_flight_options, Tier};
use crate::ids::{generate_escalation_id, generate_pnr};
use crate::rng::SharedRng;

fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

// --- generate_rebooking_options ---

#[derive(Debug, Deserialize)]
struct RebookingArgs {
    passenger_id: String,
    origin: String,
    destination: String,
    tier: String,
    /// Free-form; only logged.
    #[serde(default)]
    constraints: Option<Value>,
    /// Overrides the usual random 4-6.
    #[serde(default)]
    count: Option<usize>,
}

pub struct GenerateRebookingOptions {
    rng: SharedRng,
}

impl GenerateRebookingOptions {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl Tool for GenerateRebookingOptions {
    fn name(&self) -> &'static str {
        "generate_rebooking_options"
    }

    fn description(&self) -> &'static str {
        "Generate rebooking flight options for a disrupted passenger"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "passenger_id": { "type": "string" },
                "origin": { "type": "string", "description": "IATA code" },
                "destination": { "type": "string", "description": "IATA code" },
                "tier": { "type": "string", "description": "Platinum, Gold or any other tier" },
                "constraints": {
                    "type": "array",
                    "description": "Passenger constraints, logged only"
                },
                "count": { "type": "integer", "minimum": 0, "maximum": 26 }
            },
            "required": ["passenger_id", "origin", "destination", "tier"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: RebookingArgs = parse_args(self.name(), input)?;
        info!(
            "[TOOL] generate_rebooking_options: {}, {}->{}, tier={}, constraints={}",
            args.passenger_id,
            args.origin,
            args.destination,
            args.tier,
            args.constraints.as_ref().unwrap_or(&serde_json::Value::Null)
        );

        let baseline = Local::now().naive_local() + Duration::hours(2);
        let tier = Tier::from_name(&args.tier);
        let options = self.rng.with(|rng| {
            let count = args.count.unwrap_or_else(|| rng.random_range(4..=6));
            generate_flight_options(rng, &args.origin, &args.destination, tier, count, baseline)
        });

        Ok(json!({
            "success": true,
            "passenger_id": args.passenger_id,
            "count": options.len(),
            "options": options,
        }))
    }
}

// --- confirm_booking ---

#[derive(Debug, Deserialize)]
struct ConfirmArgs {
    passenger_id: String,
    option_id: String,
}

/// Confirms unconditionally; `option_id` is not checked against any
/// previously generated options.
pub struct ConfirmBooking {
    rng: SharedRng,
}

impl ConfirmBooking {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl Tool for ConfirmBooking {
    fn name(&self) -> &'static str {
        "confirm_booking"
    }

    fn description(&self) -> &'static str {
        "Confirm a rebooking selection"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "passenger_id": { "type": "string" },
                "option_id": { "type": "string", "description": "Label of the chosen option" }
            },
            "required": ["passenger_id", "option_id"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: ConfirmArgs = parse_args(self.name(), input)?;
        info!("[TOOL] confirm_booking: {}, option={}", args.passenger_id, args.option_id);

        let pnr = self.rng.with(|rng| generate_pnr(rng));

        Ok(json!({
            "success": true,
            "passenger_id": args.passenger_id,
            "option_id": args.option_id,
            "pnr": pnr,
            "status": "CONFIRMED",
            "confirmed_at": utc_timestamp(),
        }))
    }
}

// --- create_escalation ---

const DEFAULT_PRIORITY: &str = "NORMAL";

#[derive(Debug, Deserialize)]
struct EscalationArgs {
    passenger_id: String,
    reason: String,
    /// Absent or null means `NORMAL`.
    #[serde(default)]
    priority: Option<String>,
}

pub struct CreateEscalation {
    rng: SharedRng,
}

impl CreateEscalation {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl Tool for CreateEscalation {
    fn name(&self) -> &'static str {
        "create_escalation"
    }

    fn description(&self) -> &'static str {
        "Create an escalation ticket for a human agent"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "passenger_id": { "type": "string" },
                "reason": { "type": "string" },
                "priority": { "type": "string", "default": DEFAULT_PRIORITY }
            },
            "required": ["passenger_id", "reason"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: EscalationArgs = parse_args(self.name(), input)?;
        let priority = args.priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string());
        info!("[TOOL] create_escalation: {}, priority={}", args.passenger_id, priority);

        let escalation_id = self.rng.with(|rng| generate_escalation_id(rng));

        Ok(json!({
            "success": true,
            "escalation_id": escalation_id,
            "passenger_id": args.passenger_id,
            "reason": args.reason,
            "priority": priority,
            "status": "PENDING",
            "created_at": utc_timestamp(),
        }))
    }
}
