//! Mock rebooking inventory.
//!
//! The shape of each option is fixed, the content is random. Scores carry no
//! meaning beyond giving the agent something to rank by.

use chrono::{Duration, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const CARRIERS: [&str; 5] = ["UA", "LH", "BA", "AF", "DL"];
pub const HUBS: [&str; 7] = ["ORD", "ATL", "DFW", "LAX", "MUC", "LHR", "CDG"];

/// Option labels run A..Z, so at most this many options per call.
pub const MAX_OPTIONS: usize = 26;

/// Loyalty tier of the disrupted passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Platinum,
    Gold,
    Base,
}

impl Tier {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("platinum") {
            Tier::Platinum
        } else if name.eq_ignore_ascii_case("gold") {
            Tier::Gold
        } else {
            Tier::Base
        }
    }

    // Duplicates weight the draw.
    fn cabin_pool(self) -> &'static [CabinClass] {
        match self {
            Tier::Platinum => &[CabinClass::Business, CabinClass::Business, CabinClass::First],
            Tier::Gold => &[CabinClass::PremiumEconomy, CabinClass::Business],
            Tier::Base => &[CabinClass::Economy, CabinClass::PremiumEconomy],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CabinClass {
    Economy,
    #[serde(rename = "Premium Economy")]
    PremiumEconomy,
    Business,
    First,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOption {
    pub option_id: String,
    pub routing: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub stops: u8,
    pub flights: Vec<String>,
    #[serde(rename = "class")]
    pub cabin: CabinClass,
    pub cost: u32,
    pub availability: String,
    pub compatibility: f64,
    pub confidence: f64,
}

fn pick<'a, T>(rng: &mut impl Rng, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

fn flight_number(rng: &mut impl Rng) -> String {
    format!("{}{}", pick(rng, &CARRIERS), rng.random_range(1000..=9999))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `H:MM:SS`, hours unpadded.
fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds();
    format!("{}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

/// Generates `count` options (capped at [`MAX_OPTIONS`]) departing after
/// `baseline`, sorted by compatibility, best first.
///
/// Labels are handed out in generation order; the first two options are
/// always direct.
pub fn generate_flight_options(
    rng: &mut impl Rng,
    origin: &str,
    destination: &str,
    tier: Tier,
    count: usize,
    baseline: NaiveDateTime,
) -> Vec<FlightOption> {
    let count = count.min(MAX_OPTIONS);
    let mut options = Vec::with_capacity(count);

    for i in 0..count {
        let option_id = char::from(b'A' + i as u8).to_string();
        let depart = baseline + Duration::minutes(rng.random_range(15..=240));

        let is_direct = i < 2 || rng.random_bool(0.4);
        let (routing, stops, flights, elapsed) = if is_direct {
            let flights = vec![flight_number(rng)];
            let elapsed = Duration::hours(rng.random_range(6..=10));
            (format!("{}→{} (direct)", origin, destination), 0, flights, elapsed)
        } else {
            let hubs: Vec<&str> = HUBS
                .iter()
                .copied()
                .filter(|hub| *hub != origin && *hub != destination)
                .collect();
            let hub = *pick(rng, &hubs);
            let flights = vec![flight_number(rng), flight_number(rng)];

            let first_leg = Duration::hours(rng.random_range(2..=5));
            let layover = Duration::hours(rng.random_range(1..=3));
            let second_leg = Duration::hours(rng.random_range(3..=6));
            (
                format!("{}→{}→{}", origin, hub, destination),
                1,
                flights,
                first_leg + layover + second_leg,
            )
        };
        let arrive = depart + elapsed;

        let cabin = *pick(rng, tier.cabin_pool());
        // Upper tiers rebook on award fares.
        let cost = match tier {
            Tier::Platinum | Tier::Gold => 0,
            Tier::Base => rng.random_range(0..=300),
        };

        options.push(FlightOption {
            option_id,
            routing,
            departure: depart.format("%H:%M").to_string(),
            arrival: arrive.format("%H:%M").to_string(),
            duration: format_elapsed(elapsed),
            stops,
            flights,
            cabin,
            cost,
            availability: "confirmed".to_string(),
            compatibility: round2(rng.random_range(0.7..=0.98)),
            confidence: round2(rng.random_range(0.8..=0.95)),
        });
    }

    options.sort_by(|a, b| b.compatibility.total_cmp(&a.compatibility));
    options
}
