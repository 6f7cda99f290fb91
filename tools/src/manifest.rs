//! Synthetic passenger manifests for a disrupted flight. Names and needs are
//! drawn at random; nothing here refers to a real person.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::flights::CabinClass;

pub const FIRST_NAMES: [&str; 26] = [
    "Alice", "Bob", "Carlos", "Diana", "Erik", "Fatima", "George", "Hannah", "Ivan", "Julia",
    "Kenji", "Lina", "Marcus", "Nadia", "Omar", "Priya", "Quinn", "Rosa", "Stefan", "Tanya",
    "Umar", "Vera", "Wei", "Xena", "Yuki", "Zara",
];

pub const LAST_NAMES: [&str; 26] = [
    "Anderson", "Bauer", "Chen", "Diaz", "Evans", "Fischer", "Garcia", "Hoffman", "Ibrahim",
    "Jensen", "Kim", "Lee", "Martinez", "Nguyen", "Olsson", "Patel", "Quinn", "Rivera", "Singh",
    "Torres", "Ueda", "Voss", "Wang", "Xu", "Yamamoto", "Zhao",
];

// Five in ten passengers have no special requirement.
const SPECIAL_REQUIREMENTS: [Option<&str>; 10] = [
    None,
    None,
    None,
    None,
    None,
    Some("Wheelchair assistance"),
    Some("Unaccompanied minor"),
    Some("Service animal"),
    Some("Medical oxygen"),
    Some("Bassinet seat"),
];

pub const DEFAULT_MANIFEST_SIZE: usize = 200;

const APP_SHARE: f64 = 0.65;
const PROACTIVE_CONSENT_SHARE: f64 = 0.85;
const CONNECTION_SHARE: f64 = 0.20;

/// Manifest loyalty tier, highest first. Declaration order is sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoyaltyTier {
    Platinum,
    Gold,
    Silver,
    General,
}

impl LoyaltyTier {
    const WEIGHTED: [(LoyaltyTier, f64); 4] = [
        (LoyaltyTier::Platinum, 0.08),
        (LoyaltyTier::Gold, 0.15),
        (LoyaltyTier::Silver, 0.22),
        (LoyaltyTier::General, 0.55),
    ];

    fn draw(rng: &mut impl Rng) -> Self {
        let r: f64 = rng.random();
        let mut cumulative = 0.0;
        for (tier, weight) in Self::WEIGHTED {
            cumulative += weight;
            if r <= cumulative {
                return tier;
            }
        }
        LoyaltyTier::General
    }

    pub fn seat_class(self) -> CabinClass {
        match self {
            LoyaltyTier::Platinum => CabinClass::Business,
            LoyaltyTier::Gold => CabinClass::PremiumEconomy,
            LoyaltyTier::Silver | LoyaltyTier::General => CabinClass::Economy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRisk {
    pub connecting_flight: String,
    pub connection_airport: String,
    /// Minutes available to make the connection.
    pub connection_time: u32,
    pub at_risk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub passenger_id: String,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub tier: LoyaltyTier,
    pub has_app: bool,
    pub consent_for_proactive: bool,
    pub special_requirements: Option<String>,
    pub connection_risk: Option<ConnectionRisk>,
    pub origin: String,
    pub destination: String,
    pub flight_number: String,
    pub date: String,
    pub seat_class: CabinClass,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRequest {
    pub origin: String,
    pub destination: String,
    pub flight_number: String,
    pub date: String,
    #[serde(default = "default_manifest_size")]
    pub count: usize,
}

fn default_manifest_size() -> usize {
    DEFAULT_MANIFEST_SIZE
}

fn pick<'a, T>(rng: &mut impl Rng, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

/// Builds `request.count` passengers, highest tier first. Ids are assigned
/// before sorting, so they are not in order afterwards.
pub fn generate_manifest(rng: &mut impl Rng, request: &ManifestRequest) -> Vec<Passenger> {
    let mut passengers: Vec<Passenger> = (1..=request.count)
        .map(|n| {
            let first_name = pick(rng, &FIRST_NAMES).to_string();
            let last_name = pick(rng, &LAST_NAMES).to_string();
            let tier = LoyaltyTier::draw(rng);
            let has_app = rng.random_bool(APP_SHARE);
            let consent_for_proactive = has_app && rng.random_bool(PROACTIVE_CONSENT_SHARE);
            let special_requirements = pick(rng, &SPECIAL_REQUIREMENTS).map(str::to_string);

            let connection_risk = rng.random_bool(CONNECTION_SHARE).then(|| ConnectionRisk {
                connecting_flight: format!("UA{}", rng.random_range(1000..=9999)),
                connection_airport: request.destination.clone(),
                connection_time: rng.random_range(30..150),
                at_risk: true,
            });

            Passenger {
                passenger_id: format!("PAX-{:04}", n),
                name: format!("{} {}", first_name, last_name),
                first_name,
                last_name,
                tier,
                has_app,
                consent_for_proactive,
                special_requirements,
                connection_risk,
                origin: request.origin.clone(),
                destination: request.destination.clone(),
                flight_number: request.flight_number.clone(),
                date: request.date.clone(),
                seat_class: tier.seat_class(),
            }
        })
        .collect();

    passengers.sort_by_key(|p| p.tier);
    passengers
}

/// A small demo set: up to two Platinum, one Gold and two General passengers.
pub fn focus_passengers(manifest: &[Passenger]) -> Vec<Passenger> {
    let take = |tier: LoyaltyTier, n: usize| {
        manifest
            .iter()
            .filter(move |p| p.tier == tier)
            .take(n)
            .cloned()
    };

    take(LoyaltyTier::Platinum, 2)
        .chain(take(LoyaltyTier::Gold, 1))
        .chain(take(LoyaltyTier::General, 2))
        .collect()
}
