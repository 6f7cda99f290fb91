//! The six tools the disruption agent can call, the registry that exposes
//! them by name, and the synthetic passenger manifest.

pub mod booking;
pub mod flights;
pub mod ids;
pub mod language;
pub mod manifest;
pub mod policy;
pub mod rng;

#[cfg(test)]
mod testing;

use disruption_core::{Registry, Services, Settings};

pub use rng::SharedRng;

/// The production registry, with OS-seeded randomness.
pub fn default_registry(settings: &Settings, services: &Services) -> Registry {
    registry_with_rng(settings, services, SharedRng::from_entropy())
}

/// Same tool set with caller-supplied randomness, for reproducible runs.
pub fn registry_with_rng(settings: &Settings, services: &Services, rng: SharedRng) -> Registry {
    Registry::builder()
        .register(booking::GenerateRebookingOptions::new(rng.clone()))
        .register(policy::QueryPolicy::new(settings, services.knowledge_base.clone()))
        .register(language::AnalyzePassengerSentiment::new(settings, services.sentiment.clone()))
        .register(language::TranslateMessage::new(settings, services.translator.clone()))
        .register(booking::ConfirmBooking::new(rng.clone()))
        .register(booking::CreateEscalation::new(rng))
        .build()
}
