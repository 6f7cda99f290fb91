//! In-process service doubles for tool tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use disruption_core::services::{
    Citation, KnowledgeBase, PolicyAnswer, SentimentAnalysis, SentimentAnalyzer, SentimentScores,
    Translation, Translator,
};
use disruption_core::{ServiceError, Services};

pub struct StubKnowledgeBase;

#[async_trait]
impl KnowledgeBase for StubKnowledgeBase {
    async fn retrieve_and_generate(&self, query: &str) -> Result<PolicyAnswer, ServiceError> {
        Ok(PolicyAnswer {
            answer: format!("Policy says: {}", query),
            citations: vec![Citation {
                text: "Section 4.2".into(),
                location: json!({ "type": "S3" }),
            }],
        })
    }
}

pub struct StubSentiment;

#[async_trait]
impl SentimentAnalyzer for StubSentiment {
    async fn detect_sentiment(&self, _text: &str) -> Result<SentimentAnalysis, ServiceError> {
        Ok(SentimentAnalysis {
            sentiment: "NEGATIVE".into(),
            scores: SentimentScores {
                positive: 0.01,
                negative: 0.95,
                neutral: 0.03,
                mixed: 0.01,
            },
        })
    }
}

pub struct StubTranslator;

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(
        &self,
        text: &str,
        _source: &str,
        target: &str,
    ) -> Result<Translation, ServiceError> {
        Ok(Translation {
            translated_text: format!("[{}] {}", target, text),
            source_language: "en".into(),
        })
    }
}

/// Every call fails with a 503.
pub struct FailingServices;

fn unavailable(service: &'static str) -> ServiceError {
    ServiceError::Status {
        service,
        status: 503,
        body: "Service Unavailable".into(),
    }
}

#[async_trait]
impl KnowledgeBase for FailingServices {
    async fn retrieve_and_generate(&self, _query: &str) -> Result<PolicyAnswer, ServiceError> {
        Err(unavailable("knowledge base"))
    }
}

#[async_trait]
impl SentimentAnalyzer for FailingServices {
    async fn detect_sentiment(&self, _text: &str) -> Result<SentimentAnalysis, ServiceError> {
        Err(unavailable("comprehend"))
    }
}

#[async_trait]
impl Translator for FailingServices {
    async fn translate(
        &self,
        _text: &str,
        _source: &str,
        _target: &str,
    ) -> Result<Translation, ServiceError> {
        Err(unavailable("translate"))
    }
}

impl FailingServices {
    pub fn knowledge_base(&self) -> Arc<dyn KnowledgeBase> {
        Arc::new(FailingServices)
    }

    pub fn sentiment(&self) -> Arc<dyn SentimentAnalyzer> {
        Arc::new(FailingServices)
    }

    pub fn translator(&self) -> Arc<dyn Translator> {
        Arc::new(FailingServices)
    }
}

pub fn stub_services() -> Services {
    Services {
        knowledge_base: Arc::new(StubKnowledgeBase),
        sentiment: Arc::new(StubSentiment),
        translator: Arc::new(StubTranslator),
    }
}

pub fn failing_services() -> Services {
    Services {
        knowledge_base: Arc::new(FailingServices),
        sentiment: Arc::new(FailingServices),
        translator: Arc::new(FailingServices),
    }
}
