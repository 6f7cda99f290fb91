//! Sentiment and translation tools. Both degrade to a neutral / no-op
//! result when the backing service is disabled or fails.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use disruption_core::registry::{parse_args, Tool};
use disruption_core::services::{SentimentAnalyzer, Translator};
use disruption_core::util::preview;
use disruption_core::{Settings, ToolError};

#[derive(Debug, Deserialize)]
struct SentimentArgs {
    text: String,
}

pub struct AnalyzePassengerSentiment {
    enabled: bool,
    analyzer: Arc<dyn SentimentAnalyzer>,
}

impl AnalyzePassengerSentiment {
    pub fn new(settings: &Settings, analyzer: Arc<dyn SentimentAnalyzer>) -> Self {
        Self {
            enabled: settings.use_comprehend,
            analyzer,
        }
    }
}

#[async_trait]
impl Tool for AnalyzePassengerSentiment {
    fn name(&self) -> &'static str {
        "analyze_passenger_sentiment"
    }

    fn description(&self) -> &'static str {
        "Analyze the sentiment of a passenger message"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: SentimentArgs = parse_args(self.name(), input)?;
        info!("[TOOL] analyze_passenger_sentiment: {}...", preview(&args.text, 50));

        if !self.enabled {
            return Ok(json!({
                "success": true,
                "sentiment": "NEUTRAL",
                "scores": { "neutral": 1.0 },
                "fallback": true,
            }));
        }

        match self.analyzer.detect_sentiment(&args.text).await {
            Ok(analysis) => Ok(json!({
                "success": true,
                "sentiment": analysis.sentiment,
                "scores": analysis.scores,
                "text": args.text,
            })),
            Err(e) => {
                error!("Sentiment analysis failed: {}", e);
                Ok(json!({
                    "success": false,
                    "sentiment": "NEUTRAL",
                    "error": e.to_string(),
                }))
            }
        }
    }
}

fn auto_detect() -> String {
    "auto".to_string()
}

#[derive(Debug, Deserialize)]
struct TranslateArgs {
    text: String,
    target_language: String,
    #[serde(default = "auto_detect")]
    source_language: String,
}

pub struct TranslateMessage {
    enabled: bool,
    translator: Arc<dyn Translator>,
}

impl TranslateMessage {
    pub fn new(settings: &Settings, translator: Arc<dyn Translator>) -> Self {
        Self {
            enabled: settings.use_translate,
            translator,
        }
    }
}

#[async_trait]
impl Tool for TranslateMessage {
    fn name(&self) -> &'static str {
        "translate_message"
    }

    fn description(&self) -> &'static str {
        "Translate a message between languages"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": { "type": "string" },
                "target_language": { "type": "string", "description": "ISO 639-1 code" },
                "source_language": { "type": "string", "default": "auto" }
            },
            "required": ["text", "target_language"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: TranslateArgs = parse_args(self.name(), input)?;
        info!(
            "[TOOL] translate_message: {}->{}",
            args.source_language, args.target_language
        );

        if !self.enabled {
            return Ok(json!({
                "success": true,
                "original": args.text,
                "translated": args.text,
                "fallback": true,
            }));
        }

        match self
            .translator
            .translate(&args.text, &args.source_language, &args.target_language)
            .await
        {
            Ok(translation) => Ok(json!({
                "success": true,
                "original": args.text,
                "translated": translation.translated_text,
                "source_language": translation.source_language,
                "target_language": args.target_language,
            })),
            Err(e) => {
                error!("Translation failed: {}", e);
                Ok(json!({
                    "success": false,
                    "original": args.text,
                    "translated": args.text,
                    "error": e.to_string(),
                }))
            }
        }
    }
}
