//! Contracts and HTTP clients for the managed AI services the tools delegate to.
//!
//! Every collaborator sits behind a trait so tools can be exercised against
//! in-process doubles. The HTTP clients speak the services' JSON contracts and
//! authenticate through [`RequestAuth`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::ServiceError;
use crate::signing::RequestAuth;
use crate::util::preview;

const KNOWLEDGE_BASE: &str = "knowledge base";
const COMPREHEND: &str = "comprehend";
const TRANSLATE: &str = "translate";

const DETECT_SENTIMENT_TARGET: &str = "Comprehend_20171127.DetectSentiment";
const TRANSLATE_TEXT_TARGET: &str = "AWSShineFrontendService_20170701.TranslateText";
const AWS_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// --- Contracts ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub text: String,
    pub location: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    pub mixed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: String,
    pub scores: SentimentScores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub translated_text: String,
    pub source_language: String,
}

/// Retrieval-augmented answers over the airline policy documents.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn retrieve_and_generate(&self, query: &str) -> Result<PolicyAnswer, ServiceError>;
}

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn detect_sentiment(&self, text: &str) -> Result<SentimentAnalysis, ServiceError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// `source` may be `"auto"` to let the service detect the language.
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Translation, ServiceError>;
}

/// The collaborators handed to the tools at construction time.
#[derive(Clone)]
pub struct Services {
    pub knowledge_base: Arc<dyn KnowledgeBase>,
    pub sentiment: Arc<dyn SentimentAnalyzer>,
    pub translator: Arc<dyn Translator>,
}

impl Services {
    /// HTTP-backed services for the configured region and endpoints.
    pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
        let http = http_client()?;

        let knowledge_base = HttpKnowledgeBase {
            client: JsonClient {
                http: http.clone(),
                endpoint: settings.knowledge_base_endpoint.clone().unwrap_or_else(|| {
                    format!("https://bedrock-agent-runtime.{}.amazonaws.com", settings.region)
                }),
                auth: RequestAuth::resolve(
                    settings.bedrock_bearer_token.clone(),
                    settings.aws_credentials.clone(),
                    &settings.region,
                    "bedrock",
                ),
            },
            knowledge_base_id: settings.knowledge_base_id.clone(),
            model_arn: settings.model_arn(),
        };

        let sentiment = HttpSentimentAnalyzer {
            client: JsonClient {
                http: http.clone(),
                endpoint: settings.comprehend_endpoint.clone().unwrap_or_else(|| {
                    format!("https://comprehend.{}.amazonaws.com", settings.region)
                }),
                auth: RequestAuth::resolve(
                    None,
                    settings.aws_credentials.clone(),
                    &settings.region,
                    "comprehend",
                ),
            },
        };

        let translator = HttpTranslator {
            client: JsonClient {
                http,
                endpoint: settings.translate_endpoint.clone().unwrap_or_else(|| {
                    format!("https://translate.{}.amazonaws.com", settings.region)
                }),
                auth: RequestAuth::resolve(
                    None,
                    settings.aws_credentials.clone(),
                    &settings.region,
                    "translate",
                ),
            },
        };

        debug!(
            "Service auth: knowledge base {}, comprehend {}, translate {}",
            knowledge_base.client.auth.describe(),
            sentiment.client.auth.describe(),
            translator.client.auth.describe()
        );

        Ok(Self {
            knowledge_base: Arc::new(knowledge_base),
            sentiment: Arc::new(sentiment),
            translator: Arc::new(translator),
        })
    }
}

pub(crate) fn http_client() -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ServiceError::transport("http client", e))
}

// --- HTTP plumbing ---

#[derive(Clone)]
struct JsonClient {
    http: reqwest::Client,
    endpoint: String,
    auth: RequestAuth,
}

impl JsonClient {
    async fn post(
        &self,
        service: &'static str,
        path: &str,
        amz_target: Option<&str>,
        body: &Value,
    ) -> Result<Value, ServiceError> {
        let url = format!("{}{}", self.endpoint.trim_end_matches('/'), path);
        debug!("POST {} ({})", url, service);

        let builder = self.http.post(&url);
        let builder = match amz_target {
            Some(target) => builder
                .header("X-Amz-Target", target)
                .header(reqwest::header::CONTENT_TYPE, AWS_JSON_CONTENT_TYPE)
                .body(body.to_string()),
            None => builder.json(body),
        };
        let request = builder
            .build()
            .map_err(|e| ServiceError::transport(service, e))?;
        let request = self.auth.authorize(service, request)?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| ServiceError::transport(service, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::transport(service, e))?;

        if !status.is_success() {
            return Err(ServiceError::Status {
                service,
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ServiceError::decode(service, e))
    }
}

pub struct HttpKnowledgeBase {
    client: JsonClient,
    knowledge_base_id: String,
    model_arn: String,
}

#[async_trait]
impl KnowledgeBase for HttpKnowledgeBase {
    async fn retrieve_and_generate(&self, query: &str) -> Result<PolicyAnswer, ServiceError> {
        if self.knowledge_base_id.is_empty() {
            return Err(ServiceError::NotConfigured {
                service: KNOWLEDGE_BASE,
                reason: "KNOWLEDGE_BASE_ID is empty".into(),
            });
        }

        info!("Querying knowledge base {}: {}", self.knowledge_base_id, query);
        let request =
            retrieve_and_generate_request(query, &self.knowledge_base_id, &self.model_arn);
        let response = self
            .client
            .post(KNOWLEDGE_BASE, "/retrieveAndGenerate", None, &request)
            .await?;

        let answer = parse_retrieve_and_generate(&response);
        info!("Knowledge base response: {}...", preview(&answer.answer, 100));
        Ok(answer)
    }
}

pub struct HttpSentimentAnalyzer {
    client: JsonClient,
}

#[async_trait]
impl SentimentAnalyzer for HttpSentimentAnalyzer {
    async fn detect_sentiment(&self, text: &str) -> Result<SentimentAnalysis, ServiceError> {
        info!("Analyzing sentiment: {}...", preview(text, 50));
        let request = json!({ "Text": text, "LanguageCode": "en" });
        let response = self
            .client
            .post(COMPREHEND, "/", Some(DETECT_SENTIMENT_TARGET), &request)
            .await?;

        let analysis = parse_detect_sentiment(&response);
        info!("Sentiment: {}", analysis.sentiment);
        Ok(analysis)
    }
}

pub struct HttpTranslator {
    client: JsonClient,
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Translation, ServiceError> {
        info!("Translating {} -> {}: {}...", source, target, preview(text, 50));
        let request = json!({
            "Text": text,
            "SourceLanguageCode": source,
            "TargetLanguageCode": target,
        });
        let response = self
            .client
            .post(TRANSLATE, "/", Some(TRANSLATE_TEXT_TARGET), &request)
            .await?;

        let translation = parse_translate_text(&response, text, source);
        info!("Translation result: {}...", preview(&translation.translated_text, 50));
        Ok(translation)
    }
}

// --- Wire shapes ---

pub fn retrieve_and_generate_request(
    query: &str,
    knowledge_base_id: &str,
    model_arn: &str,
) -> Value {
    json!({
        "input": { "text": query },
        "retrieveAndGenerateConfiguration": {
            "type": "KNOWLEDGE_BASE",
            "knowledgeBaseConfiguration": {
                "knowledgeBaseId": knowledge_base_id,
                "modelArn": model_arn,
            }
        }
    })
}

/// Flattens `citations[].retrievedReferences[]` into text + location pairs.
pub fn parse_retrieve_and_generate(response: &Value) -> PolicyAnswer {
    let answer = response["output"]["text"].as_str().unwrap_or_default().to_string();

    let citations = response["citations"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|citation| citation["retrievedReferences"].as_array().into_iter().flatten())
        .map(|reference| Citation {
            text: reference["content"]["text"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            location: reference
                .get("location")
                .cloned()
                .unwrap_or_else(|| json!({})),
        })
        .collect();

    PolicyAnswer { answer, citations }
}

pub fn parse_detect_sentiment(response: &Value) -> SentimentAnalysis {
    let score = |key: &str| response["SentimentScore"][key].as_f64().unwrap_or(0.0);

    SentimentAnalysis {
        sentiment: response["Sentiment"].as_str().unwrap_or("NEUTRAL").to_string(),
        scores: SentimentScores {
            positive: score("Positive"),
            negative: score("Negative"),
            neutral: score("Neutral"),
            mixed: score("Mixed"),
        },
    }
}

/// Missing fields fall back to the original text and requested source code.
pub fn parse_translate_text(response: &Value, original: &str, source: &str) -> Translation {
    Translation {
        translated_text: response["TranslatedText"]
            .as_str()
            .unwrap_or(original)
            .to_string(),
        source_language: response["SourceLanguageCode"]
            .as_str()
            .unwrap_or(source)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_knowledge_base_configuration() {
        let request = retrieve_and_generate_request("baggage?", "KB1", "arn:model");
        assert_eq!(request["input"]["text"], "baggage?");
        let config = &request["retrieveAndGenerateConfiguration"];
        assert_eq!(config["type"], "KNOWLEDGE_BASE");
        assert_eq!(config["knowledgeBaseConfiguration"]["knowledgeBaseId"], "KB1");
        assert_eq!(config["knowledgeBaseConfiguration"]["modelArn"], "arn:model");
    }

    #[test]
    fn citations_are_flattened() {
        let response = json!({
            "output": { "text": "You get a voucher." },
            "citations": [
                { "retrievedReferences": [
                    {
                        "content": { "text": "Vouchers apply after 3h." },
                        "location": { "type": "S3" }
                    },
                    { "content": {} }
                ]},
                { "retrievedReferences": [] },
                { "generatedResponsePart": {} }
            ]
        });

        let answer = parse_retrieve_and_generate(&response);
        assert_eq!(answer.answer, "You get a voucher.");
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(answer.citations[0].text, "Vouchers apply after 3h.");
        assert_eq!(answer.citations[0].location, json!({ "type": "S3" }));
        assert_eq!(answer.citations[1].text, "");
        assert_eq!(answer.citations[1].location, json!({}));
    }

    #[test]
    fn empty_knowledge_base_response_is_empty_answer() {
        let answer = parse_retrieve_and_generate(&json!({}));
        assert_eq!(answer.answer, "");
        assert!(answer.citations.is_empty());
    }

    #[test]
    fn sentiment_scores_default_to_zero() {
        let analysis = parse_detect_sentiment(&json!({
            "Sentiment": "NEGATIVE",
            "SentimentScore": { "Negative": 0.91, "Neutral": 0.05 }
        }));
        assert_eq!(analysis.sentiment, "NEGATIVE");
        assert_eq!(analysis.scores.negative, 0.91);
        assert_eq!(analysis.scores.neutral, 0.05);
        assert_eq!(analysis.scores.positive, 0.0);
        assert_eq!(analysis.scores.mixed, 0.0);

        assert_eq!(parse_detect_sentiment(&json!({})).sentiment, "NEUTRAL");
    }

    #[test]
    fn translation_falls_back_to_input() {
        let translation = parse_translate_text(
            &json!({ "TranslatedText": "Hola", "SourceLanguageCode": "en" }),
            "Hello",
            "auto",
        );
        assert_eq!(translation.translated_text, "Hola");
        assert_eq!(translation.source_language, "en");

        let fallback = parse_translate_text(&json!({}), "Hello", "auto");
        assert_eq!(fallback.translated_text, "Hello");
        assert_eq!(fallback.source_language, "auto");
    }

    /// Accepts one request, answers it with `reply` and returns the request
    /// head, lowercased.
    async fn serve_once(listener: tokio::net::TcpListener, reply: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            received.extend_from_slice(&chunk[..n]);
            if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&received[..head_end]).to_lowercase();
        let content_length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0);
        while received.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\n\
             content-type: application/json\r\n\
             content-length: {}\r\n\
             connection: close\r\n\r\n{}",
            reply.len(),
            reply
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        head
    }

    #[tokio::test]
    async fn comprehend_requests_are_signed_with_environment_credentials() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_once(listener, r#"{"Sentiment":"NEGATIVE"}"#));

        let settings = Settings {
            comprehend_endpoint: Some(endpoint),
            aws_credentials: Some(aws_credential_types::Credentials::new(
                "AKIDEXAMPLE",
                "secret",
                None,
                None,
                "test",
            )),
            ..Settings::default()
        };
        let services = Services::from_settings(&settings).unwrap();
        let analysis = services.sentiment.detect_sentiment("late again").await.unwrap();
        assert_eq!(analysis.sentiment, "NEGATIVE");

        let head = server.await.unwrap();
        assert!(head.contains("authorization: aws4-hmac-sha256 credential=akidexample/"));
        assert!(head.contains("/us-east-1/comprehend/aws4_request"));
        assert!(head.contains("x-amz-date:"));
        assert!(head.contains("x-amz-target: comprehend_20171127.detectsentiment"));
    }

    #[tokio::test]
    async fn knowledge_base_without_id_is_not_configured() {
        let services = Services::from_settings(&Settings::default()).unwrap();
        let err = services
            .knowledge_base
            .retrieve_and_generate("anything")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotConfigured { .. }));
    }
}
