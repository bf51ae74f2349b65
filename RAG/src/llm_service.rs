use crate::models::*;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::env;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Turns retrieved sections and a question into an answer.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate_answer(&self, retrieved: &[RetrievedSection], query: &str) -> Result<String>;
}

pub fn build_prompt(retrieved: &[RetrievedSection], query: &str) -> String {
    let context = retrieved
        .iter()
        .map(|section| section.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "Answer the following question based on the given content:\n\nContent: {}\n\nQuestion: {}\nAnswer:",
        context, query
    )
}

pub struct GeminiService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiService {
    pub fn new() -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable not set"))?;
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());

        Ok(Self::with_settings(api_key, model, GEMINI_BASE_URL))
    }

    pub fn with_settings(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AnswerGenerator for GeminiService {
    async fn generate_answer(&self, retrieved: &[RetrievedSection], query: &str) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: build_prompt(retrieved, query),
                }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                temperature: 0.7,
                max_output_tokens: 150,
            }),
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        // The key travels in a header so it never ends up in error messages.
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            let error_text = response.text().await.map_err(reqwest::Error::without_url)?;
            return Err(anyhow::anyhow!("Gemini API error: {}", error_text));
        }

        let gemini_response: GeminiResponse =
            response.json().await.map_err(reqwest::Error::without_url)?;

        let answer = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .unwrap_or_else(|| "No response generated".to_string());

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn prompt_joins_retrieved_content() {
        let retrieved = vec![
            RetrievedSection {
                section_key: "section_1_1".to_string(),
                section_title: "Section 1.1".to_string(),
                document: "a.pdf".to_string(),
                similarity_score: 0.9,
                content: "Total is 42.".to_string(),
            },
            RetrievedSection {
                section_key: "section_1_2".to_string(),
                section_title: "Section 1.2".to_string(),
                document: "b.pdf".to_string(),
                similarity_score: 0.5,
                content: "Due in 30 days.".to_string(),
            },
        ];

        let prompt = build_prompt(&retrieved, "What is the total?");
        assert_eq!(
            prompt,
            "Answer the following question based on the given content:\n\n\
             Content: Total is 42. Due in 30 days.\n\n\
             Question: What is the total?\nAnswer:"
        );
    }

    #[tokio::test]
    async fn network_errors_do_not_reveal_the_api_key() {
        // Nothing listens on port 1.
        let service = GeminiService::with_settings("SECRET-KEY-123", "m", "http://127.0.0.1:1");

        let err = service.generate_answer(&[], "q").await.unwrap_err();
        assert!(!format!("{:#}", err).contains("SECRET-KEY-123"));
        assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
    }

    #[tokio::test]
    async fn api_key_is_sent_as_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/m:generateContent"))
            .and(header(API_KEY_HEADER, "SECRET-KEY-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "  42 \n" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = GeminiService::with_settings("SECRET-KEY-123", "m", server.uri());
        let answer = service.generate_answer(&[], "What is the total?").await.unwrap();
        assert_eq!(answer, "42");

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].url.query().is_none());
    }
}
