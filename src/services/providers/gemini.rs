/// Gemini generation gateway with credential rotation
///
/// The credential pool is parsed once from a comma-delimited value and
/// iterated in fixed order on every call: a transport error or non-success
/// status moves on to the next key, the first success returns immediately.
/// There is no backoff and no per-session disabling of bad keys, so a
/// consistently invalid key costs one wasted attempt per call.
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    services::providers::TextGenerator,
};

/// Splits a delimited credential value into the ordered pool.
/// Whitespace around segments is ignored; empty segments are dropped.
pub fn parse_credential_pool(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Request body for the generateContent endpoint
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    pub response_mime_type: String,
}

impl GenerationRequest {
    /// Single-prompt request asking for a JSON response body
    pub fn json_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        }
    }
}

/// Success envelope. Every level is optional: the provider is free to
/// omit the candidates path, and a missing path is not a transport error.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerationResponse {
    /// Text of the first candidate part, when present
    pub fn into_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
    }
}

/// Removes the triple-backtick fencing the provider sometimes wraps its
/// JSON payloads in, leaving bare parseable text.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// One attempt against the provider with a single credential
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn dispatch(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> AppResult<GenerationResponse>;
}

/// HTTP backend against the real generateContent endpoint
pub struct HttpGenerationBackend {
    http_client: HttpClient,
    api_url: String,
    model: String,
}

impl HttpGenerationBackend {
    pub fn new(api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn dispatch(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> AppResult<GenerationResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        );

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

/// The rotation gateway itself: an ordered pool of interchangeable
/// credentials over a single backend.
pub struct KeyRotationGateway {
    backend: Arc<dyn GenerationBackend>,
    keys: Vec<String>,
}

impl KeyRotationGateway {
    pub fn new(backend: Arc<dyn GenerationBackend>, keys: Vec<String>) -> Self {
        Self { backend, keys }
    }

    /// Builds the gateway from the raw comma-delimited configuration value
    pub fn from_delimited(backend: Arc<dyn GenerationBackend>, raw: &str) -> Self {
        Self::new(backend, parse_credential_pool(raw))
    }

    /// Sends the request with the first credential that works.
    ///
    /// Fails fast with `NoCredentials` on an empty pool (zero attempts),
    /// and with `CredentialsExhausted` only after every key has been tried.
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        if self.keys.is_empty() {
            return Err(AppError::NoCredentials);
        }

        for (index, key) in self.keys.iter().enumerate() {
            tracing::debug!(
                attempt = index + 1,
                pool_size = self.keys.len(),
                "dispatching generation request"
            );

            match self.backend.dispatch(key, request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        attempt = index + 1,
                        pool_size = self.keys.len(),
                        error = %e,
                        "generation attempt failed, rotating to next credential"
                    );
                }
            }
        }

        Err(AppError::CredentialsExhausted {
            attempts: self.keys.len(),
        })
    }
}

#[async_trait::async_trait]
impl TextGenerator for KeyRotationGateway {
    async fn generate_json(&self, prompt: &str) -> AppResult<Option<String>> {
        let request = GenerationRequest::json_prompt(prompt);
        let response = self.generate(&request).await?;
        Ok(response.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_response(text: &str) -> GenerationResponse {
        GenerationResponse {
            candidates: Some(vec![Candidate {
                content: Some(CandidateContent {
                    parts: Some(vec![CandidatePart {
                        text: Some(text.to_string()),
                    }]),
                }),
            }]),
        }
    }

    #[test]
    fn test_parse_credential_pool_trims_and_drops_empty() {
        let pool = parse_credential_pool(" key-a , key-b ,, key-c,");
        assert_eq!(pool, vec!["key-a", "key-b", "key-c"]);
    }

    #[test]
    fn test_parse_credential_pool_empty_input() {
        assert!(parse_credential_pool("").is_empty());
        assert!(parse_credential_pool(" , ,").is_empty());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```json\n{\"food\": \"Pad Thai\"}\n```"),
            "{\"food\": \"Pad Thai\"}"
        );
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn test_generation_request_wire_shape() {
        let request = GenerationRequest::json_prompt("suggest something");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json["contents"][0]["parts"][0]["text"],
            "suggest something"
        );
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_into_text_missing_candidates_path() {
        let empty: GenerationResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.into_text(), None);

        let no_parts: GenerationResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {}}]}"#).unwrap();
        assert_eq!(no_parts.into_text(), None);
    }

    #[tokio::test]
    async fn test_generate_uses_first_valid_credential() {
        let mut backend = MockGenerationBackend::new();

        backend
            .expect_dispatch()
            .withf(|key, _| key == "bad-1")
            .times(1)
            .returning(|_, _| Err(AppError::ExternalApi("status 429".to_string())));
        backend
            .expect_dispatch()
            .withf(|key, _| key == "bad-2")
            .times(1)
            .returning(|_, _| Err(AppError::ExternalApi("status 403".to_string())));
        backend
            .expect_dispatch()
            .withf(|key, _| key == "good")
            .times(1)
            .returning(|_, _| Ok(text_response("{}")));

        let gateway = KeyRotationGateway::new(
            Arc::new(backend),
            vec!["bad-1".into(), "bad-2".into(), "good".into()],
        );

        let request = GenerationRequest::json_prompt("hello");
        let response = gateway.generate(&request).await.unwrap();
        assert_eq!(response.into_text(), Some("{}".to_string()));
    }

    #[tokio::test]
    async fn test_generate_stops_after_first_success() {
        let mut backend = MockGenerationBackend::new();

        // Only the first key may be dispatched; any further call fails the
        // times(1) expectation.
        backend
            .expect_dispatch()
            .withf(|key, _| key == "first")
            .times(1)
            .returning(|_, _| Ok(text_response("ok")));

        let gateway = KeyRotationGateway::new(
            Arc::new(backend),
            vec!["first".into(), "second".into()],
        );

        let request = GenerationRequest::json_prompt("hello");
        assert!(gateway.generate(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_generate_empty_pool_makes_no_attempts() {
        // No expectations registered: any dispatch call would panic.
        let backend = MockGenerationBackend::new();
        let gateway = KeyRotationGateway::new(Arc::new(backend), Vec::new());

        let request = GenerationRequest::json_prompt("hello");
        assert!(matches!(
            gateway.generate(&request).await,
            Err(AppError::NoCredentials)
        ));
    }

    #[tokio::test]
    async fn test_generate_exhausts_every_credential() {
        let mut backend = MockGenerationBackend::new();
        backend
            .expect_dispatch()
            .times(3)
            .returning(|_, _| Err(AppError::ExternalApi("status 500".to_string())));

        let gateway = KeyRotationGateway::new(
            Arc::new(backend),
            vec!["a".into(), "b".into(), "c".into()],
        );

        let request = GenerationRequest::json_prompt("hello");
        assert!(matches!(
            gateway.generate(&request).await,
            Err(AppError::CredentialsExhausted { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn test_from_delimited_builds_ordered_pool() {
        let mut backend = MockGenerationBackend::new();
        backend
            .expect_dispatch()
            .withf(|key, _| key == "k1")
            .times(1)
            .returning(|_, _| Ok(text_response("first key wins")));

        let gateway = KeyRotationGateway::from_delimited(Arc::new(backend), "k1, k2");
        let text = gateway.generate_json("prompt").await.unwrap();
        assert_eq!(text, Some("first key wins".to_string()));
    }
}
