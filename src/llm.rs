//! Language model boundary.
//!
//! The orchestrator hands a provider role-tagged turns plus the declared
//! callable tools and gets turns back, the last one being the assistant's
//! reply. Tool selection is the model's business; executing a requested
//! call and feeding the result back is the adapter's.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{MnemoError, Result};
use crate::message::{Message, Role};
use crate::tool::ToolRegistry;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, messages: &[Message], tools: &ToolRegistry) -> Result<Vec<Message>>;
}

/// Sampling controls forwarded as the request's `generationConfig`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: i32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: 512,
        }
    }
}

fn coalesce_error(status: reqwest::StatusCode, body: &str) -> MnemoError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return MnemoError::Generation(format!("gemini rate limit exceeded: {body}"));
    }
    MnemoError::Generation(format!("gemini request failed with {status}: {body}"))
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    model: String,
    api_key: String,
    endpoint: String,
    generation: GenerationSettings,
    max_steps: usize,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .map_err(|err| MnemoError::Generation(format!("http client error: {err}")))?,
            model: "gemini-2.5-flash-lite".to_string(),
            api_key: api_key.into(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            generation: GenerationSettings::default(),
            max_steps: 6,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_generation(mut self, generation: GenerationSettings) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut client =
            Self::new(config.gemini_api_key.clone())?.with_model(config.gemini_model.clone());
        if let Some(endpoint) = &config.gemini_endpoint {
            client = client.with_endpoint(endpoint.clone());
        }
        Ok(client)
    }

    fn to_contents(&self, messages: &[Message]) -> Vec<GeminiContent> {
        messages
            .iter()
            .filter(|message| message.role != Role::System)
            .map(|message| GeminiContent {
                role: match message.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                    Role::System => unreachable!(),
                }
                .to_string(),
                parts: vec![GeminiPart {
                    text: Some(message.content.clone()),
                    ..GeminiPart::default()
                }],
            })
            .collect()
    }

    fn to_function_declarations(&self, tools: &ToolRegistry) -> Vec<Value> {
        tools
            .describe()
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters.unwrap_or_else(|| json!({"type": "object"})),
                })
            })
            .collect()
    }

    async fn request(&self, payload: &Value) -> Result<GeminiContent> {
        let resp = self
            .http
            .post(format!(
                "{}/models/{}:generateContent?key={}",
                self.endpoint, self.model, self.api_key
            ))
            .json(payload)
            .send()
            .await
            .map_err(|err| MnemoError::Generation(format!("gemini request error: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(coalesce_error(status, &body));
        }

        let parsed: GeminiResponse = resp
            .json()
            .await
            .map_err(|err| MnemoError::Generation(format!("gemini response parse error: {err}")))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .ok_or_else(|| MnemoError::Generation("gemini returned no candidates".into()))
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, messages: &[Message], tools: &ToolRegistry) -> Result<Vec<Message>> {
        let system = messages
            .iter()
            .find(|message| message.role == Role::System)
            .map(|message| message.content.clone());
        let mut contents = self.to_contents(messages);
        let declarations = self.to_function_declarations(tools);

        for _ in 0..self.max_steps {
            let mut payload = json!({
                "contents": contents,
                "generationConfig": self.generation,
            });
            if let Some(system) = &system {
                payload["systemInstruction"] = json!({"parts": [{"text": system}]});
            }
            if !declarations.is_empty() {
                payload["tools"] = json!([{"functionDeclarations": declarations}]);
            }

            let content = self.request(&payload).await?;
            let calls: Vec<GeminiFunctionCall> = content
                .parts
                .iter()
                .filter_map(|part| part.function_call.clone())
                .collect();

            if calls.is_empty() {
                let text: String = content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect();
                if text.is_empty() {
                    return Err(MnemoError::Generation("gemini returned an empty candidate".into()));
                }
                return Ok(vec![Message::assistant(text)]);
            }

            // Echo the model turn, execute each requested call, feed results back.
            contents.push(GeminiContent {
                role: "model".to_string(),
                parts: content.parts,
            });

            let mut responses = Vec::with_capacity(calls.len());
            for call in calls {
                debug!(tool = %call.name, "executing function call");
                let output = match tools.call(&call.name, call.args.clone()).await {
                    Ok(value) => value,
                    // Never raised past the boundary; the model presents it.
                    Err(err) => json!({"error": err.to_string()}),
                };
                responses.push(GeminiPart {
                    function_response: Some(GeminiFunctionResponse {
                        name: call.name,
                        response: output,
                    }),
                    ..GeminiPart::default()
                });
            }
            contents.push(GeminiContent {
                role: "user".to_string(),
                parts: responses,
            });
        }

        Err(MnemoError::Generation(
            "model did not produce a final reply within the step limit".into(),
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// A deterministic model used for tests and demos.
pub struct StubModel {
    responses: Mutex<VecDeque<String>>,
}

impl StubModel {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn generate(&self, _messages: &[Message], _tools: &ToolRegistry) -> Result<Vec<Message>> {
        let mut locked = self.responses.lock().expect("stub model poisoned");
        let raw = locked.pop_front().ok_or_else(|| {
            MnemoError::Generation("StubModel ran out of scripted responses".into())
        })?;
        Ok(vec![Message::assistant(raw)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core_toolkit;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mock_gemini(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key")
            .unwrap()
            .with_endpoint(server.uri())
    }

    #[tokio::test]
    async fn stub_model_replays_scripted_responses() {
        let model = StubModel::new(vec!["Hello!".into()]);
        let turns = model
            .generate(&[Message::user("hi")], &ToolRegistry::new())
            .await
            .unwrap();
        assert_eq!(turns.last().unwrap().content, "Hello!");

        let err = model
            .generate(&[Message::user("hi again")], &ToolRegistry::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Generation(_)));
    }

    #[tokio::test]
    async fn returns_the_text_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/models/.*:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "2 + 2 is 4."}]}}]
            })))
            .mount(&server)
            .await;

        let turns = mock_gemini(&server)
            .generate(&[Message::user("what is 2+2?")], &ToolRegistry::new())
            .await
            .unwrap();
        assert_eq!(turns.last().unwrap().content, "2 + 2 is 4.");
    }

    #[tokio::test]
    async fn resolves_a_function_call_before_replying() {
        let server = MockServer::start().await;
        // First round asks for the calculator, second round answers.
        Mock::given(method("POST"))
            .and(path_regex(r"^/models/.*:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [
                    {"functionCall": {"name": "math_calculator", "args": {"expression": "(234*12)+98"}}}
                ]}}]
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/models/.*:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "The answer is 2906."}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let turns = mock_gemini(&server)
            .generate(&[Message::user("what is (234*12)+98?")], &core_toolkit())
            .await
            .unwrap();
        assert_eq!(turns.last().unwrap().content, "The answer is 2906.");
    }

    #[tokio::test]
    async fn provider_failure_is_a_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = mock_gemini(&server)
            .generate(&[Message::user("hi")], &ToolRegistry::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Generation(_)));
    }

    #[tokio::test]
    async fn empty_candidates_are_a_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = mock_gemini(&server)
            .generate(&[Message::user("hi")], &ToolRegistry::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Generation(_)));
    }
}
