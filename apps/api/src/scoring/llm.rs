//! LLM-backed scoring oracle over the Anthropic Messages API.
//!
//! All scoring calls go through this client: one model, bounded retries on
//! 429/5xx with exponential backoff, and JSON extraction with code-fence
//! stripping. The oracle has arbitrary latency and may fail; callers decide
//! what a failure means (the submission job marks the row `failed`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::scoring::{evaluate, CriteriaScores, IdeaScorer, IdeaSubmission, ScoringResult};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;
const MAX_RETRIES: u32 = 3;

const SYSTEM_PROMPT: &str = "You are an expert evaluator of startup and app ideas. You provide \
     objective, data-driven assessments based on market potential, technical \
     feasibility, innovation, clarity, and actionability.";

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Oracle returned empty content")]
    EmptyContent,
}

impl From<OracleError> for AppError {
    fn from(e: OracleError) -> Self {
        AppError::Scoring(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OracleResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

impl OracleResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// LLM scorer: prompts the model for the five raw criterion scores, then
/// applies the deterministic weighting/threshold logic in `scoring`.
pub struct LlmScorer {
    client: reqwest::Client,
    api_key: String,
}

impl LlmScorer {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Retries on 429 and 5xx with exponential backoff: 1s, 2s, 4s.
    async fn call(&self, prompt: &str) -> Result<OracleResponse, OracleError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<OracleError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Scoring call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(OracleError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Scoring API returned {}: {}", status, body);
                last_error = Some(OracleError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(OracleError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: OracleResponse = response.json().await?;
            debug!("Scoring call succeeded");
            return Ok(parsed);
        }

        Err(last_error.unwrap_or(OracleError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl IdeaScorer for LlmScorer {
    async fn score(&self, submission: &IdeaSubmission) -> Result<ScoringResult, AppError> {
        let prompt = build_scoring_prompt(submission);
        let response = self.call(&prompt).await?;

        let text = response.text().ok_or(OracleError::EmptyContent)?;
        let raw: CriteriaScores =
            serde_json::from_str(strip_json_fences(text)).map_err(OracleError::Parse)?;

        Ok(evaluate(raw))
    }
}

fn build_scoring_prompt(idea: &IdeaSubmission) -> String {
    format!(
        "Evaluate the following app/tool idea across five criteria. Provide a score \
         from 0.0 to 1.0 for each criterion.\n\n\
         Title: {}\n\
         Category: {}\n\
         Teaser: {}\n\
         Full Description: {}\n\n\
         Criteria:\n\
         1. market_potential: addressable market size, demand evidence, monetization potential.\n\
         2. technical_feasibility: buildable with current technology, complexity, risks.\n\
         3. innovation: uniqueness and differentiation from existing solutions.\n\
         4. clarity: how well-defined the problem and solution are.\n\
         5. actionability: how concrete and immediately implementable the idea is.\n\n\
         Return ONLY a JSON object, no additional text:\n\
         {{\"market_potential\": 0.0, \"technical_feasibility\": 0.0, \
         \"innovation\": 0.0, \"clarity\": 0.0, \"actionability\": 0.0}}",
        idea.title, idea.category, idea.teaser_description, idea.full_description
    )
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"market_potential\": 0.8}\n```";
        assert_eq!(strip_json_fences(input), "{\"market_potential\": 0.8}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"market_potential\": 0.8}\n```";
        assert_eq!(strip_json_fences(input), "{\"market_potential\": 0.8}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"market_potential\": 0.8}";
        assert_eq!(strip_json_fences(input), input);
    }

    #[test]
    fn test_criteria_scores_parse_from_oracle_json() {
        let json = r#"{"market_potential": 0.9, "technical_feasibility": 0.8,
                       "innovation": 0.7, "clarity": 0.85, "actionability": 0.75}"#;
        let scores: CriteriaScores = serde_json::from_str(json).unwrap();
        assert_eq!(scores.market_potential, 0.9);
        assert_eq!(scores.actionability, 0.75);
    }

    #[test]
    fn test_prompt_includes_submission_fields() {
        let prompt = build_scoring_prompt(&IdeaSubmission {
            title: "Meal planner".to_string(),
            teaser_description: "Plans meals".to_string(),
            full_description: "Plans weekly meals from pantry contents".to_string(),
            category: "productivity".to_string(),
        });
        assert!(prompt.contains("Meal planner"));
        assert!(prompt.contains("productivity"));
        assert!(prompt.contains("market_potential"));
    }
}
