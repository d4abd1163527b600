use crate::models::{AcademicProfile, MatchTier, Program};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling the AI agent service
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Agent returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl AgentError {
    /// True when the failure looks like the agent being down rather than a
    /// bad request, so callers should fall back to rule evaluation.
    pub fn is_unavailable(&self) -> bool {
        match self {
            AgentError::RequestError(e) => {
                e.is_timeout() || e.is_connect() || e.status().map_or(true, |s| s.is_server_error())
            }
            AgentError::ApiError(_) => true,
            AgentError::InvalidResponse(_) => false,
        }
    }
}

/// One extraction turn from the agent's chat endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentChatReply {
    pub reply: String,
    #[serde(default)]
    pub profile_updates: Option<AcademicProfile>,
    #[serde(default)]
    pub extracted_fields: Vec<String>,
}

/// One scored program returned by the agent's scoring endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentScoredProgram {
    pub program_id: String,
    pub tier: MatchTier,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Acknowledgement for an ingestion job.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentIngestAck {
    pub job_id: String,
    pub accepted: usize,
}

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    user_id: &'a str,
    message: &'a str,
    profile: &'a AcademicProfile,
}

#[derive(Debug, Serialize)]
struct ScorePayload<'a> {
    profile: &'a AcademicProfile,
    programs: &'a [Program],
}

/// Client for the AI agent sidecar
///
/// The agent owns everything that needs a language model: conversational
/// profile extraction, five-tier match scoring, and scholarship page
/// ingestion. Every call here has a deterministic fallback on our side, so
/// failures are reported rather than retried.
pub struct AgentClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl AgentClient {
    /// Create a new agent client
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Run one onboarding chat turn through the agent
    pub async fn chat(
        &self,
        user_id: &str,
        message: &str,
        profile: &AcademicProfile,
    ) -> Result<AgentChatReply, AgentError> {
        let url = self.url("chat");

        tracing::debug!("Agent chat turn for user: {}", user_id);

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&ChatPayload {
                user_id,
                message,
                profile,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AgentError::ApiError(format!(
                "Chat failed: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(format!("Failed to parse chat reply: {}", e)))
    }

    /// Score a catalog slice against a profile into five tiers
    pub async fn score_programs(
        &self,
        profile: &AcademicProfile,
        programs: &[Program],
    ) -> Result<Vec<AgentScoredProgram>, AgentError> {
        let url = self.url("score");

        tracing::debug!("Scoring {} programs via agent", programs.len());

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&ScorePayload { profile, programs })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AgentError::ApiError(format!(
                "Scoring failed: {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;

        let matches = body
            .get("matches")
            .and_then(|m| m.as_array())
            .ok_or_else(|| AgentError::InvalidResponse("Missing matches array".into()))?;

        Ok(matches
            .iter()
            .filter_map(|row| serde_json::from_value(row.clone()).ok())
            .collect())
    }

    /// Kick off ingestion of scholarship pages by URL
    pub async fn ingest_urls(&self, urls: &[String]) -> Result<AgentIngestAck, AgentError> {
        let url = self.url("ingest");

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&serde_json::json!({ "urls": urls }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AgentError::ApiError(format!(
                "Ingest failed: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(format!("Failed to parse ingest ack: {}", e)))
    }

    /// Check whether the agent is reachable
    pub async fn health(&self) -> bool {
        let url = self.url("health");

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Agent health check failed: {}", e);
                false
            }
        }
    }
}
