use crate::models::{
    AcademicProfile, AuthUser, ConversationTurn, Program, ProgramDetail, Session, Subscription,
    UserRecord,
};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to Supabase (PostgREST + GoTrue)
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Supabase API client
///
/// Handles all communication with the Supabase backend including:
/// - Loading the program catalog with its eligibility rules
/// - Reading and upserting academic profiles
/// - Recording onboarding conversation turns
/// - GoTrue auth flows (signup, password grant, PKCE exchange, logout)
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: SupabaseTables,
}

/// Table names in Supabase
#[derive(Debug, Clone)]
pub struct SupabaseTables {
    pub programs: String,
    pub eligibility_rules: String,
    pub requirements: String,
    pub deadlines: String,
    pub academic_profiles: String,
    pub conversation_turns: String,
    pub users: String,
    pub subscriptions: String,
}

impl SupabaseClient {
    /// Create a new Supabase client
    pub fn new(base_url: String, api_key: String, tables: SupabaseTables) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
            tables,
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn check_status(status: reqwest::StatusCode, context: &str) -> Result<(), SupabaseError> {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SupabaseError::Unauthorized);
        }
        if !status.is_success() {
            return Err(SupabaseError::ApiError(format!("{}: {}", context, status)));
        }
        Ok(())
    }

    /// Fetch all active programs with their eligibility rules embedded
    pub async fn list_active_programs(&self) -> Result<Vec<Program>, SupabaseError> {
        let url = format!(
            "{}?select=*,{}(*)&status=eq.active&order=name.asc",
            self.rest_url(&self.tables.programs),
            self.tables.eligibility_rules,
        );

        tracing::debug!("Fetching active programs from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        Self::check_status(response.status(), "Failed to fetch programs")?;

        let json: Value = response.json().await?;

        let rows = json
            .as_array()
            .ok_or_else(|| SupabaseError::InvalidResponse("Expected array of rows".into()))?;

        let total = rows.len();
        let programs: Vec<Program> = rows
            .iter()
            .filter_map(|row| serde_json::from_value(row.clone()).ok())
            .collect();

        if programs.len() < total {
            tracing::warn!(
                "Skipped {} malformed program rows",
                total - programs.len()
            );
        }
        tracing::debug!("Fetched {} active programs", programs.len());

        Ok(programs)
    }

    /// Fetch a single program with rules, requirements and deadlines
    pub async fn get_program(&self, program_id: &str) -> Result<ProgramDetail, SupabaseError> {
        let url = format!(
            "{}?select=*,{}(*),{}(*),{}(*)&id=eq.{}",
            self.rest_url(&self.tables.programs),
            self.tables.eligibility_rules,
            self.tables.requirements,
            self.tables.deadlines,
            urlencoding::encode(program_id),
        );

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        Self::check_status(response.status(), "Failed to fetch program")?;

        let json: Value = response.json().await?;

        let rows = json
            .as_array()
            .ok_or_else(|| SupabaseError::InvalidResponse("Expected array of rows".into()))?;

        let row = rows
            .first()
            .ok_or_else(|| SupabaseError::NotFound(format!("Program {} not found", program_id)))?;

        serde_json::from_value(row.clone())
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse program: {}", e)))
    }

    /// Fetch the stored academic profile for a user
    pub async fn get_academic_profile(
        &self,
        user_id: &str,
    ) -> Result<AcademicProfile, SupabaseError> {
        let url = format!(
            "{}?user_id=eq.{}&limit=1",
            self.rest_url(&self.tables.academic_profiles),
            urlencoding::encode(user_id),
        );

        tracing::debug!("Fetching academic profile for user: {}", user_id);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        Self::check_status(response.status(), "Failed to fetch profile")?;

        let json: Value = response.json().await?;

        let rows = json
            .as_array()
            .ok_or_else(|| SupabaseError::InvalidResponse("Expected array of rows".into()))?;

        let row = rows.first().ok_or_else(|| {
            SupabaseError::NotFound(format!("Profile not found for user {}", user_id))
        })?;

        serde_json::from_value(row.clone())
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse profile: {}", e)))
    }

    /// Insert or update an academic profile, keyed by user id
    pub async fn upsert_academic_profile(
        &self,
        profile: &AcademicProfile,
    ) -> Result<(), SupabaseError> {
        let url = format!(
            "{}?on_conflict=user_id",
            self.rest_url(&self.tables.academic_profiles),
        );

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[profile])
            .send()
            .await?;

        Self::check_status(response.status(), "Failed to upsert profile")?;

        tracing::debug!("Upserted academic profile for user: {}", profile.user_id);

        Ok(())
    }

    /// Append conversation turns to the onboarding transcript
    pub async fn record_conversation_turns(
        &self,
        turns: &[ConversationTurn],
    ) -> Result<(), SupabaseError> {
        if turns.is_empty() {
            return Ok(());
        }

        let url = self.rest_url(&self.tables.conversation_turns);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .json(turns)
            .send()
            .await?;

        Self::check_status(response.status(), "Failed to record conversation")?;

        Ok(())
    }

    /// Fetch the app-level user row, if one exists
    pub async fn get_user_record(
        &self,
        user_id: &str,
    ) -> Result<Option<UserRecord>, SupabaseError> {
        let url = format!(
            "{}?id=eq.{}&limit=1",
            self.rest_url(&self.tables.users),
            urlencoding::encode(user_id),
        );

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        Self::check_status(response.status(), "Failed to fetch user")?;

        let json: Value = response.json().await?;

        let rows = json
            .as_array()
            .ok_or_else(|| SupabaseError::InvalidResponse("Expected array of rows".into()))?;

        match rows.first() {
            Some(row) => serde_json::from_value(row.clone()).map(Some).map_err(|e| {
                SupabaseError::InvalidResponse(format!("Failed to parse user: {}", e))
            }),
            None => Ok(None),
        }
    }

    /// Create the app-level user row after signup
    pub async fn create_user_record(&self, record: &UserRecord) -> Result<(), SupabaseError> {
        let url = self.rest_url(&self.tables.users);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        Self::check_status(response.status(), "Failed to create user")?;

        tracing::debug!("Created user record: {}", record.id);

        Ok(())
    }

    /// Flip the onboarding flag once the profile has every field filled
    pub async fn mark_onboarding_complete(&self, user_id: &str) -> Result<(), SupabaseError> {
        let url = format!(
            "{}?id=eq.{}",
            self.rest_url(&self.tables.users),
            urlencoding::encode(user_id),
        );

        let response = self
            .client
            .patch(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "onboarding_completed": true }))
            .send()
            .await?;

        Self::check_status(response.status(), "Failed to update user")?;

        Ok(())
    }

    /// Fetch the active subscription for a user, if any
    pub async fn get_subscription(
        &self,
        user_id: &str,
    ) -> Result<Option<Subscription>, SupabaseError> {
        let url = format!(
            "{}?user_id=eq.{}&status=eq.active&limit=1",
            self.rest_url(&self.tables.subscriptions),
            urlencoding::encode(user_id),
        );

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        Self::check_status(response.status(), "Failed to fetch subscription")?;

        let json: Value = response.json().await?;

        let rows = json
            .as_array()
            .ok_or_else(|| SupabaseError::InvalidResponse("Expected array of rows".into()))?;

        Ok(rows
            .first()
            .and_then(|row| serde_json::from_value(row.clone()).ok()))
    }

    /// Register a new email/password user
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Session, SupabaseError> {
        let url = self.auth_url("signup");

        let mut payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        if let Some(name) = display_name {
            payload["data"] = serde_json::json!({ "display_name": name });
        }

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        Self::parse_session(response, "Signup failed").await
    }

    /// Exchange email/password credentials for a session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SupabaseError> {
        let url = self.auth_url("token?grant_type=password");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        Self::parse_session(response, "Sign-in failed").await
    }

    /// Exchange a PKCE authorization code for a session
    pub async fn exchange_code(&self, code: &str) -> Result<Session, SupabaseError> {
        let url = self.auth_url("token?grant_type=pkce");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await?;

        Self::parse_session(response, "Code exchange failed").await
    }

    /// Revoke the session behind an access token
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let url = self.auth_url("logout");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        Self::check_status(response.status(), "Logout failed")?;

        Ok(())
    }

    /// Fetch the auth user behind an access token
    pub async fn current_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let url = self.auth_url("user");

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        Self::check_status(response.status(), "User fetch failed")?;

        let json: Value = response.json().await?;

        serde_json::from_value(json)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse user: {}", e)))
    }

    async fn parse_session(
        response: reqwest::Response,
        context: &str,
    ) -> Result<Session, SupabaseError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SupabaseError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error_description")
                        .or_else(|| v.get("msg"))
                        .and_then(|m| m.as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or_else(|| status.to_string());
            return Err(SupabaseError::ApiError(format!("{}: {}", context, detail)));
        }

        let json: Value = response.json().await?;

        if json.get("access_token").is_none() {
            // Signup with email confirmation enabled returns a bare user
            return Err(SupabaseError::ApiError(format!(
                "{}: no session issued (confirmation pending?)",
                context
            )));
        }

        serde_json::from_value(json)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse session: {}", e)))
    }
}
