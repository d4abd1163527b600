use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{AcademicProfile, GpaBand};

/// Request to bucket the program catalog against a profile.
///
/// The profile may arrive inline (anonymous visitors mid-onboarding) or by
/// user id, in which case the stored profile is loaded. Inline fields win
/// over stored ones when both are present.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct QualifyRequest {
    #[serde(default)]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: Option<String>,
    #[serde(alias = "nationality", rename = "nationality")]
    pub nationality: Option<String>,
    #[serde(alias = "degree", rename = "degree")]
    pub degree: Option<String>,
    #[serde(alias = "gpa_band", rename = "gpaBand")]
    pub gpa_band: Option<GpaBand>,
    #[validate(range(min = 0.0, max = 4.0))]
    #[serde(alias = "gpa", rename = "gpa")]
    pub gpa: Option<f64>,
    #[serde(alias = "field", rename = "field")]
    pub field: Option<String>,
    #[serde(alias = "workExperienceYears", rename = "workExperienceYears")]
    pub work_experience_years: Option<u32>,
}

impl QualifyRequest {
    /// Inline fields as a profile fragment, for merging over a stored one.
    pub fn profile_fragment(&self) -> AcademicProfile {
        AcademicProfile {
            user_id: self.user_id.clone().unwrap_or_default(),
            nationality: self.nationality.clone(),
            degree: self.degree.clone(),
            gpa_band: self.gpa_band,
            gpa: self.gpa,
            field: self.field.clone(),
            work_experience_years: self.work_experience_years,
            updated_at: None,
        }
    }

    pub fn has_inline_fields(&self) -> bool {
        self.nationality.is_some()
            || self.degree.is_some()
            || self.gpa_band.is_some()
            || self.gpa.is_some()
            || self.field.is_some()
            || self.work_experience_years.is_some()
    }
}

/// Request for tiered match scoring via the agent.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreMatchesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default = "default_limit")]
    #[serde(alias = "limit", rename = "limit")]
    pub limit: u16,
}

fn default_limit() -> u16 {
    20
}

/// One user message in the onboarding conversation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OnboardingMessageRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1, max = 4000))]
    #[serde(alias = "message", rename = "message")]
    pub message: String,
}

/// Admin request to ingest scholarship pages by URL.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngestRequest {
    #[validate(length(min = 1, max = 50))]
    #[serde(alias = "urls", rename = "urls")]
    pub urls: Vec<String>,
}

/// Email/password registration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email)]
    #[serde(alias = "email", rename = "email")]
    pub email: String,
    #[validate(length(min = 8))]
    #[serde(alias = "password", rename = "password")]
    pub password: String,
    #[serde(alias = "displayName", rename = "displayName")]
    pub display_name: Option<String>,
}

/// Email/password sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email)]
    #[serde(alias = "email", rename = "email")]
    pub email: String,
    #[validate(length(min = 1))]
    #[serde(alias = "password", rename = "password")]
    pub password: String,
}

/// OAuth/PKCE callback code exchange.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AuthCallbackRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "code", rename = "code")]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_gpa_bounded_to_four_point_scale() {
        let mut req = QualifyRequest {
            gpa: Some(3.8),
            ..QualifyRequest::default()
        };
        assert!(req.validate().is_ok());

        req.gpa = Some(4.0);
        assert!(req.validate().is_ok());

        // The data model is a 0-4 scale; 4.5 must be rejected
        req.gpa = Some(4.5);
        assert!(req.validate().is_err());

        req.gpa = Some(-0.1);
        assert!(req.validate().is_err());
    }
}
