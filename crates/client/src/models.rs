//! Typed request/response structs, one set per service endpoint.
//!
//! Every wire shape the client sends or receives is an explicit struct
//! here; nothing is assembled from ad-hoc JSON maps.

use serde::{Deserialize, Serialize};
use verae_core::error::CoreError;
use verae_core::panel::LabValues;
use verae_core::risk::{Confidence, Direction, RiskTier};
use verae_core::status::AnalysisStatus;
use verae_core::types::{AnalysisId, Timestamp};

/// Minimum accepted password length, matching the remote contract.
pub const MIN_PASSWORD_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Build credentials, trimming surrounding whitespace from the email.
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    /// Check credential shape before hitting the network: a plausible
    /// email address and a password of at least [`MIN_PASSWORD_LEN`]
    /// characters.
    pub fn validate(&self) -> Result<(), CoreError> {
        let valid_email = match self.email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
            None => false,
        };
        if !valid_email {
            return Err(CoreError::Validation(
                "Email address must look like name@example.com".to_string(),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }
        Ok(())
    }
}

/// Successful authentication response from login and register.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Token lifetime in seconds, when the service reports one.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Analyses
// ---------------------------------------------------------------------------

/// Metadata describing the submitted payload, sent alongside the lab
/// values in `POST /analyses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: usize,
}

impl UploadMetadata {
    /// Describe a manually entered panel: the serialized lab JSON under
    /// a fixed synthetic filename.
    pub fn for_manual_entry(lab: &LabValues) -> Result<Self, serde_json::Error> {
        let encoded = serde_json::to_vec(lab)?;
        Ok(Self {
            filename: "manual.json".to_string(),
            content_type: "application/json".to_string(),
            size_bytes: encoded.len(),
        })
    }
}

/// Request body for `POST /analyses`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAnalysisRequest {
    pub upload: UploadMetadata,
    pub lab: LabValues,
}

/// State of an analysis as reported by `POST /analyses` and
/// `GET /analyses/{id}`. A read-only, possibly stale copy of
/// server-owned state.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSnapshot {
    pub analysis_id: AnalysisId,
    pub status: AnalysisStatus,
    /// Label for the server-side processing phase, when reported.
    #[serde(default)]
    pub progress_stage: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One row of `GET /analyses`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisListItem {
    pub analysis_id: AnalysisId,
    pub status: AnalysisStatus,
    pub created_at: Timestamp,
}

/// Response envelope of `GET /analyses`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisList {
    pub analyses: Vec<AnalysisListItem>,
}

// ---------------------------------------------------------------------------
// Risk result
// ---------------------------------------------------------------------------

/// Final risk assessment for a completed analysis, from
/// `GET /analyses/{id}/result`. Immutable once fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskResult {
    pub risk_tier: RiskTier,
    /// Numeric risk estimate as a percentage, when the model reports one.
    #[serde(default)]
    pub risk_percent: Option<f64>,
    /// Free-text recommendation for the user.
    #[serde(default)]
    pub clinical_action: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub explanations: Vec<Explanation>,
}

/// One feature's contribution to the risk estimate.
#[derive(Debug, Clone, Deserialize)]
pub struct Explanation {
    #[serde(default)]
    pub feature: Option<String>,
    /// Human-readable name for the feature, preferred over `feature`
    /// when present.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub direction: Option<Direction>,
}

impl Explanation {
    /// Best available display name: label, then raw feature code.
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .or(self.feature.as_deref())
            .unwrap_or("feature")
    }
}
