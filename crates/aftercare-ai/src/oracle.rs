//! Reasoning-oracle client: one `generateContent` call per invocation,
//! parsed into a structured [`Assessment`] or a typed [`OracleError`].
//!
//! No retry lives here; retry policy, if any, belongs to the caller. The
//! client holds no mutable state and is safe to share across any number of
//! concurrent invocations.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use aftercare_core::ConfigError;

/// The three risk tiers the oracle may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Thai display string, as shown to patients and stored in output rows.
    pub fn as_thai(&self) -> &'static str {
        match self {
            Self::Low => "ความเสี่ยงต่ำ",
            Self::Medium => "ความเสี่ยงกลาง",
            Self::High => "ความเสี่ยงสูง",
        }
    }

    /// Lenient parse of an oracle-reported tier, Thai or English.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let lower = s.to_lowercase();
        if s.contains("สูง") || lower.contains("high") {
            Some(Self::High)
        } else if s.contains("ปานกลาง") || s.contains("กลาง") || lower.contains("medium") {
            Some(Self::Medium)
        } else if s.contains("ต่ำ") || lower.contains("low") {
            Some(Self::Low)
        } else {
            None
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_thai())
    }
}

/// A fully parsed classification result. Never constructed partially:
/// either all three fields came from a valid oracle response, or the call
/// failed with an [`OracleError`].
#[derive(Debug, Clone)]
pub struct Assessment {
    pub tier: RiskTier,
    pub reason: String,
    pub recommendation: String,
}

/// Failure of a single oracle invocation. Scoped to one (row, flow) unit;
/// callers record it and move on, never aborting sibling units.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("oracle request timed out")]
    Timeout,

    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

/// Anything that can turn a prompt into an assessment. The production
/// implementation is [`OracleClient`]; tests substitute scripted invokers.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<Assessment, OracleError>;
}

/// Oracle endpoint configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl OracleConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(api_key: String) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            api_key,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Read configuration from `AFTERCARE_*` environment variables.
    /// A missing API key is a startup error, never a request-time one.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("AFTERCARE_API_KEY")
            .map_err(|_| ConfigError::MissingEnv("AFTERCARE_API_KEY"))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("AFTERCARE_MODEL") {
            config.model = model;
        }
        if let Ok(base) = std::env::var("AFTERCARE_BASE_URL") {
            config.base_url = base.trim_end_matches('/').to_string();
        }
        if let Ok(secs) = std::env::var("AFTERCARE_TIMEOUT_SECS") {
            let parsed = secs.parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                var: "AFTERCARE_TIMEOUT_SECS",
                value: secs.clone(),
            })?;
            config.timeout = Duration::from_secs(parsed);
        }
        Ok(config)
    }
}

// ── Wire format ──

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// The JSON object the prompt's schema directive asks for.
#[derive(Deserialize)]
struct RawAssessment {
    risk_level: String,
    recommendation: String,
    reason: String,
}

/// HTTP client for the reasoning oracle.
pub struct OracleClient {
    client: reqwest::Client,
    config: OracleConfig,
}

impl OracleClient {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn call(&self, prompt: &str) -> Result<Assessment, OracleError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature: 0.0 },
        };

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(OracleError::Unavailable(format!(
                "{status}: {detail}"
            )));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| OracleError::Malformed("response carried no candidates".into()))?;

        debug!(chars = text.len(), "oracle responded");
        parse_assessment(text)
    }
}

#[async_trait]
impl Invoker for OracleClient {
    async fn invoke(&self, prompt: &str) -> Result<Assessment, OracleError> {
        self.call(prompt).await
    }
}

fn classify_transport_error(e: reqwest::Error) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout
    } else if e.is_decode() {
        OracleError::Malformed(e.to_string())
    } else {
        OracleError::Unavailable(e.to_string())
    }
}

/// Parse the oracle's answer text into an [`Assessment`].
///
/// Models often wrap JSON in markdown fences or stray prose; strip fences
/// and fall back to the outermost `{...}` span before deserialising.
pub fn parse_assessment(text: &str) -> Result<Assessment, OracleError> {
    let candidate = extract_json(text);
    let raw: RawAssessment = serde_json::from_str(candidate)
        .map_err(|e| OracleError::Malformed(format!("{e}: {candidate}")))?;

    let tier = RiskTier::parse(&raw.risk_level).ok_or_else(|| {
        OracleError::Malformed(format!("unrecognised risk level: {}", raw.risk_level))
    })?;

    Ok(Assessment {
        tier,
        reason: raw.reason,
        recommendation: raw.recommendation,
    })
}

fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    // Last resort: the outermost object span.
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}
