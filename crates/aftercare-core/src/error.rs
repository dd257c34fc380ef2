use thiserror::Error;

/// Registry or environment misconfiguration. Raised once at load time;
/// request-time code never sees these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("duplicate field id: {0}")]
    DuplicateFieldId(String),

    #[error("duplicate field label: {0} (reverse lookup would be ambiguous)")]
    DuplicateFieldLabel(String),

    #[error("field {owner} declares description field {desc} which is itself a registered field")]
    DescriptionCollision { owner: String, desc: String },

    #[error("duplicate flow id: {0}")]
    DuplicateFlowId(String),

    #[error("flow registry is empty")]
    NoFlows,

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}
