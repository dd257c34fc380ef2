//! AI layer: per-flow prompt construction and the reasoning-oracle client
//! that turns a prompt into a structured risk assessment.

pub mod oracle;
pub mod prompt;

pub use oracle::{
    Assessment, Invoker, OracleClient, OracleConfig, OracleError, RiskTier,
};
pub use prompt::build_prompt;
