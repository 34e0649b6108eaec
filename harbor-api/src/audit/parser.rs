//! Model reply parsing
//!
//! Providers return free text that is expected to contain one JSON
//! object, usually wrapped in prose ("Here is the audit you asked
//! for: {...}"). The parser locates the greedy brace span, decodes it
//! through typed serde structs, and validates enum values.
//!
//! Parse failures are an explicit error variant, not a silent zero
//! value: the pipeline decides what a failed parse degrades to, and the
//! distinction stays observable in logs and events.

use crate::models::{ModelAudit, ModelFinding};
use serde::Deserialize;
use thiserror::Error;

/// Why a reply could not be decoded
#[derive(Debug, Error)]
pub enum ParseError {
    /// The reply contains no `{...}` span at all
    #[error("Reply contains no JSON object")]
    NoJsonObject,

    /// The brace span is not valid JSON
    #[error("Invalid JSON in reply: {0}")]
    InvalidJson(String),

    /// Valid JSON, but not the expected audit shape (bad enum values,
    /// wrong types)
    #[error("Reply JSON has unexpected shape: {0}")]
    InvalidShape(String),
}

/// Raw reply shape before score clamping
///
/// `accuracy_score` is accepted as any JSON number; models occasionally
/// return floats ("87.5") or out-of-range values.
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    ai_description: Option<String>,
    #[serde(default)]
    findings: Vec<ModelFinding>,
    #[serde(default)]
    accuracy_score: f64,
}

/// Extract and decode the audit object embedded in a model reply
///
/// The span is the greedy brace match: first `{` through last `}`.
/// Prose before and after the object is tolerated; a reply that is pure
/// prose fails with `NoJsonObject`.
pub fn parse_model_reply(raw: &str) -> Result<ModelAudit, ParseError> {
    let start = raw.find('{').ok_or(ParseError::NoJsonObject)?;
    let end = raw.rfind('}').ok_or(ParseError::NoJsonObject)?;
    if end < start {
        return Err(ParseError::NoJsonObject);
    }
    let span = &raw[start..=end];

    let value: serde_json::Value =
        serde_json::from_str(span).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let reply: RawReply =
        serde_json::from_value(value).map_err(|e| ParseError::InvalidShape(e.to_string()))?;

    Ok(ModelAudit {
        ai_description: reply.ai_description.filter(|d| !d.is_empty()),
        findings: reply.findings,
        accuracy_score: clamp_score(reply.accuracy_score),
    })
}

/// Clamp a self-reported score into 0-100
fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}
