//! Core domain types for brand audits
//!
//! Findings and per-provider audits are ephemeral: they are recomputed on
//! every pipeline run and only persist as part of the serialized
//! AuditBundle in the `audit_data` column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feed fields a model's description is audited against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditField {
    Pricing,
    Description,
    Category,
    Features,
    Icp,
    Integrations,
}

impl AuditField {
    /// All fields in declaration order (used for deterministic tie-breaks)
    pub const ALL: [AuditField; 6] = [
        AuditField::Pricing,
        AuditField::Description,
        AuditField::Category,
        AuditField::Features,
        AuditField::Icp,
        AuditField::Integrations,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AuditField::Pricing => "pricing",
            AuditField::Description => "description",
            AuditField::Category => "category",
            AuditField::Features => "features",
            AuditField::Icp => "icp",
            AuditField::Integrations => "integrations",
        }
    }
}

/// How a model's claim diverges from the reference feed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscrepancyKind {
    Missing,
    Incorrect,
    Outdated,
    Incomplete,
}

/// Finding severity as self-reported by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// One discrepancy between a provider's claim and the stored feed data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFinding {
    pub field: AuditField,
    pub kind: DiscrepancyKind,
    /// What the model claimed (absent when the model simply omitted the field)
    #[serde(default)]
    pub model_claim: Option<String>,
    /// The feed value the claim was checked against
    pub reference_value: String,
    pub severity: Severity,
}

/// Per-provider audit result, valid for one pipeline execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAudit {
    #[serde(default)]
    pub ai_description: Option<String>,
    #[serde(default)]
    pub findings: Vec<ModelFinding>,
    /// Self-reported accuracy, 0-100
    #[serde(default)]
    pub accuracy_score: u8,
}

impl ModelAudit {
    /// The zero-value audit a failed or unusable provider degrades to
    pub fn zero() -> Self {
        Self {
            ai_description: None,
            findings: Vec::new(),
            accuracy_score: 0,
        }
    }
}

/// Structured brand feed data (pricing/features/integrations/ICP)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedData {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pricing: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub integrations: Vec<String>,
    /// Ideal customer profile
    #[serde(default)]
    pub icp: Option<String>,
}

/// A brand as seen by the audit pipeline
#[derive(Debug, Clone)]
pub struct BrandProfile {
    pub slug: String,
    pub brand_name: String,
    pub domain: String,
    pub category: Option<String>,
    pub feed_data: FeedData,
}

/// The aggregate audit result persisted per brand
///
/// Recomputed wholesale on every stale read; never incrementally updated.
/// Fresh for exactly 7 days from `checked_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditBundle {
    /// Provider id -> audit, in fixed provider order (BTreeMap keys sort
    /// to anthropic, openai, perplexity)
    pub models: BTreeMap<String, ModelAudit>,
    /// Fields flagged by two or more providers, descending by flag count
    pub consensus_issues: Vec<AuditField>,
    /// Consensus-field or high-severity findings, capped at 5
    pub worst_issues: Vec<ModelFinding>,
    pub has_issues: bool,
    /// Rounded mean of exactly 3 per-provider scores
    pub overall_accuracy: u8,
    /// One-sentence narrative for outreach emails
    pub email_hook: String,
    pub checked_at: DateTime<Utc>,
}

/// Crawl plan tier, bounds how many pages the crawler analyzes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl Default for Plan {
    fn default() -> Self {
        Plan::Free
    }
}

/// Result returned by the external website crawler collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub schemas_found: Vec<String>,
    pub readability_score: f64,
    pub schema_coverage: f64,
    pub pages_analyzed: u32,
}

/// Crawl result plus the timestamp governing the 24-hour cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCrawl {
    #[serde(flatten)]
    pub result: CrawlResult,
    pub crawled_at: DateTime<Utc>,
}
