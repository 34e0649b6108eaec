//! Cross-provider consensus aggregation
//!
//! Merges the per-provider audits by field: a field flagged by two or
//! more providers is a consensus issue. All iteration runs over the
//! fixed provider list order, never completion order, so the output is
//! deterministic for a given set of audits.

use crate::models::{AuditField, ModelAudit, ModelFinding, Severity};
use crate::providers::ProviderId;
use std::collections::HashSet;

/// How many providers must flag a field before it becomes consensus
const CONSENSUS_THRESHOLD: usize = 2;

/// Cap on the worst-issues list
const WORST_ISSUES_CAP: usize = 5;

/// Aggregated view over all provider audits
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusSummary {
    /// Fields flagged by >= 2 providers, descending by provider count
    /// (ties in field declaration order)
    pub consensus_issues: Vec<AuditField>,
    /// Findings on consensus fields or with high severity, in encounter
    /// order over the fixed provider list, capped at 5
    pub worst_issues: Vec<ModelFinding>,
    /// Rounded mean of the per-provider scores; failed providers
    /// contribute 0
    pub overall_accuracy: u8,
    pub has_issues: bool,
    /// Number of providers that reported at least one finding
    pub providers_flagging: usize,
    /// The consensus field with the highest provider count, if any;
    /// falls back to the first finding's field
    pub lead_field: Option<AuditField>,
}

/// Aggregate per-provider audits into the consensus view
///
/// `audits` must be in fixed provider order. Failed providers appear as
/// zero-value audits so the divisor for overall accuracy stays the full
/// provider count.
pub fn aggregate(audits: &[(ProviderId, ModelAudit)]) -> ConsensusSummary {
    // A provider flags a field at most once, no matter how many findings
    // it reports for it: consensus counts providers, not findings.
    let mut provider_counts: Vec<(AuditField, usize)> = Vec::new();
    for field in AuditField::ALL {
        let count = audits
            .iter()
            .filter(|(_, audit)| audit.findings.iter().any(|f| f.field == field))
            .count();
        if count > 0 {
            provider_counts.push((field, count));
        }
    }

    // Stable sort keeps declaration order within equal counts
    let mut ranked = provider_counts.clone();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let consensus_issues: Vec<AuditField> = ranked
        .iter()
        .filter(|(_, count)| *count >= CONSENSUS_THRESHOLD)
        .map(|(field, _)| *field)
        .collect();

    let consensus_set: HashSet<AuditField> = consensus_issues.iter().copied().collect();

    let mut worst_issues = Vec::new();
    'outer: for (_, audit) in audits {
        for finding in &audit.findings {
            if consensus_set.contains(&finding.field) || finding.severity == Severity::High {
                worst_issues.push(finding.clone());
                if worst_issues.len() >= WORST_ISSUES_CAP {
                    break 'outer;
                }
            }
        }
    }

    let overall_accuracy = mean_accuracy(audits);

    let providers_flagging = audits
        .iter()
        .filter(|(_, audit)| !audit.findings.is_empty())
        .count();

    let lead_field = consensus_issues.first().copied().or_else(|| {
        audits
            .iter()
            .flat_map(|(_, audit)| audit.findings.first())
            .map(|f| f.field)
            .next()
    });

    let has_issues = !consensus_issues.is_empty() || !worst_issues.is_empty();

    ConsensusSummary {
        consensus_issues,
        worst_issues,
        overall_accuracy,
        has_issues,
        providers_flagging,
        lead_field,
    }
}

/// Arithmetic mean over all providers, rounded to the nearest integer
fn mean_accuracy(audits: &[(ProviderId, ModelAudit)]) -> u8 {
    if audits.is_empty() {
        return 0;
    }
    let sum: u32 = audits.iter().map(|(_, a)| a.accuracy_score as u32).sum();
    (sum as f64 / audits.len() as f64).round() as u8
}
