//! Narrative generation for audit outcomes
//!
//! Produces the one-sentence email hook shown in outreach emails and on
//! the dashboard. Pure function of the aggregate numbers, chosen from
//! four fixed templates; fully deterministic so callers can exact-match
//! it in tests.

use crate::audit::consensus::ConsensusSummary;
use crate::models::AuditField;

/// Accuracy floor for the reassurance template. Below this, even a
/// finding-free audit (e.g. every provider failed and scored 0) gets
/// the generic gaps sentence instead of a clean bill of health.
const REASSURANCE_MIN_ACCURACY: u8 = 80;

/// Build the one-sentence email hook for an audit outcome
pub fn email_hook(brand_name: &str, total_providers: usize, summary: &ConsensusSummary) -> String {
    let flagged = summary.providers_flagging;

    if total_providers > 0 && flagged == total_providers {
        let field = lead_field_label(summary.lead_field);
        return format!(
            "All {} AI models get {} wrong when describing {} — a structured feed is the fix.",
            total_providers, field, brand_name
        );
    }

    if flagged >= 2 {
        return format!(
            "{} of {} AI models describe {} inaccurately — a structured feed closes the gap.",
            flagged, total_providers, brand_name
        );
    }

    if flagged == 0 && summary.overall_accuracy >= REASSURANCE_MIN_ACCURACY {
        return format!(
            "AI models describe {} accurately today — keep your feed current to stay that way.",
            brand_name
        );
    }

    format!(
        "We found minor gaps in how AI models describe {} — a structured feed would close them.",
        brand_name
    )
}

fn lead_field_label(field: Option<AuditField>) -> &'static str {
    field.map(|f| f.label()).unwrap_or("key details")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(
        flagging: usize,
        accuracy: u8,
        lead: Option<AuditField>,
    ) -> ConsensusSummary {
        ConsensusSummary {
            consensus_issues: lead.into_iter().collect(),
            worst_issues: vec![],
            overall_accuracy: accuracy,
            has_issues: lead.is_some(),
            providers_flagging: flagging,
            lead_field: lead,
        }
    }

    #[test]
    fn test_all_models_template() {
        let hook = email_hook("Acme", 3, &summary(3, 55, Some(AuditField::Pricing)));
        assert_eq!(
            hook,
            "All 3 AI models get pricing wrong when describing Acme — a structured feed is the fix."
        );
    }

    #[test]
    fn test_all_models_without_lead_field_uses_fallback_label() {
        let hook = email_hook("Acme", 3, &summary(3, 55, None));
        assert_eq!(
            hook,
            "All 3 AI models get key details wrong when describing Acme — a structured feed is the fix."
        );
    }

    #[test]
    fn test_majority_template() {
        let hook = email_hook("Acme", 3, &summary(2, 70, Some(AuditField::Icp)));
        assert_eq!(
            hook,
            "2 of 3 AI models describe Acme inaccurately — a structured feed closes the gap."
        );
    }

    #[test]
    fn test_reassurance_template() {
        let hook = email_hook("Acme", 3, &summary(0, 93, None));
        assert_eq!(
            hook,
            "AI models describe Acme accurately today — keep your feed current to stay that way."
        );
    }

    #[test]
    fn test_generic_template_for_single_flag() {
        let hook = email_hook("Acme", 3, &summary(1, 85, None));
        assert_eq!(
            hook,
            "We found minor gaps in how AI models describe Acme — a structured feed would close them."
        );
    }

    #[test]
    fn test_total_provider_failure_lands_on_generic_template() {
        // All providers failed: zero flags, zero accuracy. Not a clean
        // bill of health.
        let hook = email_hook("Acme", 3, &summary(0, 0, None));
        assert_eq!(
            hook,
            "We found minor gaps in how AI models describe Acme — a structured feed would close them."
        );
    }
}
