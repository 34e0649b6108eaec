//! Audit prompt rendering
//!
//! Every provider receives the same rendered prompt text; the prompt
//! pins the reply format to a single JSON object so the parser's greedy
//! brace match has something to find.

use crate::models::BrandProfile;

/// Render the audit prompt for a brand
pub fn render(brand: &BrandProfile) -> String {
    let feed_json = serde_json::to_string_pretty(&brand.feed_data)
        .unwrap_or_else(|_| "{}".to_string());

    let category = brand.category.as_deref().unwrap_or("unknown");

    format!(
        "You are auditing how accurately AI assistants describe the software vendor \
\"{name}\" ({domain}), category: {category}.\n\
\n\
Reference feed data (the vendor's own source of truth):\n\
{feed}\n\
\n\
First, describe {name} in one paragraph the way you would to a prospective buyer. \
Then compare your description against the reference feed data, field by field.\n\
\n\
Respond with a single JSON object and nothing else:\n\
{{\n\
  \"ai_description\": \"<your one-paragraph description>\",\n\
  \"findings\": [\n\
    {{\n\
      \"field\": \"pricing|description|category|features|icp|integrations\",\n\
      \"kind\": \"missing|incorrect|outdated|incomplete\",\n\
      \"model_claim\": \"<what you believed, or null>\",\n\
      \"reference_value\": \"<the feed value>\",\n\
      \"severity\": \"high|medium|low\"\n\
    }}\n\
  ],\n\
  \"accuracy_score\": <0-100 integer>\n\
}}\n\
\n\
Report a finding only where your description and the feed genuinely \
disagree. An empty findings list is a valid answer.",
        name = brand.brand_name,
        domain = brand.domain,
        category = category,
        feed = feed_json,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeedData;

    fn brand() -> BrandProfile {
        BrandProfile {
            slug: "acme".to_string(),
            brand_name: "Acme".to_string(),
            domain: "acme.com".to_string(),
            category: Some("Project Management".to_string()),
            feed_data: FeedData {
                pricing: Some("$10/mo".to_string()),
                ..FeedData::default()
            },
        }
    }

    #[test]
    fn test_prompt_includes_brand_and_feed() {
        let prompt = render(&brand());
        assert!(prompt.contains("\"Acme\" (acme.com)"));
        assert!(prompt.contains("Project Management"));
        assert!(prompt.contains("$10/mo"));
    }

    #[test]
    fn test_prompt_pins_reply_keys() {
        let prompt = render(&brand());
        assert!(prompt.contains("\"ai_description\""));
        assert!(prompt.contains("\"findings\""));
        assert!(prompt.contains("\"accuracy_score\""));
    }

    #[test]
    fn test_missing_category_renders_unknown() {
        let mut b = brand();
        b.category = None;
        assert!(render(&b).contains("category: unknown"));
    }
}
