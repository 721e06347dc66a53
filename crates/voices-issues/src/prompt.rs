//! Prompt construction for key-issues generation.

use std::fmt::Write as _;

use voices_content::{CommentatorArticles, LeanGroups};
use voices_core::Bucket;

/// Articles listed per commentator.
pub const ARTICLES_PER_COMMENTATOR: usize = 3;
/// Description characters carried into the prompt.
pub const PROMPT_DESCRIPTION_CHARS: usize = 200;

fn section_heading(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Left => "## LEFT-LEANING COMMENTATORS",
        Bucket::Center => "## CENTER COMMENTATORS",
        Bucket::Right => "## RIGHT-LEANING COMMENTATORS",
    }
}

fn write_commentator(out: &mut String, entry: &CommentatorArticles) {
    for article in entry.articles.iter().take(ARTICLES_PER_COMMENTATOR) {
        let _ = write!(out, "\n- {}: \"{}\"", entry.name, article.title);
        let description: String = article
            .description
            .chars()
            .take(PROMPT_DESCRIPTION_CHARS)
            .collect();
        if !description.is_empty() {
            let _ = write!(out, " - {description}");
        }
    }
}

/// Render grouped content as one section per non-empty bucket.
#[must_use]
pub fn format_content(groups: &LeanGroups) -> String {
    let mut sections = Vec::new();

    for (bucket, entries) in groups.iter() {
        if entries.iter().all(|entry| entry.articles.is_empty()) {
            continue;
        }
        let mut section = section_heading(bucket).to_string();
        for entry in entries {
            write_commentator(&mut section, entry);
        }
        sections.push(section);
    }

    sections.join("\n\n")
}

/// Full instruction sent to the text generator.
#[must_use]
pub fn build_prompt(groups: &LeanGroups) -> String {
    format!(
        r#"Below are recent articles and videos from independent political commentators, grouped by political lean.

{content}

Identify the 2-3 most significant topics these commentators are discussing this week. For each topic, summarize how left-leaning, center, and right-leaning commentators approach it, naming the commentators who represent each view. Use only the commentators listed above.

Respond with JSON only, in exactly this shape:
{{
  "topics": [
    {{
      "id": "short-kebab-case-id",
      "title": "Topic title",
      "description": "One or two sentences on why the topic matters",
      "perspectives": {{
        "left": {{ "summary": "...", "keyVoices": ["Name"] }},
        "center": {{ "summary": "...", "keyVoices": ["Name"] }},
        "right": {{ "summary": "...", "keyVoices": ["Name"] }}
      }}
    }}
  ]
}}"#,
        content = format_content(groups)
    )
}
