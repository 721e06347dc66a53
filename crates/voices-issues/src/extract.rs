//! Recovering a key-issues document from free-form model output.

use serde::Deserialize;

use crate::error::IssuesError;
use crate::model::{Perspectives, Topic};

/// A topic as the model writes it, every field optional.
#[derive(Debug, Deserialize)]
struct RawTopic {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    perspectives: Perspectives,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    topics: Vec<RawTopic>,
}

/// Balanced top-level `{...}` spans in `text`, in order. Braces inside JSON
/// strings (including escaped quotes) do not count.
#[must_use]
pub fn top_level_objects(text: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if depth > 0 && in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    objects.push(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }

    objects
}

/// First balanced top-level object, if any.
#[must_use]
pub fn first_json_object(text: &str) -> Option<&str> {
    top_level_objects(text).into_iter().next()
}

/// Parse model output into topics. The whole text is tried as JSON first,
/// then each embedded top-level object in turn. Topics without an id get
/// `topic-<n>`, counting from 1.
///
/// # Errors
///
/// Returns [`IssuesError::MalformedOutput`] when nothing parses as a
/// document with a `topics` array.
pub fn parse_model_output(text: &str) -> Result<Vec<Topic>, IssuesError> {
    let document = serde_json::from_str::<RawDocument>(text.trim())
        .ok()
        .or_else(|| {
            top_level_objects(text)
                .into_iter()
                .find_map(|candidate| serde_json::from_str::<RawDocument>(candidate).ok())
        })
        .ok_or_else(|| {
            let preview: String = text.chars().take(120).collect();
            IssuesError::MalformedOutput(preview)
        })?;

    Ok(document
        .topics
        .into_iter()
        .enumerate()
        .map(|(index, raw)| Topic {
            id: raw
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("topic-{}", index + 1)),
            title: raw.title,
            description: raw.description,
            perspectives: raw.perspectives,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"topics":[{"id":"tariffs","title":"Tariffs","description":"Trade","perspectives":{"left":{"summary":"L","keyVoices":["A"]},"center":{"summary":"C","keyVoices":[]},"right":{"summary":"R","keyVoices":["B","C"]}}}]}"#;

    #[test]
    fn plain_json_parses() {
        let topics = parse_model_output(DOC).unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].id, "tariffs");
        assert_eq!(topics[0].perspectives.right.key_voices, ["B", "C"]);
    }

    #[test]
    fn json_wrapped_in_prose_is_recovered() {
        let text = format!("Sure! Here is the analysis:\n```json\n{DOC}\n```\nLet me know {{if}} you need more.");
        let topics = parse_model_output(&text).unwrap();
        assert_eq!(topics[0].title, "Tariffs");
    }

    #[test]
    fn non_document_objects_are_skipped() {
        let text = format!("Note {{\"x\": 1}} then {DOC}");
        assert_eq!(parse_model_output(&text).unwrap().len(), 1);
    }

    #[test]
    fn braces_inside_strings_do_not_break_balance() {
        let text = r#"pre {"topics":[{"title":"Say \"}{\" loudly","description":"d"}]} post"#;
        assert_eq!(first_json_object(text), Some(&text[4..text.len() - 5]));
        let topics = parse_model_output(text).unwrap();
        assert_eq!(topics[0].title, "Say \"}{\" loudly");
    }

    #[test]
    fn missing_ids_are_numbered_from_one() {
        let text = r#"{"topics":[{"title":"A"},{"id":"","title":"B"},{"id":"keep","title":"C"}]}"#;
        let ids: Vec<_> = parse_model_output(text)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, ["topic-1", "topic-2", "keep"]);
    }

    #[test]
    fn missing_perspectives_default_to_empty() {
        let topics = parse_model_output(r#"{"topics":[{"title":"A"}]}"#).unwrap();
        assert_eq!(topics[0].perspectives, Perspectives::default());
    }

    #[test]
    fn unrecoverable_output_is_malformed() {
        for text in ["I cannot help with that.", "{\"topics\": \"none\"}", "{ unbalanced"] {
            assert!(
                matches!(parse_model_output(text), Err(IssuesError::MalformedOutput(_))),
                "text = {text}"
            );
        }
    }
}
