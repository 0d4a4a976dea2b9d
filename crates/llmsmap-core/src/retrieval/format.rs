//! Response bodies for resolved sections.
//!
//! Markdown and text share one layout:
//!
//! ```text
//! <!-- llmsmap-txt fetch | 2 sections | 180 tokens -->
//!
//! --- section: /docs/intro ---
//! title: Intro
//! tokens: 100
//! lastUpdated: 2024-01-01
//! ---
//!
//! ...content...
//! ```

use std::str::FromStr;

use serde::Serialize;

use super::resolver::ResolvedSection;
use crate::{Error, Result};

/// Markdown content type.
pub const CONTENT_TYPE_MARKDOWN: &str = "text/markdown; charset=utf-8";
/// Plain-text content type.
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
/// JSON content type.
pub const CONTENT_TYPE_JSON: &str = "application/json";

const SECTION_PREFIX: &str = "--- section: ";
const SECTION_SUFFIX: &str = " ---";
const META_END: &str = "---";

/// Response representation requested via `format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `md`
    #[default]
    Markdown,
    /// `txt`
    Text,
    /// `json`
    Json,
}

impl ResponseFormat {
    /// Parse a format name, falling back to markdown for anything unknown.
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// HTTP content type.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Markdown => CONTENT_TYPE_MARKDOWN,
            Self::Text => CONTENT_TYPE_TEXT,
            Self::Json => CONTENT_TYPE_JSON,
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "txt" | "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::Parse(format!("unknown response format '{other}'"))),
        }
    }
}

/// A serialized response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedResponse {
    /// Body text.
    pub body: String,
    /// Matching content type.
    pub content_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonBody<'a> {
    sections: &'a [ResolvedSection],
    total_tokens: u64,
}

/// Serialize resolved sections.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if JSON encoding fails.
pub fn format_response(
    sections: &[ResolvedSection],
    format: ResponseFormat,
) -> Result<FormattedResponse> {
    let total_tokens: u64 = sections.iter().map(|s| s.section.token_count).sum();

    let body = match format {
        ResponseFormat::Json => serde_json::to_string(&JsonBody {
            sections,
            total_tokens,
        })?,
        ResponseFormat::Markdown | ResponseFormat::Text => {
            let mut lines = vec![format!(
                "<!-- llmsmap-txt fetch | {} sections | {total_tokens} tokens -->",
                sections.len()
            )];
            for resolved in sections {
                let s = &resolved.section;
                lines.push(String::new());
                lines.push(format!("{SECTION_PREFIX}{}{SECTION_SUFFIX}", s.path));
                lines.push(format!("title: {}", s.title));
                lines.push(format!("tokens: {}", s.token_count));
                lines.push(format!("lastUpdated: {}", s.last_updated));
                lines.push(META_END.to_string());
                lines.push(String::new());
                lines.push(resolved.content.clone());
            }
            lines.join("\n")
        },
    };

    Ok(FormattedResponse {
        body,
        content_type: format.content_type(),
    })
}

/// Metadata recovered from one markdown/text section block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSection {
    /// Section path.
    pub path: String,
    /// Title line.
    pub title: String,
    /// Token count line.
    pub token_count: u64,
    /// `lastUpdated` line.
    pub last_updated: String,
    /// Content following the metadata block.
    pub content: String,
}

/// Split a markdown/text response back into its section blocks.
///
/// Blocks with malformed metadata are skipped.
#[must_use]
pub fn parse_markdown_response(body: &str) -> Vec<ParsedSection> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    for line in body.split('\n') {
        if is_section_header(line) {
            blocks.push(vec![line]);
        } else if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }
    blocks.iter().filter_map(|block| parse_block(block)).collect()
}

fn is_section_header(line: &str) -> bool {
    line.starts_with(SECTION_PREFIX) && line.ends_with(SECTION_SUFFIX)
}

fn parse_block(lines: &[&str]) -> Option<ParsedSection> {
    let [header, title, tokens, updated, end, rest @ ..] = lines else {
        return None;
    };
    if *end != META_END {
        return None;
    }
    let path = header
        .strip_prefix(SECTION_PREFIX)?
        .strip_suffix(SECTION_SUFFIX)?;

    // Content starts after one blank line; the next block's separator line is dropped.
    let mut content_lines = rest.strip_prefix(&[""][..]).unwrap_or(rest);
    if let [head @ .., ""] = content_lines {
        content_lines = head;
    }

    Some(ParsedSection {
        path: path.to_string(),
        title: title.strip_prefix("title: ")?.to_string(),
        token_count: tokens.strip_prefix("tokens: ")?.parse().ok()?,
        last_updated: updated.strip_prefix("lastUpdated: ")?.to_string(),
        content: content_lines.join("\n"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::generate::ManifestSection;
    use proptest::prelude::*;

    fn resolved(path: &str, title: &str, tokens: u64, date: &str, content: &str) -> ResolvedSection {
        ResolvedSection {
            section: ManifestSection {
                path: path.to_string(),
                title: title.to_string(),
                description: String::new(),
                token_count: tokens,
                last_updated: date.to_string(),
                content_file: format!("content{path}.md"),
                children: vec![],
            },
            content: content.to_string(),
        }
    }

    fn sample() -> Vec<ResolvedSection> {
        vec![
            resolved("/docs/intro", "Intro", 100, "2024-01-01", "# Intro\n\nHello"),
            resolved("/docs/setup", "Setup", 80, "2024-02-01", "Install it."),
        ]
    }

    #[test]
    fn test_markdown_layout() {
        let response = format_response(&sample(), ResponseFormat::Markdown).unwrap();

        assert_eq!(response.content_type, CONTENT_TYPE_MARKDOWN);
        assert_eq!(
            response.body,
            "<!-- llmsmap-txt fetch | 2 sections | 180 tokens -->\n\
             \n\
             --- section: /docs/intro ---\n\
             title: Intro\n\
             tokens: 100\n\
             lastUpdated: 2024-01-01\n\
             ---\n\
             \n\
             # Intro\n\
             \n\
             Hello\n\
             \n\
             --- section: /docs/setup ---\n\
             title: Setup\n\
             tokens: 80\n\
             lastUpdated: 2024-02-01\n\
             ---\n\
             \n\
             Install it."
        );
    }

    #[test]
    fn test_text_differs_only_in_content_type() {
        let md = format_response(&sample(), ResponseFormat::Markdown).unwrap();
        let txt = format_response(&sample(), ResponseFormat::Text).unwrap();

        assert_eq!(md.body, txt.body);
        assert_eq!(txt.content_type, CONTENT_TYPE_TEXT);
    }

    #[test]
    fn test_json_body() {
        let response = format_response(&sample(), ResponseFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&response.body).unwrap();

        assert_eq!(response.content_type, CONTENT_TYPE_JSON);
        assert_eq!(value["totalTokens"], 180);
        assert_eq!(value["sections"].as_array().unwrap().len(), 2);
        assert_eq!(value["sections"][1]["path"], "/docs/setup");
        assert_eq!(value["sections"][1]["content"], "Install it.");
    }

    #[test]
    fn test_empty_result_header() {
        let response = format_response(&[], ResponseFormat::Markdown).unwrap();
        assert_eq!(response.body, "<!-- llmsmap-txt fetch | 0 sections | 0 tokens -->");
        assert!(parse_markdown_response(&response.body).is_empty());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ResponseFormat::parse_lossy("json"), ResponseFormat::Json);
        assert_eq!(ResponseFormat::parse_lossy("TXT"), ResponseFormat::Text);
        assert_eq!(ResponseFormat::parse_lossy("md"), ResponseFormat::Markdown);
        assert_eq!(ResponseFormat::parse_lossy("yaml"), ResponseFormat::Markdown);
        assert!("yaml".parse::<ResponseFormat>().is_err());
    }

    #[test]
    fn test_parse_recovers_metadata_and_content() {
        let body = format_response(&sample(), ResponseFormat::Markdown).unwrap().body;
        let parsed = parse_markdown_response(&body);

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].path, "/docs/intro");
        assert_eq!(parsed[0].token_count, 100);
        assert_eq!(parsed[0].content, "# Intro\n\nHello");
        assert_eq!(parsed[1].last_updated, "2024-02-01");
        assert_eq!(parsed[1].content, "Install it.");
    }

    proptest! {
        #[test]
        fn prop_markdown_metadata_survives_parsing(
            entries in prop::collection::vec(
                ("/[a-z]{1,8}(/[a-z]{1,8}){0,2}", "[A-Za-z ]{1,20}", 0u64..100_000, 1u32..=12, 1u32..=28),
                0..8,
            )
        ) {
            let sections: Vec<ResolvedSection> = entries
                .iter()
                .map(|(path, title, tokens, m, d)| {
                    resolved(path, title.trim(), *tokens, &format!("2024-{m:02}-{d:02}"), "body text")
                })
                .collect();

            let body = format_response(&sections, ResponseFormat::Markdown).unwrap().body;
            let parsed = parse_markdown_response(&body);

            prop_assert_eq!(parsed.len(), sections.len());
            for (p, s) in parsed.iter().zip(&sections) {
                prop_assert_eq!(&p.path, &s.section.path);
                prop_assert_eq!(&p.title, &s.section.title);
                prop_assert_eq!(p.token_count, s.section.token_count);
                prop_assert_eq!(&p.last_updated, &s.section.last_updated);
            }
        }
    }
}
