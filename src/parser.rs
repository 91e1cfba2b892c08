//! Raw backend output into [`GenerationContent`].
//!
//! Tagged output (`HEADLINE:` / `BODY:` / `FOLLOW_UP:`) is preferred; untagged
//! output falls back to first line as headline and the rest as body.

use crate::error::GenerationError;
use crate::generation::response::{
    GenerationContent, MAX_BODY_CHARS, MAX_FOLLOW_UP_CHARS, MAX_HEADLINE_CHARS,
};
use crate::settings::truncate_chars;

pub trait ResponseParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<GenerationContent, GenerationError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponseParser;

#[derive(Debug, Default)]
struct TaggedSections {
    headline: Option<String>,
    body: Option<String>,
    follow_up: Option<String>,
}

const FOLLOW_UP_TAGS: [&str; 3] = ["follow_up:", "follow-up:", "followup:"];

impl ResponseParser for DefaultResponseParser {
    fn parse(&self, raw: &str) -> Result<GenerationContent, GenerationError> {
        let text = normalize_whitespace(raw);
        if text.is_empty() {
            return Err(GenerationError::GenerationFailed);
        }

        let tagged = extract_tagged_sections(&text);

        let headline = panel_text(
            &tagged.headline.unwrap_or_else(|| fallback_headline(&text)),
            MAX_HEADLINE_CHARS,
        );
        let body = panel_text(
            &tagged
                .body
                .unwrap_or_else(|| fallback_body(&text, &headline)),
            MAX_BODY_CHARS,
        );
        let follow_up = tagged
            .follow_up
            .or_else(|| fallback_follow_up(&body))
            .map(|q| panel_text(&q, MAX_FOLLOW_UP_CHARS))
            .filter(|q| !q.is_empty() && !q.eq_ignore_ascii_case("none"));

        if headline.is_empty() || body.is_empty() {
            return Err(GenerationError::InvalidResponse);
        }

        Ok(GenerationContent::new(&headline, &body, follow_up.as_deref()))
    }
}

fn extract_tagged_sections(text: &str) -> TaggedSections {
    let mut sections = TaggedSections::default();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        if let Some(rest) = strip_tag(line, &lower, "headline:") {
            sections.headline = Some(rest);
        } else if let Some(rest) = strip_tag(line, &lower, "body:") {
            sections.body = Some(rest);
        } else if let Some(rest) = FOLLOW_UP_TAGS
            .iter()
            .find_map(|tag| strip_tag(line, &lower, tag))
        {
            sections.follow_up = Some(rest);
        }
    }
    sections
}

fn strip_tag(line: &str, lower: &str, tag: &str) -> Option<String> {
    if !lower.starts_with(tag) {
        return None;
    }
    // tags are ASCII, so the byte offset is shared by both spellings
    line.get(tag.len()..).map(|rest| rest.trim().to_string())
}

fn fallback_headline(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn fallback_body(text: &str, headline: &str) -> String {
    if text == headline {
        return String::new();
    }
    let remainder = normalize_whitespace(text.strip_prefix(headline).unwrap_or(text));
    if remainder.is_empty() {
        text.to_string()
    } else {
        remainder
    }
}

fn fallback_follow_up(body: &str) -> Option<String> {
    let end = body.rfind('?')? + 1;
    let prefix = &body[..end];
    (prefix.chars().count() <= MAX_FOLLOW_UP_CHARS).then(|| prefix.to_string())
}

fn normalize_whitespace(text: &str) -> String {
    let mut value = text
        .replace('\0', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string();
    while value.contains("\n\n\n") {
        value = value.replace("\n\n\n", "\n\n");
    }
    value
}

/// Drops blank lines, trims each line, caps the result.
fn panel_text(text: &str, max_chars: usize) -> String {
    let flattened = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    truncate_chars(flattened.trim(), max_chars)
}
