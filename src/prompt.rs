//! Prompt composition: request + settings snapshot into the backend prompt.

use crate::generation::{GenerationKind, GenerationRequest, MAX_SELECTED_TEXT_CHARS};
use crate::settings::{truncate_chars, GenerationSettings, MAX_CUSTOM_INSTRUCTION_CHARS};

const CUSTOM_KIND_INSTRUCTION: &str =
    "Challenge the text with a precise, surprising, and defensible perspective.";
const REGENERATE_INSTRUCTION: &str =
    "A previous answer already exists for this text. Take a distinctly different angle from it.";
const NO_EXTRA_STYLE: &str = "No extra style constraints.";

/// Pure request-to-prompt transform.
pub trait PromptComposer: Send + Sync {
    fn compose(&self, request: &GenerationRequest, settings: &GenerationSettings) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPromptComposer;

impl PromptComposer for DefaultPromptComposer {
    fn compose(&self, request: &GenerationRequest, settings: &GenerationSettings) -> String {
        let settings = settings.validated();
        let selected_text = sanitize_selected_text(&request.selected_text);
        let task = match request.kind {
            GenerationKind::HiddenAssumptions => settings.hidden_assumptions_prompt.as_str(),
            GenerationKind::Counterargument => settings.counterargument_prompt.as_str(),
            GenerationKind::Custom => CUSTOM_KIND_INSTRUCTION,
        };
        let custom = custom_instruction(&settings.custom_style_instructions);

        let mut prompt = String::new();
        prompt.push_str("You are a concise critical-thinking copilot.\n\n");
        prompt.push_str("TASK:\n");
        prompt.push_str(task);
        prompt.push('\n');
        if request.is_regeneration() {
            prompt.push_str(REGENERATE_INSTRUCTION);
            prompt.push('\n');
        }
        prompt.push_str("\nSTYLE:\n");
        prompt.push_str(settings.style_preset.instruction());
        prompt.push('\n');
        prompt.push_str(&custom);
        prompt.push_str(
            "\n\nOUTPUT FORMAT (exactly these labels, one block each):\n\
             HEADLINE: <single-line insight, max 90 chars>\n\
             BODY: <1-3 sentences, max 250 chars, plain text>\n\
             FOLLOW_UP: <one optional question, or NONE>\n\n\
             RULES:\n\
             - Be specific to the provided text.\n\
             - No markdown, no bullets, no JSON.\n\
             - Do not repeat the selected text verbatim.\n\n\
             SELECTED_TEXT:\n\"\"\"\n",
        );
        prompt.push_str(&selected_text);
        prompt.push_str("\n\"\"\"");
        prompt
    }
}

/// NUL to space, CR/CRLF to LF, per-line trim, at most one blank line in a row.
pub(crate) fn sanitize_selected_text(text: &str) -> String {
    let unified = text
        .replace('\0', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let mut sanitized = unified
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    while sanitized.contains("\n\n\n") {
        sanitized = sanitized.replace("\n\n\n", "\n\n");
    }
    truncate_chars(sanitized.trim(), MAX_SELECTED_TEXT_CHARS)
}

fn custom_instruction(text: &str) -> String {
    let normalized = truncate_chars(text.replace('\0', " ").trim(), MAX_CUSTOM_INSTRUCTION_CHARS);
    if normalized.is_empty() {
        NO_EXTRA_STYLE.to_string()
    } else {
        normalized
    }
}
