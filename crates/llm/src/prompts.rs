//! Prompt Assembly
//!
//! Builds the system and user prompts sent to a completion backend for
//! outlines, drafts, revisions and single-dimension scoring.

use std::fmt::Write;

use story_forge_core::{GenerationRequest, QualityDimension};

use crate::types::{DraftKind, DraftParams, RevisionHint};

/// System prompt for outline and story generation.
pub const WRITER_SYSTEM_PROMPT: &str = "You are an accomplished fiction writer. \
Write polished, original prose that honours the requested genre, length, theme and setting. \
Return only the requested text with no commentary.";

/// System prompt for revisions.
pub const EDITOR_SYSTEM_PROMPT: &str = "You are a meticulous fiction editor. \
Revise the story you are given; do not rewrite it from scratch. \
Keep everything the instructions do not ask you to change as close to the original as possible. \
Return only the revised story.";

/// System prompt for scoring.
pub const CRITIC_SYSTEM_PROMPT: &str = "You are a strict literary critic. \
Score stories on a 0 to 10 scale. Reply with the score first, then one sentence of justification.";

fn describe_request(request: &GenerationRequest) -> String {
    format!(
        "Genre: {}\nLength: {} (about {} words)\nTheme: {}\nSetting: {}",
        request.genre,
        request.length,
        request.target_word_count,
        request.theme_or_default(),
        request.setting_or_default()
    )
}

/// User prompt for a draft call.
pub fn draft_prompt(params: &DraftParams) -> String {
    let request = &params.request;
    let mut prompt = String::new();
    match &params.kind {
        DraftKind::Outline => {
            let _ = writeln!(
                prompt,
                "Write a structural outline for a story with these requirements:"
            );
            let _ = writeln!(prompt, "{}", describe_request(request));
            let _ = writeln!(
                prompt,
                "\nList the main characters with their motivations, then the key beats from \
                 opening to resolution, one line each."
            );
        }
        DraftKind::Story { outline } => {
            let _ = writeln!(prompt, "Write a complete story with these requirements:");
            let _ = writeln!(prompt, "{}", describe_request(request));
            if let Some(outline) = outline {
                let _ = writeln!(prompt, "\nExpand this outline into the full story:\n{}", outline);
            }
            let _ = writeln!(
                prompt,
                "\nAim for {} words. Give it a clear beginning, middle and end.",
                request.target_word_count
            );
        }
    }
    prompt
}

/// User prompt for a revision call.
pub fn revision_prompt(artifact: &str, hint: &RevisionHint) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Revision goal: {}", hint.focus);
    if !hint.target_dimensions.is_empty() {
        let _ = writeln!(prompt, "\nImprove these aspects:");
        for dimension in &hint.target_dimensions {
            let score = hint
                .current_scores
                .get(dimension)
                .map(|s| format!(" (currently {:.1}/10)", s))
                .unwrap_or_default();
            let _ = writeln!(
                prompt,
                "- {}{}: {}",
                dimension.label(),
                score,
                dimension.rubric()
            );
        }
    }
    let _ = writeln!(
        prompt,
        "\nKeep the {} genre and stay close to {} words.",
        hint.genre, hint.target_word_count
    );
    let _ = writeln!(prompt, "\nStory:\n{}", artifact);
    prompt
}

/// User prompt asking for a score on one dimension.
pub fn scoring_prompt(
    dimension: QualityDimension,
    artifact: &str,
    request: &GenerationRequest,
) -> String {
    format!(
        "Score the story below for {} ({}).\nIt was written as {} fiction of about {} words.\n\
         Reply with a number from 0 to 10.\n\nStory:\n{}",
        dimension.label(),
        dimension.rubric(),
        request.genre,
        request.target_word_count,
        artifact
    )
}
