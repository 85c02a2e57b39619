//! Prompt and transcript copy used by the session.

use program_studio::settings::AiSettings;

pub const GREETING_NEW: &str =
    "Hi! Describe the program you want and I will build it as a single HTML file. \
     You can watch it run in the preview panel and refine it from there.";

pub const GREETING_CONTINUE: &str =
    "Welcome back! The saved program is loaded in the preview. \
     Tell me what you would like to change.";

pub const DEFAULT_PROGRAM_NAME: &str = "Untitled program";

pub const DEFAULT_PROGRAM_DESCRIPTION: &str = "Generated program";

/// Transcript copy for the fix affordance attached to a runtime error.
pub const FIX_OFFER_MESSAGE: &str =
    "The program reported a runtime error in the preview. I can try to fix it for you.";

/// System prompt for a generation turn, carrying the current draft so the
/// model edits instead of starting over.
#[must_use]
pub fn system_prompt(generated_code: &str) -> String {
    let mut prompt = String::from(
        "You are a web program generator. Build exactly what the user describes as one \
         complete, self-contained HTML document: all CSS in a <style> tag and all \
         JavaScript in a <script> tag, no external resources. Always return the full \
         document inside a single ```html fenced code block, even for small changes. \
         Keep any explanation outside the code block brief.",
    );

    if !generated_code.trim().is_empty() {
        prompt.push_str("\n\nThe current version of the program is:\n```html\n");
        prompt.push_str(generated_code);
        prompt.push_str("\n```\nApply the user's request to this version.");
    }

    prompt
}

/// User prompt for the fix-error flow.
#[must_use]
pub fn fix_error_prompt(error: &str) -> String {
    format!(
        "The program throws this error at runtime:\n{error}\n\
         Please fix it and return the full corrected HTML document."
    )
}

/// Copy for the precondition notice when generation is not configured.
#[must_use]
pub fn ai_disabled_notice(ai: &AiSettings) -> String {
    if !ai.enabled {
        "AI generation is disabled. Enable it in settings first.".to_string()
    } else {
        "No API key configured. Add one in settings first.".to_string()
    }
}
