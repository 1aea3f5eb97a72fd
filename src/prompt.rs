//! Prompt templates for the LLM stages, plus rendering and validation.

use crate::error::{PipelineError, Result};

/// Longest prompt, in characters, the pipeline will send to a backend.
pub const MAX_PROMPT_CHARS: usize = 100_000;

pub const ANALYZE_TEMPLATE: &str = "Analyze the following user request and identify:
1. The task type (question, calculation, information lookup, etc.)
2. The key elements that must be taken into account
3. The recommended approach to solving it

User request: {user_input}

Provide a brief, structured analysis.";

pub const DECIDE_TEMPLATE: &str = "Using the assessment below, decide which action should be taken.

Request: {user_input}
Assessment: {analysis}

Propose one concrete action that solves the task, in a single sentence.";

pub const ACT_TEMPLATE: &str = "Execute the following action and report the result.

Original request: {user_input}
Assessment: {analysis}
Action: {decision}

Provide a detailed answer or the outcome of the action.";

/// Build a prompt string with variable substitution.
///
/// Replaces `{key}` placeholders in the template with the matching value from
/// `vars`. Unknown placeholders are left as-is. The template is scanned once,
/// so braces inside substituted values are never expanded.
///
/// Use `{{` to insert a literal `{` and `}}` to insert a literal `}`.
///
/// # Example
///
/// ```
/// use orai::prompt::render;
///
/// let result = render("Hello {name}, JSON: {{\"key\": \"val\"}}", &[("name", "Alice")]);
/// assert_eq!(result, r#"Hello Alice, JSON: {"key": "val"}"#);
/// ```
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        rendered.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            rendered.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            rendered.push('}');
            rest = after;
        } else if let Some((value, after)) = placeholder(tail, vars) {
            rendered.push_str(value);
            rest = after;
        } else {
            // Lone brace or unknown placeholder: copy the brace through.
            rendered.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }

    rendered.push_str(rest);
    rendered
}

/// Match a `{key}` at the start of `tail` against `vars`, returning the value
/// and the text after the closing brace.
fn placeholder<'t, 'v>(tail: &'t str, vars: &[(&str, &'v str)]) -> Option<(&'v str, &'t str)> {
    let body = tail.strip_prefix('{')?;
    let end = body.find('}')?;
    let key = &body[..end];
    vars.iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| (*value, &body[end + 1..]))
}

/// Check that a prompt is worth sending: non-blank and at most
/// [`MAX_PROMPT_CHARS`] characters.
pub fn validate_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(PipelineError::InvalidPrompt(
            "prompt is empty or whitespace-only".to_string(),
        ));
    }
    let len = prompt.chars().count();
    if len > MAX_PROMPT_CHARS {
        return Err(PipelineError::InvalidPrompt(format!(
            "prompt is {} characters, limit is {}",
            len, MAX_PROMPT_CHARS
        )));
    }
    Ok(())
}

/// Render the analysis prompt for a user request.
pub fn analyze_prompt(user_input: &str) -> String {
    render(ANALYZE_TEMPLATE, &[("user_input", user_input)])
}

/// Render the decision prompt from the request and its analysis.
pub fn decide_prompt(user_input: &str, analysis: &str) -> String {
    render(
        DECIDE_TEMPLATE,
        &[("user_input", user_input), ("analysis", analysis)],
    )
}

/// Render the action prompt from the request, analysis, and chosen action.
pub fn act_prompt(user_input: &str, analysis: &str, decision: &str) -> String {
    render(
        ACT_TEMPLATE,
        &[
            ("user_input", user_input),
            ("analysis", analysis),
            ("decision", decision),
        ],
    )
}
