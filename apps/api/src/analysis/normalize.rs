//! Response Normalizer — pulls the analysis text out of a workflow run result
//! and applies exactly one cosmetic presentation policy.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Substituted when the message carries no usable text.
pub const NO_ANALYSIS_FALLBACK: &str = "No analysis available";

const LINE_BREAK_MARKER: &str = "<br>";

/// The run result did not have the `outputs[0].outputs[0].results.message` shape.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid response format: missing {missing}")]
pub struct InvalidFormat {
    pub missing: &'static str,
}

/// How analysis text is dressed up before display. These are alternatives,
/// never stages of one pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatPolicy {
    #[default]
    PassThrough,
    #[serde(rename = "line_break")]
    LineBreakSubstitution,
    HeaderPromotion,
}

impl FormatPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatPolicy::PassThrough => "pass_through",
            FormatPolicy::LineBreakSubstitution => "line_break",
            FormatPolicy::HeaderPromotion => "header_promotion",
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            FormatPolicy::PassThrough => text.to_string(),
            FormatPolicy::LineBreakSubstitution => text.replace('\n', LINE_BREAK_MARKER),
            FormatPolicy::HeaderPromotion => promote_headers(text),
        }
    }
}

impl fmt::Display for FormatPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown format policy '{0}'")]
pub struct UnknownPolicy(String);

impl FromStr for FormatPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass_through" => Ok(FormatPolicy::PassThrough),
            "line_break" => Ok(FormatPolicy::LineBreakSubstitution),
            "header_promotion" => Ok(FormatPolicy::HeaderPromotion),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Extracts `outputs[0].outputs[0].results.message.text` and formats it.
///
/// A missing or mistyped path segment is `InvalidFormat`. A message without
/// text (absent, null, empty, or not a string) yields the fallback, which is
/// returned unformatted.
pub fn normalize(response: &Value, policy: FormatPolicy) -> Result<String, InvalidFormat> {
    match extract_text(response)? {
        Some(text) => Ok(policy.apply(text)),
        None => Ok(NO_ANALYSIS_FALLBACK.to_string()),
    }
}

fn extract_text(response: &Value) -> Result<Option<&str>, InvalidFormat> {
    let run = first_of(response, "outputs", "outputs")?;
    let output = first_of(run, "outputs", "outputs[0].outputs")?;
    let message = output
        .get("results")
        .ok_or(InvalidFormat { missing: "results" })?
        .get("message")
        .filter(|m| m.is_object())
        .ok_or(InvalidFormat { missing: "message" })?;

    Ok(message
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty()))
}

fn first_of<'a>(
    value: &'a Value,
    key: &str,
    path: &'static str,
) -> Result<&'a Value, InvalidFormat> {
    value
        .get(key)
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .ok_or(InvalidFormat { missing: path })
}

/// Lines that survive `#`-stripping and don't open with a list marker are
/// treated as section headings: upper-cased and padded with blank lines.
/// Everything else passes through untouched.
fn promote_headers(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let stripped = line.trim().trim_start_matches('#').trim();
            if !stripped.is_empty() && !stripped.starts_with(['-', '*']) {
                format!("\n{}\n", stripped.to_uppercase())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
