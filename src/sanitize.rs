//! Free-text input sanitizer
//!
//! Every free-text field on the dashboard (search boxes, sign-in fields,
//! usernames) runs through [`sanitize`] before the value is stored or used.
//! Angle brackets are stripped outright and the caller is told whether the
//! raw input contained any, so the UI can show a warning for the keystroke
//! that triggered it.

/// Result of sanitizing one raw input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    /// The input with every `<` and `>` removed, then trimmed.
    pub clean: String,
    /// True iff the raw input (pre-strip, pre-trim) contained `<` or `>`.
    pub flagged: bool,
}

/// Strip disallowed characters from free-text input.
///
/// Total over all strings; never fails. The flag reflects the raw input,
/// not the cleaned value, so a warning fires even when the stripped result
/// is otherwise valid.
pub fn sanitize(raw: &str) -> Sanitized {
    let flagged = raw.contains(['<', '>']);
    let clean: String = raw.chars().filter(|c| *c != '<' && *c != '>').collect();

    Sanitized {
        clean: clean.trim().to_string(),
        flagged,
    }
}
