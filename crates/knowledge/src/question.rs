//! Question normalization.

/// Normalize a raw question: trim surrounding whitespace, then fold every
/// newline into a single space.
pub fn sanitize_question(raw: &str) -> String {
    raw.trim().replace('\n', " ")
}

/// Whether a request carries no usable question.
pub fn is_blank_question(question: Option<&str>) -> bool {
    question.map_or(true, |q| q.trim().is_empty())
}
