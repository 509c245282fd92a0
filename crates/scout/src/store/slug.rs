/// Slug used when nothing of the topic survives sanitizing.
pub const UNTITLED: &str = "untitled";

/// Derive a filesystem-safe name from a topic.
///
/// Keeps alphanumerics, spaces, hyphens and underscores, then trims
/// surrounding whitespace.
pub fn sanitize(topic: &str) -> String {
    let kept: String = topic
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();

    match kept.trim() {
        "" => UNTITLED.to_string(),
        trimmed => trimmed.to_string(),
    }
}
