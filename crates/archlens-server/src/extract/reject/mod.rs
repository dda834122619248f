//! Extractors wrapping their axum counterparts with JSON error responses.

pub mod enhanced_json;
pub mod enhanced_path;
pub mod validated_json;

pub use self::enhanced_json::Json;
pub use self::enhanced_path::Path;
pub use self::validated_json::ValidateJson;

/// Keeps rejection details short enough for a response body.
pub(crate) fn sanitize_error_message(message: &str, max_lines: usize, max_chars: usize) -> String {
    message
        .lines()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect()
}
