//! Argument normalization utilities.
//!
//! Transforms CLI arguments before they reach the engine to support
//! intuitive syntax that would otherwise require special handling.

/// Normalize a user-supplied extension list.
///
/// Accepts entries with or without a leading dot (`.tsx` and `tsx` are
/// equivalent), drops empty entries, and removes duplicates while
/// preserving first-seen order.
pub fn normalize_extensions(raw: &[String]) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for ext in raw {
        let trimmed = ext.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            continue;
        }
        if result.iter().any(|e| e == trimmed) {
            continue;
        }
        result.push(trimmed.to_string());
    }

    result
}
