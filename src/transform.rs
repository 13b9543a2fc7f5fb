//! Casing of project names derived from folder names.

use serde::{Deserialize, Serialize};

/// Casing applied to a project name derived from its folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    Uppercase,
    Lowercase,
    Capitalize,
    /// Unknown values fall back here, leaving the name untouched.
    #[default]
    #[serde(other)]
    None,
}

/// Apply `mode` to `raw`.
///
/// `Capitalize` splits on `-` and `_` and joins the capitalized segments with
/// a single space: `my-cool_app` becomes `My Cool App`.
pub fn transform(raw: &str, mode: TextTransform) -> String {
    match mode {
        TextTransform::None => raw.to_string(),
        TextTransform::Uppercase => raw.to_uppercase(),
        TextTransform::Lowercase => raw.to_lowercase(),
        TextTransform::Capitalize => raw
            .trim()
            .split(['-', '_'])
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(transform("my-cool-app", TextTransform::Capitalize), "My Cool App");
        assert_eq!(transform("my-cool_app", TextTransform::Capitalize), "My Cool App");
        assert_eq!(transform("WHERE_AM_I", TextTransform::Capitalize), "Where Am I");
        assert_eq!(transform("  proj  ", TextTransform::Capitalize), "Proj");
        assert_eq!(transform("ébène", TextTransform::Capitalize), "Ébène");
    }

    #[test]
    fn test_empty_segments_are_kept() {
        assert_eq!(transform("a--b", TextTransform::Capitalize), "A  B");
        assert_eq!(transform("", TextTransform::Capitalize), "");
    }

    #[test]
    fn test_case_changes() {
        assert_eq!(transform("MyApp", TextTransform::Uppercase), "MYAPP");
        assert_eq!(transform("MyApp", TextTransform::Lowercase), "myapp");
        assert_eq!(transform("my-App", TextTransform::None), "my-App");
    }

    #[test]
    fn test_unknown_mode_is_identity() {
        let mode: TextTransform = serde_json::from_str("\"snake\"").unwrap();
        assert_eq!(mode, TextTransform::None);
        assert_eq!(transform("my-app", mode), "my-app");

        let mode: TextTransform = serde_json::from_str("\"capitalize\"").unwrap();
        assert_eq!(mode, TextTransform::Capitalize);

        let mode: TextTransform = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(mode, TextTransform::None);
        assert_eq!(TextTransform::default(), TextTransform::None);
        assert_eq!(serde_json::to_string(&TextTransform::None).unwrap(), "\"none\"");
    }
}
