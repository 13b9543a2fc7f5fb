//! Error taxonomy and degradation helpers
//!
//! A status indicator must never interrupt editing, so the core follows a
//! "fail silent, log verbose" policy: branch queries and watcher registration
//! degrade to absent values and only show up in the diagnostic log.
//! Configuration failures are the one category handed back to the host.

use anyhow::Result;

/// Categorized error types for better handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Branch query failed: not a repository, no git binary, timeout
    ExternalQuery,

    /// Head watcher could not be registered
    WatcherRegistration,

    /// Settings could not be read, parsed or written
    Configuration,

    /// Other file system errors
    FileSystem,

    /// Unknown errors
    Unknown,
}

/// Categorize an error by walking its cause chain
pub fn categorize_error(error: &anyhow::Error) -> ErrorCategory {
    for cause in error.chain() {
        if cause.is::<serde_json::Error>() {
            return ErrorCategory::Configuration;
        }
        if cause.is::<notify::Error>() {
            return ErrorCategory::WatcherRegistration;
        }
    }

    let error_str = format!("{:#}", error).to_lowercase();
    if error_str.contains("settings") || error_str.contains("projectsetting") {
        ErrorCategory::Configuration
    } else if error_str.contains("git") {
        ErrorCategory::ExternalQuery
    } else if error.chain().any(|c| c.is::<std::io::Error>()) {
        ErrorCategory::FileSystem
    } else {
        ErrorCategory::Unknown
    }
}

/// Log `result`'s error under `category` and continue without a value.
pub fn swallow<T>(category: ErrorCategory, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            match category {
                ErrorCategory::ExternalQuery => {
                    tracing::debug!(error = %format!("{:#}", error), "Git branch unavailable");
                }
                ErrorCategory::WatcherRegistration => {
                    tracing::warn!(error = %format!("{:#}", error), "Head watcher not registered, branch will not auto-refresh");
                }
                _ => {
                    tracing::warn!(category = ?category, error = %format!("{:#}", error), "Degraded");
                }
            }
            None
        }
    }
}

/// Error with context and suggestions, for printing by the CLI
#[derive(Debug)]
pub struct EnhancedError {
    pub error: anyhow::Error,
    pub category: ErrorCategory,
    pub suggestions: Vec<String>,
}

impl EnhancedError {
    pub fn new(error: anyhow::Error) -> Self {
        let category = categorize_error(&error);
        let suggestions = suggestions_for(category);
        Self {
            error,
            category,
            suggestions,
        }
    }

    /// Display the error with all context
    pub fn display(&self) -> String {
        let mut output = format!("where-am-i: {:#}\n", self.error);

        if !self.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in &self.suggestions {
                output.push_str(&format!("   • {}\n", suggestion));
            }
        }

        output
    }
}

fn suggestions_for(category: ErrorCategory) -> Vec<String> {
    match category {
        ErrorCategory::Configuration => vec![
            "Check that the settings file is valid JSON".to_string(),
            "Option values must match their documented types".to_string(),
        ],
        ErrorCategory::FileSystem => vec![
            "Check file permissions".to_string(),
            "Verify the path exists".to_string(),
        ],
        ErrorCategory::WatcherRegistration => {
            vec!["Branch changes will show after the next editor event".to_string()]
        }
        ErrorCategory::ExternalQuery => vec!["Make sure git is installed and on PATH".to_string()],
        ErrorCategory::Unknown => vec!["Run `where-am-i logs` for details".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn test_error_categorization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = anyhow::Error::new(json_err).context("Failed to parse settings.json");
        assert_eq!(categorize_error(&err), ErrorCategory::Configuration);

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Err::<(), _>(io_err).context("Failed to read /x").unwrap_err();
        assert_eq!(categorize_error(&err), ErrorCategory::FileSystem);

        let err = anyhow::anyhow!("git rev-parse exited with 128");
        assert_eq!(categorize_error(&err), ErrorCategory::ExternalQuery);

        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), ErrorCategory::Unknown);
    }

    #[test]
    fn test_swallow() {
        assert_eq!(swallow(ErrorCategory::ExternalQuery, Ok(3)), Some(3));
        assert_eq!(
            swallow::<i32>(ErrorCategory::WatcherRegistration, Err(anyhow::anyhow!("denied"))),
            None
        );
    }

    #[test]
    fn test_display() {
        let enhanced = EnhancedError::new(anyhow::anyhow!("Invalid where-am-i settings"));
        assert_eq!(enhanced.category, ErrorCategory::Configuration);
        let shown = enhanced.display();
        assert!(shown.starts_with("where-am-i: Invalid where-am-i settings"));
        assert!(shown.contains("valid JSON"));
    }
}
