use std::path::PathBuf;
use thiserror::Error;

/// Every way a version stamping run can fail. Operations return
/// `anyhow::Result` and wrap one of these, so callers can
/// `downcast_ref::<SetVersionError>()` to tell the kinds apart.
#[derive(Debug, Error)]
pub enum SetVersionError {
    #[error("Could not find project with artifactId={0}")]
    ProjectNotFound(String),

    #[error("Failed to read POM: {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode POM: {} as {}", .path.display(), .encoding)]
    Decode { path: PathBuf, encoding: String },

    #[error("Failed to parse POM: {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("POM has no {}: {}", .element, .path.display())]
    MissingElement { path: PathBuf, element: &'static str },

    #[error("Invalid path expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error(
        "Failed to resolve path: {} in POM: {} (deepest element reached: {})",
        .expression,
        .path.display(),
        .reached
    )]
    Unresolved {
        expression: String,
        path: PathBuf,
        reached: String,
    },

    #[error("Failed to back up POM: {} to {}", .path.display(), .backup.display())]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write modified POM: {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SetVersionError {
    pub(crate) fn invalid_expression(expression: &str, reason: impl Into<String>) -> Self {
        SetVersionError::InvalidExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}
