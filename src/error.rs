//! Error types for class loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for loader operations.
pub type AutoloadResult<T> = Result<T, AutoloadError>;

/// Errors that can occur while resolving or loading a class.
#[derive(Debug, Error)]
pub enum AutoloadError {
    /// No (path, extension) candidate was readable.
    #[error("Class '{class}' not found ({} candidates tried)", .candidates.len())]
    ClassNotFound {
        class: String,
        /// Every candidate examined, in search order.
        candidates: Vec<PathBuf>,
    },

    /// A candidate matched but the load step failed.
    #[error("Failed to load class '{class}' from '{}': {reason}", .path.display())]
    LoadFailed {
        class: String,
        path: PathBuf,
        reason: String,
    },

    /// The host still has no definition after consulting its resolvers.
    #[error("Class '{0}' not found")]
    UndefinedClass(String),

    #[error("IO error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AutoloadError {
    /// Convenience constructor for I/O failures tied to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AutoloadError::Io {
            path: path.into(),
            source,
        }
    }

    /// The class this error concerns, if any.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            AutoloadError::ClassNotFound { class, .. }
            | AutoloadError::LoadFailed { class, .. } => Some(class.as_str()),
            AutoloadError::UndefinedClass(class) => Some(class.as_str()),
            AutoloadError::Io { .. } | AutoloadError::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AutoloadError::ClassNotFound {
            class: "Bar".to_string(),
            candidates: vec![PathBuf::from("./lib/Bar.php"), PathBuf::from("./lib/Bar.inc")],
        };
        assert!(err.to_string().contains("Bar"));
        assert!(err.to_string().contains("2 candidates"));

        let err = AutoloadError::LoadFailed {
            class: "Foo".to_string(),
            path: PathBuf::from("./lib/Foo.php"),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("./lib/Foo.php"));
        assert!(err.to_string().contains("permission denied"));

        let err = AutoloadError::io(
            "/tmp/autoload.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        );
        assert!(err.to_string().contains("/tmp/autoload.toml"));
        assert!(err.to_string().contains("No such file"));
    }

    #[test]
    fn test_class_name() {
        assert_eq!(
            AutoloadError::UndefinedClass("Foo".to_string()).class_name(),
            Some("Foo")
        );
        assert_eq!(AutoloadError::Config("bad".to_string()).class_name(), None);
    }
}
