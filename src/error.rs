use std::path::PathBuf;

use thiserror::Error;

/// Errors at the store, configuration and CLI boundary. Capture and fill
/// never fail; they degrade instead.
#[derive(Debug, Error)]
pub enum FormSnapshotError {
    /// Reading or writing a file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing failed (store file, page document, message)
    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization failed
    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Config file is not valid YAML for the expected shape
    #[error("YAML parse error in {}: {source}", path.display())]
    YamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Hostname argument could not be interpreted
    #[error("Invalid hostname '{0}'")]
    InvalidHostname(String),

    /// No stored snapshot matched the lookup
    #[error("No snapshot '{snapshot}' stored for {hostname}")]
    UnknownSnapshot { hostname: String, snapshot: String },

    /// The requested form does not exist on the page
    #[error("Form {index} not found (page has {count} forms)")]
    FormNotFound { index: usize, count: usize },
}

impl FormSnapshotError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FormSnapshotError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json_parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        FormSnapshotError::JsonParse {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FormSnapshotError>;
