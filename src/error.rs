//! Error types for lookport.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (3=not_found, 5=conflict, 6=remote, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for `--json` consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lookport operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Not Found (exit 3)
    NotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Conflict (exit 5)
    TitleConflict,
    AlreadyExists,

    // Remote (exit 6)
    RemoteQueryError,
    RemoteWriteError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    UnknownOperation,
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::TitleConflict => "TITLE_CONFLICT",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::RemoteQueryError => "REMOTE_QUERY_ERROR",
            Self::RemoteWriteError => "REMOTE_WRITE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::UnknownOperation => "UNKNOWN_OPERATION",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::UnknownOperation | Self::InternalError => 1,
            Self::NotFound => 3,
            Self::InvalidArgument => 4,
            Self::TitleConflict | Self::AlreadyExists => 5,
            Self::RemoteQueryError | Self::RemoteWriteError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether a batch caller can move on to the next object.
    ///
    /// Conflicts and missing objects only concern the object at hand;
    /// remote, config and internal failures will hit every object alike.
    #[must_use]
    pub const fn is_object_scoped(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::TitleConflict | Self::AlreadyExists | Self::InvalidArgument
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in lookport operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{resource}({id}) not found")]
    NotFound { resource: String, id: String },

    #[error("{context}: {message}")]
    RemoteQuery { context: String, message: String },

    #[error("{context}: {message}")]
    RemoteWrite { context: String, message: String },

    #[error(
        "Look {title} already exists in folder {folder_id}\n\
         Delete it before trying to update another Look to have that title."
    )]
    TitleConflict {
        title: String,
        folder_id: String,
        /// Id of the Look already holding the title.
        existing_id: String,
    },

    #[error(
        "Look {title} with slug {slug} already exists in folder {folder_id}\n\
         Use --force if you want to overwrite it"
    )]
    AlreadyExists {
        id: String,
        title: String,
        slug: String,
        folder_id: String,
    },

    #[error("No field allow-list registered for operation '{0}'")]
    UnknownOperation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read {}: {message}", path.display())]
    InvalidFile { path: PathBuf, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::RemoteQuery { .. } => ErrorCode::RemoteQueryError,
            Self::RemoteWrite { .. } => ErrorCode::RemoteWriteError,
            Self::TitleConflict { .. } => ErrorCode::TitleConflict,
            Self::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            Self::UnknownOperation(_) => ErrorCode::UnknownOperation,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) | Self::InvalidFile { .. } => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// True for the identity-reconciliation conflicts.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::TitleConflict { .. } | Self::AlreadyExists { .. })
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotFound { resource, id } => Some(format!(
                "No {resource} with id '{id}' on this instance. Check the id and the host you are connected to."
            )),

            Self::TitleConflict { existing_id, .. } => Some(format!(
                "Look {existing_id} holds that title. Delete it with `lookport look rm {existing_id}` or rename it first."
            )),

            Self::AlreadyExists { id, .. } => Some(format!(
                "Re-run with `--force` to overwrite Look {id}."
            )),

            Self::Config(_) => Some(
                "Set --host and credentials (--client-id/--client-secret or --access-token), \
                 the LOOKPORT_* environment variables, or ~/.lookport/config.json"
                    .to_string(),
            ),

            Self::UnknownOperation(_) => {
                Some("This is a bug in lookport; please report it.".to_string())
            }

            Self::RemoteQuery { .. }
            | Self::RemoteWrite { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidFile { .. }
            | Self::InvalidArgument(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "object_scoped": code.is_object_scoped(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
