//! Common error types used across the workspace.
//!
//! Each failure class is its own typed error and converts into the
//! workspace-wide [`MiniCrmError`] via `#[from]`. The top-level `Display`
//! forwards to the underlying error so the message recorded in an
//! execution log is the precise cause (e.g. `constraint violation`).

/// Workspace-wide error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum MiniCrmError {
    /// A rule definition (or other input) is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist for this tenant.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The external store rejected or failed a write.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// An outbound webhook failed.
    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Malformed input, detected before anything is persisted or dispatched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Rule name is shorter than the required minimum.
    #[error("name must be at least {min} characters")]
    NameTooShort { min: usize },

    /// A config could not be read as the shape required by its declared type.
    #[error("{field} does not match {kind}: {reason}")]
    ConfigMismatch {
        /// `trigger_config` or `action_config`.
        field: &'static str,
        /// Declared type name, e.g. `webhook`.
        kind: &'static str,
        reason: String,
    },

    /// A config field has the right type but an unacceptable value.
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// A type name is not one of the known variants.
    #[error("unknown {field} `{value}`")]
    UnknownVariant { field: &'static str, value: String },

    /// A change event targets a table that cannot be used here.
    #[error("table `{table}` is not supported here")]
    UnsupportedTable { table: String },

    /// A stored or received record could not be decoded.
    #[error("malformed {entity} record: {reason}")]
    MalformedRecord { entity: &'static str, reason: String },
}

/// A record looked up by id does not exist in the caller's tenant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// The external store failed to carry out a write or read.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct PersistenceError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PersistenceError {
    /// Create an error carrying only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error whose message is taken from `source`.
    #[must_use]
    pub fn from_source(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// The underlying message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An outbound webhook call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    /// The endpoint answered with a non-success status.
    #[error("Webhook failed: {status_text}")]
    Status { status: u16, status_text: String },

    /// The request never produced a response (DNS, connect, timeout, …).
    #[error("Webhook failed: {0}")]
    Transport(String),
}
