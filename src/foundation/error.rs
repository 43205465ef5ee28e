/// Convenience result type used across Easel.
pub type EaselResult<T> = Result<T, EaselError>;

/// Top-level error taxonomy used by library APIs.
#[derive(thiserror::Error, Debug)]
pub enum EaselError {
    /// Invalid caller-provided geometry, buffers, or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A generation step failed at the orchestrator boundary.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// The persistence port rejected a read or write.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EaselError {
    /// Build a [`EaselError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`EaselError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// Coarse classification of a failed generation, used for matching in callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Upstream quota exhaustion (HTTP 429 and friends).
    RateLimited,
    /// Upstream reports an invalid or inaccessible model.
    Config,
    /// Anything else.
    Generic,
    /// Missing image or prompt, detected before any remote call.
    UserInput,
}

/// Terminal error of one orchestrator run, carrying a user-facing message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The upstream service signalled quota exhaustion.
    #[error("{message}")]
    RateLimited {
        /// User-facing message.
        message: String,
    },

    /// The upstream service rejected the configured model.
    #[error("{message}")]
    Config {
        /// User-facing message.
        message: String,
    },

    /// Catch-all remote failure.
    #[error("{message}")]
    Generic {
        /// User-facing message.
        message: String,
    },

    /// Required input was missing before submission.
    #[error("{message}")]
    UserInput {
        /// User-facing message.
        message: String,
    },
}

pub(crate) const RATE_LIMITED_MESSAGE: &str =
    "The generation service is busy or your quota is exhausted. Please wait a moment and try again.";
pub(crate) const CONFIG_MESSAGE: &str =
    "The generation model is unavailable or not accessible with the current configuration.";
pub(crate) const GENERIC_MESSAGE: &str = "Generation failed. Please try again.";

impl GenerationError {
    /// Build a [`GenerationError::UserInput`] value.
    pub fn user_input(msg: impl Into<String>) -> Self {
        Self::UserInput {
            message: msg.into(),
        }
    }

    /// Build a [`GenerationError::Generic`] value with a custom message.
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
        }
    }

    /// Translate a raw upstream failure into its user-facing form.
    ///
    /// The raw text is only inspected for classification; it never reaches the user.
    pub fn from_upstream(err: &UpstreamError) -> Self {
        match classify_upstream(&err.0) {
            FailureKind::RateLimited => Self::RateLimited {
                message: RATE_LIMITED_MESSAGE.to_string(),
            },
            FailureKind::Config => Self::Config {
                message: CONFIG_MESSAGE.to_string(),
            },
            FailureKind::Generic | FailureKind::UserInput => Self::Generic {
                message: GENERIC_MESSAGE.to_string(),
            },
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Config { .. } => FailureKind::Config,
            Self::Generic { .. } => FailureKind::Generic,
            Self::UserInput { .. } => FailureKind::UserInput,
        }
    }

    /// Message suitable for rendering inline next to the triggering control.
    pub fn user_message(&self) -> &str {
        match self {
            Self::RateLimited { message }
            | Self::Config { message }
            | Self::Generic { message }
            | Self::UserInput { message } => message,
        }
    }
}

/// Classify raw upstream error text.
///
/// Matching is case-insensitive substring search: `429`, `quota` or `resource_exhausted` mean
/// rate limiting; `model` together with `not found` or `permission denied` means a configuration
/// failure. Everything else is generic.
pub fn classify_upstream(text: &str) -> FailureKind {
    let t = text.to_ascii_lowercase();
    if t.contains("429") || t.contains("quota") || t.contains("resource_exhausted") {
        return FailureKind::RateLimited;
    }
    if t.contains("model") && (t.contains("not found") || t.contains("permission denied")) {
        return FailureKind::Config;
    }
    FailureKind::Generic
}

/// Opaque failure reported by a remote adapter (raw upstream message text).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("upstream error: {0}")]
pub struct UpstreamError(pub String);

impl UpstreamError {
    /// Wrap raw upstream text.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Failure reported by a [`crate::store::kv::KvStore`] implementation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The write would exceed the backing store's capacity.
    #[error("storage quota exceeded writing '{key}'")]
    QuotaExceeded {
        /// Key being written.
        key: String,
    },

    /// Any other backend failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
