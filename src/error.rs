use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy for the analysis core
// ---------------------------------------------------------------------------

/// Result alias used throughout the headless core.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Failures a spectral computation (or its configuration) can produce.
///
/// Each (file, method) cell of a batch fails atomically with one of these;
/// the harmonic engine never returns them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Audio unreadable, missing or empty.
    #[error("load error: {0}")]
    Load(String),

    /// A decomposition degenerated (zero total energy, depth too large for
    /// the signal, malformed axis).
    #[error("transform error: {0}")]
    Transform(String),

    /// A frequency filter selected no bins.
    #[error("range error: {0}")]
    Range(String),

    /// No valid methods, no files, or an invalid parameter combination.
    #[error("config error: {0}")]
    Config(String),

    /// The batch this computation belonged to was aborted before it ran.
    #[error("cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub fn load(msg: impl Into<String>) -> Self {
        AnalysisError::Load(msg.into())
    }

    pub fn transform(msg: impl Into<String>) -> Self {
        AnalysisError::Transform(msg.into())
    }

    pub fn range(msg: impl Into<String>) -> Self {
        AnalysisError::Range(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AnalysisError::Config(msg.into())
    }

    /// Short label used for per-cell failure markers.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Load(_) => "LoadError",
            AnalysisError::Transform(_) => "TransformError",
            AnalysisError::Range(_) => "RangeError",
            AnalysisError::Config(_) => "ConfigError",
            AnalysisError::Cancelled => "Cancelled",
        }
    }
}
