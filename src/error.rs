//! Crate-wide error type.
//!
//! Every fallible operation returns [`FitError`]. The error carries a coarse
//! [`ErrorKind`] (useful for callers that want to branch) and a human-readable
//! message (useful for everyone else).

/// Broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input arrays are malformed (length mismatch, empty, ...).
    InvalidInput,
    /// A sampler or resampling configuration failed validation.
    InvalidConfig,
    /// A prior could not be constructed (zero or negative support width).
    Prior,
    /// A numerical routine failed (singular system, non-finite fit).
    Numerical,
    /// The sampler could not make progress.
    Sampling,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::InvalidConfig => "invalid configuration",
            ErrorKind::Prior => "prior error",
            ErrorKind::Numerical => "numerical error",
            ErrorKind::Sampling => "sampling error",
        }
    }
}

#[derive(Clone)]
pub struct FitError {
    kind: ErrorKind,
    message: String,
}

impl FitError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::fmt::Debug for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for FitError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = FitError::new(ErrorKind::Prior, "zero-width support");
        assert_eq!(err.kind(), ErrorKind::Prior);
        assert_eq!(err.to_string(), "prior error: zero-width support");
    }
}
