use core::fmt;

/// Result alias for `layerwise`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while loading, splitting and optimizing a network.
///
/// Every variant is scoped to a single network or matrix file: the batch
/// pipeline records it and moves on to the next input.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// A matrix could not be parsed (non-rectangular or non-numeric rows).
    MalformedMatrix {
        /// 1-based line of the offending row, when known.
        line: Option<usize>,
        /// What was wrong with it.
        message: String,
    },

    /// A network document could not be interpreted.
    MalformedNetwork(String),

    /// Unknown quality function family name.
    InvalidQualityFunction(String),

    /// Unknown community detection method name.
    InvalidMethod(String),

    /// Flow-based detection was requested on input it cannot handle.
    IncompatibleMethod {
        /// Method name.
        method: &'static str,
        /// Why it cannot run.
        reason: &'static str,
    },

    /// Quality function cannot be used with this kind of input.
    UnsupportedCombination {
        /// Quality family name.
        quality: &'static str,
        /// Why it cannot run.
        reason: &'static str,
    },

    /// The optimization engine failed internally.
    UpstreamOptimizerFailure(String),

    /// Length mismatch between parallel inputs.
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// Filesystem failure.
    Io {
        /// Path being read or written.
        path: String,
        /// Underlying error message.
        message: String,
    },
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed_matrix(line: Option<usize>, message: impl Into<String>) -> Self {
        Error::MalformedMatrix {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::MalformedMatrix {
                line: Some(line),
                message,
            } => write!(f, "malformed matrix at line {line}: {message}"),
            Error::MalformedMatrix { line: None, message } => {
                write!(f, "malformed matrix: {message}")
            }
            Error::MalformedNetwork(msg) => write!(f, "malformed network: {msg}"),
            Error::InvalidQualityFunction(name) => {
                write!(f, "invalid louvain quality function '{name}'")
            }
            Error::InvalidMethod(name) => {
                write!(f, "invalid community detection method '{name}'")
            }
            Error::IncompatibleMethod { method, reason } => {
                write!(f, "{method} cannot be used here: {reason}")
            }
            Error::UnsupportedCombination { quality, reason } => {
                write!(f, "{quality} quality cannot be used here: {reason}")
            }
            Error::UpstreamOptimizerFailure(msg) => write!(f, "optimizer failure: {msg}"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::Io { path, message } => write!(f, "{path}: {message}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedNetwork(err.to_string())
    }
}
