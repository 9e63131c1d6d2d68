use thiserror::Error;

/// Error types for the secrfit-rs library.
#[derive(Error, Debug)]
pub enum SecrError {
    /// The mandatory binary capture channel was not supplied.
    #[error("Capture data must contain a binary capture history ('bincapt')")]
    MissingBinaryChannel,

    /// The detection matrices and the trap array disagree on the number of traps.
    #[error("Capture history has {columns} columns but there are {traps} traps")]
    TrapCountMismatch { columns: usize, traps: usize },

    /// An auxiliary channel has a different shape from the binary channel.
    #[error("Channel '{channel}' has shape {found:?}, expected {expected:?}")]
    ChannelShapeMismatch {
        channel: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// An auxiliary channel is not a two-dimensional matrix.
    #[error("Channel '{channel}' must be a matrix, got an array with {ndim} dimension(s)")]
    NonMatrixChannel { channel: String, ndim: usize },

    /// A channel name that is not part of the capture model.
    #[error("Unknown capture channel '{0}'")]
    UnknownChannel(String),

    /// A bounds override that does not hold exactly two values.
    #[error("Bounds for parameter '{name}' must have exactly two values, got {len}")]
    MalformedBounds { name: String, len: usize },

    /// A bounds override that is unordered or leaves the natural domain of the parameter's link.
    #[error("Invalid bounds for parameter '{name}': [{lower}, {upper}] must be ordered and within the parameter's natural range")]
    InvalidBounds { name: String, lower: f64, upper: f64 },

    /// A detection-function name outside the supported families.
    #[error("Unknown detection function '{0}'")]
    UnknownDetectionFunction(String),

    /// A signal-strength link name other than identity or log.
    #[error("Unknown signal strength link function '{0}'; expected 'identity' or 'log'")]
    UnknownSsLink(String),

    /// Signal strengths were supplied without a detection threshold.
    #[error("A detection threshold ('cutoff') is required when signal strength information is supplied")]
    MissingCutoff,

    /// A signal-strength detection function was requested without signal strengths.
    #[error("The signal strength detection function requires an 'ss' capture channel")]
    MissingSsChannel,

    /// Error indicating a mismatch in matrix dimensions.
    #[error("Matrix dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A numerical quantity needed by the fit could not be computed.
    #[error("Computation error: {0}")]
    Computation(String),

    /// The optimizer finished without writing its parameter file.
    #[error("Optimizer output missing: {0}; the fit failed")]
    SolverOutputMissing(String),

    /// The optimizer could not be run.
    #[error("Optimizer failure: {0}")]
    SolverFailure(String),

    /// The optimizer did not finish within the allotted time.
    #[error("Optimizer did not finish within {seconds} s; treated as a failed fit")]
    SolverTimeout { seconds: f64 },

    /// The optimizer output could not be parsed.
    #[error("Failed to parse optimizer output: {0}")]
    OutputParse(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for secrfit-rs operations.
pub type Result<T> = std::result::Result<T, SecrError>;

impl From<String> for SecrError {
    fn from(s: String) -> Self {
        SecrError::Other(s)
    }
}

impl From<&str> for SecrError {
    fn from(s: &str) -> Self {
        SecrError::Other(s.to_string())
    }
}
