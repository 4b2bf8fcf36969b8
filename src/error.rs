use thiserror::Error;

/// Main error type for topkeval
#[derive(Error, Debug)]
pub enum EvalError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed line in a ratings or negatives file
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// User has no registered negative-candidate list
    #[error("No negative candidates registered for user {user}")]
    MissingNegatives { user: usize },

    /// Evaluation precondition violated (e.g. test stream not leave-one-out)
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// An offline evaluation worker panicked
    #[error("Evaluation worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using EvalError
pub type Result<T> = std::result::Result<T, EvalError>;
