use std::fmt;

/// Failures crossing the host boundary: capability errors, unknown ids, and
/// load-time wrappers around core parse and compile errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    UndefinedProcedure(String),
    UndefinedChoiceSet(usize),
    Evaluator { expr: String, message: String },
    Presenter(String),
    Fetch { name: String, message: String },
    Parse { name: String, message: String },
    Compile { name: String, message: String },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UndefinedProcedure(id) => write!(f, "undefined procedure '{}'", id),
            RuntimeError::UndefinedChoiceSet(id) => write!(f, "undefined choice set {}", id),
            RuntimeError::Evaluator { expr, message } => {
                write!(f, "failed to evaluate '{}': {}", expr, message)
            }
            RuntimeError::Presenter(message) => write!(f, "choice presenter failed: {}", message),
            RuntimeError::Fetch { name, message } => {
                write!(f, "failed to fetch '{}': {}", name, message)
            }
            RuntimeError::Parse { name, message } => {
                write!(f, "failed to parse '{}': {}", name, message)
            }
            RuntimeError::Compile { name, message } => {
                write!(f, "failed to compile '{}': {}", name, message)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}
