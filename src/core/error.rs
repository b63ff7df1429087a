use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid job: {message}")]
    InvalidJob { message: String },
    #[error("translator binary '{program}' not found in PATH")]
    BinaryNotFound { program: String },
    #[error("failed to start '{program}': {message}")]
    SpawnFailed { program: String, message: String },
    #[error("translator process failed (exit_code={exit_code:?})")]
    ProcessFailed { exit_code: Option<i32> },
    #[error("a translation job is already running")]
    JobActive,
    #[error("configuration error: {message}")]
    Config { message: String },
    #[error("notification failed: {message}")]
    Notification { message: String },
    #[error("terminal error: {message}")]
    Terminal { message: String },
}

impl FlowError {
    pub fn invalid(message: impl Into<String>) -> Self {
        FlowError::InvalidJob {
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            FlowError::ProcessFailed {
                exit_code: Some(code),
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    pub fn terminal(err: impl std::fmt::Display) -> Self {
        FlowError::Terminal {
            message: err.to_string(),
        }
    }
}
