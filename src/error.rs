use thiserror::Error;

/// Failures raised by the inference core.
///
/// Every variant aborts the whole request; no partial result is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A recognized input parameter is absent from a plain-mode record.
    #[error("record {record}: missing required parameter `{parameter}`")]
    MissingParameter { record: usize, parameter: String },

    /// A parameter of an uncertainty-mode record has no standard deviation.
    #[error("record {record}: lack of required parameter 'std' in `{parameter}`")]
    MissingUncertainty { record: usize, parameter: String },

    /// The distributional model failed or returned a malformed shape.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Output rows cannot be split evenly across the input records.
    #[error("cannot partition {rows} output rows into {records} equal record groups")]
    Partition { rows: usize, records: usize },

    /// A fitted transform rejected the matrix it was given.
    #[error("scaling failed: {0}")]
    Scaling(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl PipelineError {
    /// Whether the failure was caused by the request rather than a broken invariant.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingParameter { .. }
                | PipelineError::MissingUncertainty { .. }
                | PipelineError::InvalidArgument(_)
        )
    }
}

/// Process-level error carrying the exit code of the `exo` binary.
///
/// Exit codes: 2 = bad input/config, 3 = request rejected, 4 = internal failure.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let code = if err.is_user_error() { 3 } else { 4 };
        AppError::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_map_to_exit_code_3() {
        let err = PipelineError::MissingUncertainty {
            record: 1,
            parameter: "Mass".to_string(),
        };
        let app: AppError = err.into();
        assert_eq!(app.exit_code(), 3);
        assert!(app.message().contains("'std'"));
    }

    #[test]
    fn invariant_errors_map_to_exit_code_4() {
        let app: AppError = PipelineError::Partition { rows: 5, records: 2 }.into();
        assert_eq!(app.exit_code(), 4);
        assert!(app.message().contains("5 output rows"));
    }
}
