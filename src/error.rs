use thiserror::Error;

/// Errors raised by the fitting core (EM, search, histogram, classifier).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GmmError {
    /// Rejected before any iteration: bad lengths, empty data, bad variances, ...
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A component's effective sample weight or variance collapsed during an M-step.
    #[error("Degenerate component {component} at iteration {iteration}: {reason}")]
    DegenerateComponent {
        component: usize,
        iteration: usize,
        reason: String,
    },
    /// Density or log-likelihood evaluated to a non-finite value.
    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),
}

/// Application-level error carrying a process exit code.
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
}

impl From<GmmError> for AppError {
    fn from(err: GmmError) -> Self {
        let exit_code = match err {
            GmmError::InvalidInput(_) => 2,
            GmmError::DegenerateComponent { .. } | GmmError::NumericOverflow(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
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
    fn gmm_error_maps_to_exit_codes() {
        let invalid: AppError = GmmError::InvalidInput("empty data".to_string()).into();
        assert_eq!(invalid.exit_code(), 2);
        assert!(invalid.to_string().contains("empty data"));

        let degenerate: AppError = GmmError::DegenerateComponent {
            component: 1,
            iteration: 3,
            reason: "zero variance".to_string(),
        }
        .into();
        assert_eq!(degenerate.exit_code(), 4);
        assert!(degenerate.to_string().contains("component 1"));
    }
}
