use std::fmt;

use serde::{Deserialize, Serialize};

use crate::UnitId;

/// Categorical order field that goes through a fitted encoder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CategoryField {
    Marca,
    Plant,
}

impl fmt::Display for CategoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryField::Marca => f.write_str("marca"),
            CategoryField::Plant => f.write_str("plant"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("unit {unit_id} has no order history")]
    NotFound { unit_id: UnitId },
    #[error("{field} value {value:?} is not in the fitted vocabulary")]
    UnknownCategory { field: CategoryField, value: String },
    #[error("history has {actual} orders but the window needs {required}")]
    InsufficientHistory { required: usize, actual: usize },
    #[error("shape mismatch in {stage}: expected {expected}, got {actual}")]
    ShapeMismatch {
        stage: &'static str,
        expected: String,
        actual: String,
    },
    #[error("model artifacts unavailable: {0}")]
    ModelUnavailable(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    InsufficientHistory,
    Internal,
    Unavailable,
}

impl PipelineError {
    pub fn shape(stage: &'static str, expected: impl fmt::Debug, actual: impl fmt::Debug) -> Self {
        PipelineError::ShapeMismatch {
            stage,
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NotFound { .. } => ErrorKind::NotFound,
            PipelineError::UnknownCategory { .. } => ErrorKind::InvalidInput,
            PipelineError::InsufficientHistory { .. } => ErrorKind::InsufficientHistory,
            PipelineError::ShapeMismatch { .. } | PipelineError::Inference(_) => ErrorKind::Internal,
            PipelineError::ModelUnavailable(_) => ErrorKind::Unavailable,
        }
    }

    /// Errors the caller caused or can act on, as opposed to defects.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::InvalidInput | ErrorKind::InsufficientHistory
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let unknown = PipelineError::UnknownCategory {
            field: CategoryField::Marca,
            value: "NOT_A_REAL_BRAND".into(),
        };
        assert_eq!(unknown.kind(), ErrorKind::InvalidInput);
        assert!(unknown.is_user_visible());
        assert!(unknown.to_string().contains("marca"));

        let shape = PipelineError::shape("scale", [40, 4], [40, 3]);
        assert_eq!(shape.kind(), ErrorKind::Internal);
        assert!(!shape.is_user_visible());

        assert_eq!(PipelineError::NotFound { unit_id: 7 }.kind(), ErrorKind::NotFound);
        assert_eq!(
            PipelineError::ModelUnavailable("missing".into()).kind(),
            ErrorKind::Unavailable
        );
    }
}
