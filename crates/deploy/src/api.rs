//! Response envelope shared by every operator-facing surface.

use serde::Serialize;

use crate::error::DeployError;

/// `{success: true, data}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for ApiResponse<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e),
        }
    }
}

/// HTTP status a deployment failure maps to.
///
/// Failures of the deployment itself are reported as 400; a store that cannot be
/// written is a dependency failure and reported as 500.
pub fn status_code(error: &DeployError) -> u16 {
    match error {
        DeployError::Persistence { .. } => 500,
        _ => 400,
    }
}
