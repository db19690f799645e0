use axum::http::StatusCode;
use thiserror::Error;

/// Error taxonomy shared by every usecase. Callers never retry internally;
/// the HTTP layer maps each variant through `status_code`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("operation quota exceeded: {used} of {limit} operations used")]
    QuotaExceeded { used: i32, limit: i32 },

    #[error("processing engine failure: {0}")]
    Processing(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            CoreError::Processing(_) => StatusCode::BAD_GATEWAY,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_expected_status_codes() {
        assert_eq!(
            CoreError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CoreError::NotFound("plan").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CoreError::Conflict("referenced".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CoreError::QuotaExceeded { used: 10, limit: 10 }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            CoreError::Processing("engine down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
