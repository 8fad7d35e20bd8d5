use thiserror::Error;

/// Error taxonomy for the action pipeline.
///
/// `Validation` covers both malformed input and business-rule violations
/// only detectable at execution time. Audit/telemetry write failures never
/// surface here; they are logged and swallowed by the recorder.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Stable machine-readable code, used in audit payloads and API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for a hosting transport.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ActionError;

    #[test]
    fn status_mapping_follows_transport_contract() {
        assert_eq!(ActionError::Validation("bad".into()).status_code(), 400);
        assert_eq!(ActionError::Unauthorized("no identity".into()).status_code(), 401);
        assert_eq!(ActionError::Forbidden("not yours".into()).status_code(), 403);
        assert_eq!(ActionError::NotFound("missing".into()).status_code(), 404);
        assert_eq!(ActionError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ActionError::Validation("x".into()).code(), "validation_error");
        assert_eq!(ActionError::NotFound("x".into()).code(), "not_found");
    }
}
