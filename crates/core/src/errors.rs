use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    Unreachable,
    Timeout,
    BadStatus,
    MalformedBody,
}

impl ServiceErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unreachable => "unreachable",
            Self::Timeout => "timeout",
            Self::BadStatus => "bad_status",
            Self::MalformedBody => "malformed_body",
        }
    }
}

/// Failure of a single outbound call. No retries are attempted by the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("service `{endpoint}` is unreachable: {detail}")]
    Unreachable { endpoint: String, detail: String },
    #[error("service `{endpoint}` did not answer within {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },
    #[error("service `{endpoint}` returned status {status}")]
    BadStatus { endpoint: String, status: u16 },
    #[error("service `{endpoint}` returned a malformed body: {detail}")]
    MalformedBody { endpoint: String, detail: String },
}

impl ServiceError {
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            Self::Unreachable { .. } => ServiceErrorKind::Unreachable,
            Self::Timeout { .. } => ServiceErrorKind::Timeout,
            Self::BadStatus { .. } => ServiceErrorKind::BadStatus,
            Self::MalformedBody { .. } => ServiceErrorKind::MalformedBody,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::Unreachable { endpoint, .. }
            | Self::Timeout { endpoint, .. }
            | Self::BadStatus { endpoint, .. }
            | Self::MalformedBody { endpoint, .. } => endpoint,
        }
    }

    pub fn malformed(endpoint: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedBody { endpoint: endpoint.into(), detail: detail.into() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Handler Error: MissingEntity `{0}`")]
    MissingEntity(String),
    #[error(transparent)]
    Upstream(#[from] ServiceError),
    #[error("Handler Error: reply template failed: {0}")]
    Template(String),
}

impl HandlerError {
    /// Stable label for logs, e.g. `missing_entity` or `upstream.timeout`.
    pub fn kind(&self) -> String {
        match self {
            Self::MissingEntity(_) => "missing_entity".to_owned(),
            Self::Upstream(error) => format!("upstream.{}", error.kind().as_str()),
            Self::Template(_) => "template".to_owned(),
        }
    }
}
