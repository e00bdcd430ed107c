#[derive(Debug)]
pub enum Error {
    Json(serde_json::Error),
    UrlParse(chipp_http::UrlParseError),
    HttpError(chipp_http::Error),
    Rejected { status: u32, message: Option<String> },
}

/// Coarse classification used by the polling engine when reporting failures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Network failure or a non-2xx response.
    Transport,
    /// The response arrived but its body could not be decoded.
    Shape,
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Json(_) => FailureKind::Shape,
            Self::UrlParse(_) | Self::HttpError(_) | Self::Rejected { .. } => {
                FailureKind::Transport
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<chipp_http::UrlParseError> for Error {
    fn from(err: chipp_http::UrlParseError) -> Self {
        Self::UrlParse(err)
    }
}

impl From<chipp_http::Error> for Error {
    fn from(err: chipp_http::Error) -> Self {
        Self::HttpError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "JSON error: {err}"),
            Self::UrlParse(err) => write!(f, "URL parse error: {err}"),
            Self::HttpError(err) => write!(f, "HTTP error: {err}"),
            Self::Rejected {
                status,
                message: Some(message),
            } => write!(f, "Rejected with {status}: {message}"),
            Self::Rejected {
                status,
                message: None,
            } => write!(f, "Rejected with {status}"),
        }
    }
}

impl std::error::Error for Error {}
