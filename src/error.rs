use thiserror::Error;

pub type Result<T> = std::result::Result<T, TachiError>;

#[derive(Debug, Error)]
pub enum TachiError {
    #[error("No provider registered for token '{token}'")]
    DependencyNotFound { token: &'static str },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("Failed to downcast resolved instance to '{type_name}'")]
    DowncastFailed { type_name: &'static str },

    #[error("Failed to construct controller '{controller}'")]
    ControllerBuild {
        controller: &'static str,
        #[source]
        source: Box<TachiError>,
    },

    #[error("Path '{path}' on controller '{controller}' must start with '/'")]
    InvalidPath {
        controller: &'static str,
        path: String,
    },

    #[error("Route '{path}' on controller '{controller}' has no handler")]
    MissingHandler {
        controller: &'static str,
        path: String,
    },

    #[error("Route '{verb} {path}' is declared twice on controller '{controller}'")]
    DuplicateRoute {
        controller: &'static str,
        verb: &'static str,
        path: String,
    },

    #[error("Failed to read request body: {message}")]
    BodyRead { message: String },

    #[error("Request body exceeds the {limit} byte limit")]
    BodyTooLarge { limit: usize },

    #[error("Parameter extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("Handler expected an argument at index {index} but none was extracted")]
    MissingArgument { index: usize },

    #[error("Extracted parameter at index {index} does not match handler type '{expected}'")]
    ParamMismatch {
        index: usize,
        expected: &'static str,
    },

    #[error("Failed to serve: {message}")]
    Serve { message: String },
}

impl TachiError {
    /// Shorthand for extractor failures, for use inside custom extractors.
    pub fn extraction(message: impl Into<String>) -> Self {
        TachiError::ExtractionFailed {
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for TachiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            TachiError::BodyRead { .. } | TachiError::ExtractionFailed { .. } => {
                axum::http::StatusCode::BAD_REQUEST
            }
            TachiError::BodyTooLarge { .. } => axum::http::StatusCode::PAYLOAD_TOO_LARGE,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
