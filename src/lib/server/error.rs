use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

pub type Result<T> = actix_web::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Service Unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Not found",
            Self::Internal(_) => "Internal server error",
            Self::Unavailable(_) => "Service unavailable",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NotFound(message) | Self::Internal(message) | Self::Unavailable(message) => {
                message
            }
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "error": self.kind(),
            "message": self.message(),
        });
        // The dashboard falls back to synthetic data when it sees this flag
        if matches!(self, Self::Unavailable(_)) {
            body["mock"] = json!(true);
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<crate::bridge::error::BridgeError> for Error {
    fn from(error: crate::bridge::error::BridgeError) -> Self {
        Self::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::MessageBody;

    use super::*;

    fn body_of(error: Error) -> serde_json::Value {
        let bytes = error
            .error_response()
            .into_body()
            .try_into_bytes()
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn unavailable_carries_mock_flag() {
        let error = Error::Unavailable("No Android device connected".into());
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_of(error);
        assert_eq!(body["error"], "Service unavailable");
        assert_eq!(body["message"], "No Android device connected");
        assert_eq!(body["mock"], true);
    }

    #[test]
    fn internal_has_no_mock_flag() {
        let body = body_of(Error::Internal("adb exploded".into()));
        assert_eq!(body["message"], "adb exploded");
        assert!(body.get("mock").is_none());
    }
}
