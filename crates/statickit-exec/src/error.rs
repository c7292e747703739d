use std::path::PathBuf;

use statickit_core::GenerationFailure;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("service reported an error: {0}")]
    Reported(String),

    #[error("response carried no image")]
    MissingImage,

    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ServiceError> for GenerationFailure {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Http(err) if err.is_decode() => GenerationFailure::InvalidResponse {
                message: err.to_string(),
            },
            ServiceError::Http(err) => GenerationFailure::Network {
                message: err.to_string(),
            },
            ServiceError::Status { status, message } => {
                GenerationFailure::Rejected { status, message }
            }
            ServiceError::Reported(message) => GenerationFailure::InvalidResponse { message },
            ServiceError::MissingImage => GenerationFailure::InvalidResponse {
                message: "response carried no image".to_string(),
            },
            err @ ServiceError::Io { .. } => GenerationFailure::Network {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn status_errors_keep_their_code() {
        let failure = GenerationFailure::from(ServiceError::Status {
            status: 429,
            message: "slow down".to_string(),
        });
        assert_eq!(
            failure,
            GenerationFailure::Rejected {
                status: 429,
                message: "slow down".to_string()
            }
        );
    }

    #[test]
    fn missing_image_is_an_invalid_response() {
        let failure = GenerationFailure::from(ServiceError::MissingImage);
        assert_eq!(failure.label(), "invalid-response");
    }
}
