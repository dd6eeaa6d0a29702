use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum CaseReviewError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Prompt template error: {0}")]
    Template(String),

    #[error("Generation failed: {message}")]
    Generation {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Extraction failed: {message}")]
    Extraction {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("No case review has been generated yet")]
    NoReview,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CaseReviewError {
    pub fn generation(message: impl Into<String>) -> Self {
        CaseReviewError::Generation {
            message: message.into(),
            source: None,
        }
    }

    pub fn generation_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        CaseReviewError::Generation {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        CaseReviewError::Extraction {
            message: message.into(),
            source: None,
        }
    }
}

impl From<regex::Error> for CaseReviewError {
    fn from(err: regex::Error) -> Self {
        CaseReviewError::Extraction {
            message: "could not build extraction pattern".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "openai")]
impl From<reqwest::Error> for CaseReviewError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request to generation service timed out"
        } else if err.is_connect() {
            "could not connect to generation service"
        } else if err.is_decode() {
            "could not decode generation service response"
        } else {
            "request to generation service failed"
        };
        CaseReviewError::Generation {
            message: message.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

pub type Result<T> = std::result::Result<T, CaseReviewError>;
