use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required value for `{field}`")]
    Validation { field: &'static str },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("source is rate limiting requests for {reference}")]
    RateLimited { reference: String },

    #[error("could not extract `{field}` from raw value {raw:?}")]
    Extraction { field: &'static str, raw: String },

    #[error("persistence failed: {message}")]
    Persistence { message: String, conflict: bool },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ingestion cancelled after {completed} of {total} fixtures")]
    Cancelled { completed: usize, total: usize },
}

impl IngestError {
    pub fn extraction(field: &'static str, raw: impl Into<String>) -> Self {
        IngestError::Extraction {
            field,
            raw: raw.into(),
        }
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        IngestError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, IngestError::Persistence { conflict: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
