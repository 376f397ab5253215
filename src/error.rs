use thiserror::Error;

/// Document-level failures. Extraction itself never fails: malformed fragments
/// degrade to empty or partial facts instead of surfacing here.
#[derive(Debug, Error)]
pub enum EhfError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid page dump {path}: {source}")]
    PageDump {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("page dump {0} contains no pages")]
    EmptyDocument(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, EhfError>;
