use thiserror::Error;

pub type VigilResult<T> = Result<T, VigilError>;

#[derive(Error, Debug)]
pub enum VigilError {
    #[error("Classifier artifact error: {0}")]
    ClassifierArtifact(String),

    #[error("Classifier inference error: {0}")]
    ClassifierInference(String),

    #[error("Knowledge index error: {0}")]
    KnowledgeIndex(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Case log error: {0}")]
    CaseLog(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}
