use std::io;

use crate::artifact::ArtifactError;
use crate::classifier::ClassifierError;
use crate::dataset::DatasetError;

/// Errors that abort a batch job (preprocess, train, evaluate) or service start-up.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
