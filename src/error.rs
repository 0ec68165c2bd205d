use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::ResourceKind;

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum DexError {
    #[error("{kind} request failed: {cause}")]
    RemoteFetchFailed { kind: ResourceKind, cause: String },

    #[error("catalog load failed")]
    #[diagnostic(help("the catalog is unloaded again; retrying the command starts a fresh load"))]
    CatalogLoadFailed {
        #[source]
        source: Box<DexError>,
    },

    #[error("failed to load species for generation {gen_id}")]
    GenerationLoadFailed {
        gen_id: u32,
        #[source]
        source: Box<DexError>,
    },

    #[error("catalog is not loaded yet; generation filtering needs the full catalog")]
    CatalogNotReady,

    #[error("classification failed: {0}")]
    ClassificationFailed(String),

    #[error("invalid generation: {0}")]
    InvalidGeneration(String),

    #[error("no entries match {0}")]
    NoMatches(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("classifier API key missing; set the {0} environment variable")]
    MissingApiKey(String),

    #[error("invalid image: {0}")]
    InvalidImage(String),
}

impl DexError {
    pub(crate) fn remote(kind: ResourceKind, cause: impl ToString) -> Self {
        DexError::RemoteFetchFailed {
            kind,
            cause: cause.to_string(),
        }
    }
}
