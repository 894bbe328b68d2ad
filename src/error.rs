use thiserror::Error;

/// Errors surfaced by the gallery engine.
///
/// None of these are fatal to the host application: a session that fails to
/// attach stays inert, and everything else is reported to the caller.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("gallery container not found: {0}")]
    ContainerNotFound(String),

    #[error("duplicate image id in gallery: {0}")]
    DuplicateImage(String),

    #[error("unknown image id: {0}")]
    UnknownImage(String),

    #[error("invalid gallery configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse gallery metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GalleryError>;
