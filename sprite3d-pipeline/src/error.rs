use sprite3d_backend::BackendError;
use sprite3d_scene::{ObjectKey, SceneError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("engine interface {found} is too old, need {required} or higher")]
    InterfaceTooOld { found: i32, required: i32 },

    #[error("no render backend is active")]
    NoBackend,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("no live object with key {0}")]
    UnknownObject(ObjectKey),

    #[error("sprite {0} could not be read")]
    MissingSprite(i32),

    #[error("background frame {0} could not be read")]
    MissingBackground(i32),

    #[error("failed to load image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("saved state truncated: {read} of {expected} bytes")]
    TruncatedSave { read: usize, expected: usize },
}
