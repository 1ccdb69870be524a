use crate::backend::BackendKind;
use crate::shader::ShaderStage;
use sprite3d_scene::TextureHandle;
use thiserror::Error;

/// Backend failures
///
/// Resource failures are reported once and leave no GPU object behind.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("graphics renderer not supported ({0})")]
    UnsupportedDriver(String),

    #[error("{given:?} device handed to the {expected:?} backend")]
    DeviceMismatch {
        expected: BackendKind,
        given: BackendKind,
    },

    #[error("no {0:?} device access was provided")]
    DeviceUnavailable(BackendKind),

    #[error("backend used before graphics mode initialisation")]
    NotInitialized,

    #[error("invalid pixel rows: {0}")]
    InvalidPixels(String),

    #[error("texture allocation failed ({width}x{height})")]
    TextureAllocation { width: u32, height: u32 },

    #[error("texture upload failed for {0:?}")]
    TextureUpload(TextureHandle),

    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureHandle),

    #[error("texture {texture:?} is {expected:?}, data is {actual:?}")]
    SizeMismatch {
        texture: TextureHandle,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("could not create {stage} shader object for {name}")]
    ShaderCreate { name: String, stage: ShaderStage },

    #[error("{name} program's {stage} shader failed to compile")]
    ShaderCompile {
        name: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("{name} program failed to link")]
    ShaderLink { name: String, log: String },
}
