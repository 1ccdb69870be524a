//! The render backend contract
//!
//! The pipeline only ever talks to a `Box<dyn RenderBackend>`, chosen once at
//! graphics-mode initialisation and kept for the life of the process.

use crate::error::BackendError;
use crate::screen::Screen;
use sprite3d_scene::{DrawCommand, Filtering, Matrix, TextureHandle};

/// Supported GPU pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    D3d9,
    Ogl,
}

impl BackendKind {
    /// Parse a host driver identifier (`"d3d9"` or `"ogl"`, any case)
    pub fn from_driver_id(driver_id: &str) -> Result<Self, BackendError> {
        if driver_id.eq_ignore_ascii_case("d3d9") {
            Ok(BackendKind::D3d9)
        } else if driver_id.eq_ignore_ascii_case("ogl") {
            Ok(BackendKind::Ogl)
        } else {
            Err(BackendError::UnsupportedDriver(driver_id.to_string()))
        }
    }

    pub fn driver_id(self) -> &'static str {
        match self {
            BackendKind::D3d9 => "d3d9",
            BackendKind::Ogl => "ogl",
        }
    }
}

/// Host device pointer, passed through as an address
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceHandle(pub usize);

/// Backend capability set
///
/// Pixel rows passed to texture calls are top-to-bottom BGRA, 4 bytes per
/// pixel; a row may be longer than `width * 4` (pitch).
pub trait RenderBackend: Send {
    fn kind(&self) -> BackendKind;

    /// One-time device/context setup; fills in the real screen size.
    fn init_gfx_mode(&mut self, screen: &mut Screen) -> Result<(), BackendError>;

    /// Re-sync with the device the host is currently drawing with.
    ///
    /// Cheap when the handle did not change; called every frame.
    fn init_gfx_device(&mut self, device: DeviceHandle);

    /// Install the host world/view/projection
    ///
    /// Missing matrices fall back to identity and a pixel-exact orthographic
    /// projection.
    fn set_screen_matrixes(
        &mut self,
        screen: &mut Screen,
        world: Option<&Matrix>,
        view: Option<&Matrix>,
        proj: Option<&Matrix>,
    );

    fn create_texture(
        &mut self,
        rows: &[&[u8]],
        width: u32,
        height: u32,
        filtering: Filtering,
    ) -> Result<TextureHandle, BackendError>;

    /// Replace the full content of an existing texture of the same size.
    fn update_texture_data(
        &mut self,
        texture: TextureHandle,
        rows: &[&[u8]],
        width: u32,
        height: u32,
    ) -> Result<(), BackendError>;

    /// Free a texture; unknown handles are ignored.
    fn release_texture(&mut self, texture: TextureHandle);

    /// Draw one textured quad modulated by the command's tint and alpha.
    fn draw_sprite(&mut self, screen: &Screen, sprite: &DrawCommand) -> Result<(), BackendError>;

    /// Release every GPU resource still held.
    fn shutdown(&mut self);
}
