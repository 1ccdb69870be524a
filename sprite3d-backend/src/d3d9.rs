//! Direct3D 9 backend
//!
//! Uses the fixed-function pipeline: VIEW and PROJECTION are set once per
//! stage, WORLD per sprite, and the tint goes through the texture factor.
//! Matrices are handed over as 16 floats in glam column order, which is the
//! row-major row-vector layout `SetTransform` expects.

use crate::backend::{BackendKind, DeviceHandle, RenderBackend};
use crate::error::BackendError;
use crate::geometry::{pack_argb, sprite_quad, QuadVertex};
use crate::screen::Screen;
use crate::texture::{pack_rows, TextureEntry, TextureTable, BYTES_PER_PIXEL};
use sprite3d_scene::{build_transform, to_device_array, DrawCommand, Filtering, Matrix, TextureHandle};

/// Back buffer description as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackBufferDesc {
    pub width: i32,
    pub height: i32,
    pub bpp: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformState {
    World,
    View,
    Projection,
}

/// The slice of `IDirect3DDevice9` the backend needs
///
/// Textures are `A8R8G8B8` in the managed pool; the returned id is the
/// texture pointer as an integer.
pub trait D3d9Device: Send {
    /// Point at the device the host is currently drawing with
    fn attach(&mut self, device: DeviceHandle);
    fn back_buffer(&mut self) -> Option<BackBufferDesc>;

    fn create_texture(&mut self, width: u32, height: u32) -> Option<u64>;
    /// Lock level 0, copy `pitch`-byte rows of BGRA, unlock
    fn write_texture(&mut self, texture: u64, bgra: &[u8], pitch: usize) -> bool;
    fn release_texture(&mut self, texture: u64);

    fn set_transform(&mut self, state: TransformState, matrix: &[f32; 16]);
    /// Bind to stage 0 with the given min/mag filter
    fn set_texture(&mut self, texture: u64, filtering: Filtering);
    /// `D3DRS_TEXTUREFACTOR`, modulated with the texture colour and alpha
    fn set_texture_factor(&mut self, argb: u32);
    fn draw_quad(&mut self, vertices: &[QuadVertex; 4]);
}

pub struct D3d9Backend {
    device: Box<dyn D3d9Device>,
    handle: DeviceHandle,
    textures: TextureTable<u64>,
}

impl D3d9Backend {
    pub fn new(device: Box<dyn D3d9Device>) -> Self {
        Self {
            device,
            handle: DeviceHandle::default(),
            textures: TextureTable::new(),
        }
    }

    fn upload(&mut self, native: u64, rows: &[&[u8]], width: u32, height: u32) -> bool {
        match pack_rows(rows, width, height) {
            Ok(pixels) => {
                self.device
                    .write_texture(native, &pixels, width as usize * BYTES_PER_PIXEL)
            }
            Err(err) => {
                log::warn!("D3D9: {}", err);
                false
            }
        }
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

/// Shift by half a pixel so texels land on pixel centres
fn half_pixel_offset() -> Matrix {
    build_transform(-0.5, -0.5, 1.0, 1.0)
}

impl RenderBackend for D3d9Backend {
    fn kind(&self) -> BackendKind {
        BackendKind::D3d9
    }

    fn init_gfx_mode(&mut self, screen: &mut Screen) -> Result<(), BackendError> {
        if let Some(desc) = self.device.back_buffer() {
            screen.width = desc.width;
            screen.height = desc.height;
            screen.bpp = desc.bpp;
        }
        log::info!(
            "D3D9: initialised for {}x{}x{}",
            screen.width,
            screen.height,
            screen.bpp
        );
        Ok(())
    }

    fn init_gfx_device(&mut self, device: DeviceHandle) {
        if self.handle == device {
            return;
        }
        log::debug!("D3D9: device changed {:#x} -> {:#x}", self.handle.0, device.0);
        self.handle = device;
        self.device.attach(device);
    }

    fn set_screen_matrixes(
        &mut self,
        screen: &mut Screen,
        world: Option<&Matrix>,
        view: Option<&Matrix>,
        proj: Option<&Matrix>,
    ) {
        screen.set_matrices(world, view, proj);

        let proj = if screen.host_matrices {
            screen.proj
        } else {
            screen.proj * half_pixel_offset()
        };
        self.device
            .set_transform(TransformState::View, &to_device_array(&screen.view));
        self.device
            .set_transform(TransformState::Projection, &to_device_array(&proj));
    }

    fn create_texture(
        &mut self,
        rows: &[&[u8]],
        width: u32,
        height: u32,
        filtering: Filtering,
    ) -> Result<TextureHandle, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidPixels(format!(
                "empty texture {}x{}",
                width, height
            )));
        }
        let native = self
            .device
            .create_texture(width, height)
            .ok_or(BackendError::TextureAllocation { width, height })?;

        let handle = self.textures.insert(TextureEntry {
            native,
            width,
            height,
            filtering,
        });
        if !self.upload(native, rows, width, height) {
            self.textures.remove(handle);
            self.device.release_texture(native);
            return Err(BackendError::TextureUpload(handle));
        }
        Ok(handle)
    }

    fn update_texture_data(
        &mut self,
        texture: TextureHandle,
        rows: &[&[u8]],
        width: u32,
        height: u32,
    ) -> Result<(), BackendError> {
        let entry = self.textures.get_sized(texture, width, height)?;
        if !self.upload(entry.native, rows, width, height) {
            return Err(BackendError::TextureUpload(texture));
        }
        Ok(())
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if let Some(entry) = self.textures.remove(texture) {
            self.device.release_texture(entry.native);
        }
    }

    fn draw_sprite(&mut self, screen: &Screen, sprite: &DrawCommand) -> Result<(), BackendError> {
        let entry = self.textures.get(sprite.texture)?;

        let world = to_device_array(&screen.world_transform(sprite));
        self.device.set_transform(TransformState::World, &world);
        self.device.set_texture(entry.native, entry.filtering);
        self.device.set_texture_factor(pack_argb(sprite.modulation()));
        self.device.draw_quad(&sprite_quad(sprite.width, sprite.height));
        Ok(())
    }

    fn shutdown(&mut self) {
        for native in self.textures.drain() {
            self.device.release_texture(native);
        }
        log::info!("D3D9: shut down");
    }
}
