//! Direct3D 9 device access through a C function table
//!
//! The C++ side owns the `IDirect3DDevice9` and its state blocks; Rust only
//! decides what to draw.

use libc::{c_int, c_void};
use sprite3d_backend::{BackBufferDesc, D3d9Device, DeviceHandle, QuadVertex, TransformState};
use sprite3d_scene::Filtering;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Sprite3dD3d9Shim {
    pub user: *mut c_void,
    pub attach: Option<unsafe extern "C" fn(user: *mut c_void, device: *mut c_void)>,
    /// Returns 0 when no device is attached yet
    pub back_buffer:
        Option<unsafe extern "C" fn(user: *mut c_void, width: *mut c_int, height: *mut c_int, bpp: *mut c_int) -> c_int>,
    /// `A8R8G8B8` managed texture; null on failure
    pub create_texture: Option<unsafe extern "C" fn(user: *mut c_void, width: u32, height: u32) -> *mut c_void>,
    /// Copy `len` bytes of `pitch`-byte BGRA rows into level 0; returns 0 on failure
    pub write_texture: Option<
        unsafe extern "C" fn(user: *mut c_void, texture: *mut c_void, bgra: *const u8, len: usize, pitch: usize) -> c_int,
    >,
    pub release_texture: Option<unsafe extern "C" fn(user: *mut c_void, texture: *mut c_void)>,
    /// `state`: 0 world, 1 view, 2 projection
    pub set_transform: Option<unsafe extern "C" fn(user: *mut c_void, state: c_int, matrix: *const f32)>,
    /// `filtering`: 0 point, 1 linear
    pub set_texture: Option<unsafe extern "C" fn(user: *mut c_void, texture: *mut c_void, filtering: c_int)>,
    pub set_texture_factor: Option<unsafe extern "C" fn(user: *mut c_void, argb: u32)>,
    /// Four `QuadVertex` in triangle-strip order
    pub draw_quad: Option<unsafe extern "C" fn(user: *mut c_void, vertices: *const QuadVertex)>,
}

pub struct ShimDevice {
    shim: Sprite3dD3d9Shim,
}

// The table is only ever called from the engine's render thread.
unsafe impl Send for ShimDevice {}

impl ShimDevice {
    /// Wrap a table; `None` if any entry is missing
    ///
    /// # Safety
    /// The table and `user` must stay valid until the backend shuts down.
    pub unsafe fn new(shim: Sprite3dD3d9Shim) -> Option<Self> {
        let complete = shim.attach.is_some()
            && shim.back_buffer.is_some()
            && shim.create_texture.is_some()
            && shim.write_texture.is_some()
            && shim.release_texture.is_some()
            && shim.set_transform.is_some()
            && shim.set_texture.is_some()
            && shim.set_texture_factor.is_some()
            && shim.draw_quad.is_some();
        complete.then_some(Self { shim })
    }
}

fn texture_ptr(texture: u64) -> *mut c_void {
    texture as usize as *mut c_void
}

impl D3d9Device for ShimDevice {
    fn attach(&mut self, device: DeviceHandle) {
        if let Some(f) = self.shim.attach {
            unsafe { f(self.shim.user, device.0 as *mut c_void) }
        }
    }

    fn back_buffer(&mut self) -> Option<BackBufferDesc> {
        let f = self.shim.back_buffer?;
        let (mut width, mut height, mut bpp) = (0, 0, 0);
        let ok = unsafe { f(self.shim.user, &mut width, &mut height, &mut bpp) };
        (ok != 0).then_some(BackBufferDesc { width, height, bpp })
    }

    fn create_texture(&mut self, width: u32, height: u32) -> Option<u64> {
        let f = self.shim.create_texture?;
        let texture = unsafe { f(self.shim.user, width, height) };
        (!texture.is_null()).then_some(texture as usize as u64)
    }

    fn write_texture(&mut self, texture: u64, bgra: &[u8], pitch: usize) -> bool {
        match self.shim.write_texture {
            Some(f) => unsafe {
                f(self.shim.user, texture_ptr(texture), bgra.as_ptr(), bgra.len(), pitch) != 0
            },
            None => false,
        }
    }

    fn release_texture(&mut self, texture: u64) {
        if let Some(f) = self.shim.release_texture {
            unsafe { f(self.shim.user, texture_ptr(texture)) }
        }
    }

    fn set_transform(&mut self, state: TransformState, matrix: &[f32; 16]) {
        let state = match state {
            TransformState::World => 0,
            TransformState::View => 1,
            TransformState::Projection => 2,
        };
        if let Some(f) = self.shim.set_transform {
            unsafe { f(self.shim.user, state, matrix.as_ptr()) }
        }
    }

    fn set_texture(&mut self, texture: u64, filtering: Filtering) {
        if let Some(f) = self.shim.set_texture {
            unsafe { f(self.shim.user, texture_ptr(texture), filtering as c_int) }
        }
    }

    fn set_texture_factor(&mut self, argb: u32) {
        if let Some(f) = self.shim.set_texture_factor {
            unsafe { f(self.shim.user, argb) }
        }
    }

    fn draw_quad(&mut self, vertices: &[QuadVertex; 4]) {
        if let Some(f) = self.shim.draw_quad {
            unsafe { f(self.shim.user, vertices.as_ptr()) }
        }
    }
}
