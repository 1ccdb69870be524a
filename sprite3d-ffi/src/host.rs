//! Engine services table and its `Host` implementation
//!
//! The engine interface is a C++ class; a thin C++ shim copies the calls the
//! plugin needs into [`Sprite3dEngineApi`] and hands it over at startup.

use glam::Mat4;
use libc::{c_char, c_int, c_void};
use sprite3d_pipeline::{Bitmap, Host, StageMatrices};
use sprite3d_scene::ObjectKey;
use std::ffi::{CStr, CString};
use std::path::PathBuf;

use crate::d3d9_shim::Sprite3dD3d9Shim;

/// Borrowed view of an engine bitmap surface
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Sprite3dBitmapView {
    pub pixels: *const u8,
    pub width: c_int,
    pub height: c_int,
    /// Bytes per row
    pub pitch: c_int,
    /// Bits per pixel; only 32 is accepted
    pub bpp: c_int,
}

impl Default for Sprite3dBitmapView {
    fn default() -> Self {
        Self {
            pixels: std::ptr::null(),
            width: 0,
            height: 0,
            pitch: 0,
            bpp: 0,
        }
    }
}

pub type GetProcAddress = unsafe extern "system" fn(name: *const c_char) -> *const c_void;

/// Engine callbacks
///
/// Every function receives `user` as its first argument. Missing entries are
/// treated as "not available" and fall back to neutral answers.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Sprite3dEngineApi {
    pub user: *mut c_void,
    /// Engine plugin interface version
    pub version: c_int,

    pub get_screen_dimensions:
        Option<unsafe extern "C" fn(user: *mut c_void, width: *mut c_int, height: *mut c_int, bpp: *mut c_int)>,
    /// Fill three column-major 4x4 matrices; returns 0 when unavailable
    pub get_render_stage_matrices: Option<
        unsafe extern "C" fn(user: *mut c_void, world: *mut f32, view: *mut f32, proj: *mut f32) -> c_int,
    >,
    pub room_to_viewport: Option<unsafe extern "C" fn(user: *mut c_void, x: *mut c_int, y: *mut c_int)>,

    /// Lock a sprite surface; returns 0 when the sprite does not exist
    pub get_sprite_bitmap:
        Option<unsafe extern "C" fn(user: *mut c_void, sprite: c_int, out: *mut Sprite3dBitmapView) -> c_int>,
    /// Lock a room background frame; returns 0 when the frame does not exist
    pub get_background_bitmap:
        Option<unsafe extern "C" fn(user: *mut c_void, frame: c_int, out: *mut Sprite3dBitmapView) -> c_int>,
    /// Unlock a surface returned by one of the two calls above
    pub release_bitmap: Option<unsafe extern "C" fn(user: *mut c_void, view: *const Sprite3dBitmapView)>,

    pub resolve_game_path:
        Option<unsafe extern "C" fn(user: *mut c_void, file: *const c_char, buffer: *mut c_char, len: usize)>,
    pub register_managed_object: Option<unsafe extern "C" fn(user: *mut c_void, object: *const c_void)>,
    pub register_script_function:
        Option<unsafe extern "C" fn(user: *mut c_void, name: *const c_char, func: *const c_void)>,
    pub request_event_hook: Option<unsafe extern "C" fn(user: *mut c_void, event: c_int)>,

    pub fwrite: Option<unsafe extern "C" fn(user: *mut c_void, handle: c_int, data: *const c_void, len: usize)>,
    pub fread: Option<unsafe extern "C" fn(user: *mut c_void, handle: c_int, data: *mut c_void, len: usize) -> usize>,

    pub abort_game: Option<unsafe extern "C" fn(user: *mut c_void, message: *const c_char)>,
    pub is_game_paused: Option<unsafe extern "C" fn(user: *mut c_void) -> c_int>,

    /// OpenGL symbol loader, null on Direct3D builds
    pub gl_get_proc_address: Option<GetProcAddress>,
    /// Direct3D 9 device table, null on OpenGL builds
    pub d3d9: *const Sprite3dD3d9Shim,
}

/// Max path length accepted from the engine
const PATH_BUFFER_LEN: usize = 4096;

/// Script handle for an object
///
/// Objects are handed to the engine as their key, so script calls never
/// dereference engine-supplied pointers.
pub fn object_address(key: ObjectKey) -> *const c_void {
    key.raw() as usize as *const c_void
}

pub fn object_key(address: *const c_void) -> ObjectKey {
    ObjectKey(address as usize as u32)
}

pub struct EngineHost {
    api: Sprite3dEngineApi,
}

// Engine callbacks only ever arrive on the engine's main thread; the table is
// moved into the plugin state once and never used concurrently.
unsafe impl Send for EngineHost {}

impl EngineHost {
    /// # Safety
    /// Every non-null function in `api` must stay callable with `api.user`
    /// until shutdown.
    pub unsafe fn new(api: Sprite3dEngineApi) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Sprite3dEngineApi {
        &self.api
    }

    pub fn request_event_hook(&mut self, event: c_int) {
        if let Some(f) = self.api.request_event_hook {
            unsafe { f(self.api.user, event) }
        }
    }

    pub fn register_script_function(&mut self, name: &CStr, func: *const c_void) {
        if let Some(f) = self.api.register_script_function {
            unsafe { f(self.api.user, name.as_ptr(), func) }
        }
    }

    /// Copy a locked surface, then unlock it
    fn copy_bitmap(&self, locked: bool, view: &Sprite3dBitmapView) -> Option<Bitmap> {
        if !locked {
            return None;
        }

        let bitmap = if view.bpp != 32 {
            log::warn!("{}-bit surface ignored, need 32-bit", view.bpp);
            None
        } else if view.pixels.is_null() || view.width <= 0 || view.height <= 0 || view.pitch < view.width * 4 {
            log::warn!("invalid surface {}x{} pitch {}", view.width, view.height, view.pitch);
            None
        } else {
            let len = view.pitch as usize * view.height as usize;
            let pixels = unsafe { std::slice::from_raw_parts(view.pixels, len) }.to_vec();
            Some(Bitmap {
                width: view.width as u32,
                height: view.height as u32,
                pitch: view.pitch as usize,
                pixels,
            })
        };

        if let Some(release) = self.api.release_bitmap {
            unsafe { release(self.api.user, view) }
        }
        bitmap
    }
}

impl Host for EngineHost {
    fn interface_version(&self) -> i32 {
        self.api.version
    }

    fn screen_dimensions(&self) -> (i32, i32, i32) {
        let (mut width, mut height, mut bpp) = (0, 0, 32);
        if let Some(f) = self.api.get_screen_dimensions {
            unsafe { f(self.api.user, &mut width, &mut height, &mut bpp) }
        }
        (width, height, bpp)
    }

    fn render_stage_matrices(&self) -> Option<StageMatrices> {
        let f = self.api.get_render_stage_matrices?;
        let mut world = [0f32; 16];
        let mut view = [0f32; 16];
        let mut proj = [0f32; 16];
        let ok = unsafe {
            f(
                self.api.user,
                world.as_mut_ptr(),
                view.as_mut_ptr(),
                proj.as_mut_ptr(),
            )
        };
        (ok != 0).then(|| StageMatrices {
            world: Mat4::from_cols_array(&world),
            view: Mat4::from_cols_array(&view),
            proj: Mat4::from_cols_array(&proj),
        })
    }

    fn room_to_viewport(&self, x: i32, y: i32) -> (i32, i32) {
        let (mut x, mut y) = (x, y);
        if let Some(f) = self.api.room_to_viewport {
            unsafe { f(self.api.user, &mut x, &mut y) }
        }
        (x, y)
    }

    fn sprite_bitmap(&self, sprite: i32) -> Option<Bitmap> {
        let f = self.api.get_sprite_bitmap?;
        let mut view = Sprite3dBitmapView::default();
        let locked = unsafe { f(self.api.user, sprite, &mut view) } != 0;
        self.copy_bitmap(locked, &view)
    }

    fn background_bitmap(&self, frame: i32) -> Option<Bitmap> {
        let f = self.api.get_background_bitmap?;
        let mut view = Sprite3dBitmapView::default();
        let locked = unsafe { f(self.api.user, frame, &mut view) } != 0;
        self.copy_bitmap(locked, &view)
    }

    fn resolve_game_path(&self, file: &str) -> PathBuf {
        let (Some(f), Ok(name)) = (self.api.resolve_game_path, CString::new(file)) else {
            return PathBuf::from(file);
        };
        let mut buffer = vec![0 as c_char; PATH_BUFFER_LEN];
        unsafe { f(self.api.user, name.as_ptr(), buffer.as_mut_ptr(), buffer.len()) };
        // Force termination in case the engine filled the whole buffer.
        buffer[PATH_BUFFER_LEN - 1] = 0;
        let resolved = unsafe { CStr::from_ptr(buffer.as_ptr()) };
        PathBuf::from(resolved.to_string_lossy().into_owned())
    }

    fn register_managed_object(&mut self, key: ObjectKey) {
        if let Some(f) = self.api.register_managed_object {
            unsafe { f(self.api.user, object_address(key)) }
        }
    }

    fn write_save(&mut self, handle: i32, bytes: &[u8]) {
        if let Some(f) = self.api.fwrite {
            unsafe { f(self.api.user, handle, bytes.as_ptr().cast(), bytes.len()) }
        }
    }

    fn read_save(&mut self, handle: i32, buf: &mut [u8]) -> usize {
        match self.api.fread {
            Some(f) => unsafe { f(self.api.user, handle, buf.as_mut_ptr().cast(), buf.len()) },
            None => 0,
        }
    }

    fn abort_game(&mut self, message: &str) {
        let Some(f) = self.api.abort_game else {
            log::error!("{}", message);
            return;
        };
        let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
        unsafe { f(self.api.user, message.as_ptr()) }
    }

    fn is_game_paused(&self) -> bool {
        match self.api.is_game_paused {
            Some(f) => unsafe { f(self.api.user) != 0 },
            None => false,
        }
    }
}
