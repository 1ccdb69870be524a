//! What the pipeline needs from the game engine

use crate::source::Bitmap;
use glam::Mat4;
use sprite3d_scene::ObjectKey;
use std::path::PathBuf;

/// World/view/projection of the stage being drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageMatrices {
    pub world: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
}

/// Engine services used by the plugin
///
/// Everything is called from the engine's own thread, in callback order.
pub trait Host {
    fn interface_version(&self) -> i32;

    /// Width, height and colour depth of the game screen
    fn screen_dimensions(&self) -> (i32, i32, i32);

    /// Matrices of the stage currently being drawn (interface 25+)
    fn render_stage_matrices(&self) -> Option<StageMatrices>;

    /// Convert room coordinates to viewport coordinates
    fn room_to_viewport(&self, x: i32, y: i32) -> (i32, i32);

    /// 32-bit BGRA copy of a sprite
    fn sprite_bitmap(&self, sprite: i32) -> Option<Bitmap>;

    /// 32-bit BGRA copy of a room background frame
    fn background_bitmap(&self, frame: i32) -> Option<Bitmap>;

    /// Path of a file shipped in the compiled game folder
    fn resolve_game_path(&self, file: &str) -> PathBuf;

    /// Hand an object to the engine's reference-counted object tracker
    ///
    /// The engine later asks for its disposal once no script holds it.
    fn register_managed_object(&mut self, key: ObjectKey);

    fn write_save(&mut self, handle: i32, bytes: &[u8]);

    /// Read up to `buf.len()` bytes, returning how many were read
    fn read_save(&mut self, handle: i32, buf: &mut [u8]) -> usize;

    /// Stop the game with a message; the plugin must not assume it is
    /// initialised afterwards.
    fn abort_game(&mut self, message: &str);

    fn is_game_paused(&self) -> bool;
}

impl<H: Host + ?Sized> Host for &mut H {
    fn interface_version(&self) -> i32 {
        (**self).interface_version()
    }

    fn screen_dimensions(&self) -> (i32, i32, i32) {
        (**self).screen_dimensions()
    }

    fn render_stage_matrices(&self) -> Option<StageMatrices> {
        (**self).render_stage_matrices()
    }

    fn room_to_viewport(&self, x: i32, y: i32) -> (i32, i32) {
        (**self).room_to_viewport(x, y)
    }

    fn sprite_bitmap(&self, sprite: i32) -> Option<Bitmap> {
        (**self).sprite_bitmap(sprite)
    }

    fn background_bitmap(&self, frame: i32) -> Option<Bitmap> {
        (**self).background_bitmap(frame)
    }

    fn resolve_game_path(&self, file: &str) -> PathBuf {
        (**self).resolve_game_path(file)
    }

    fn register_managed_object(&mut self, key: ObjectKey) {
        (**self).register_managed_object(key)
    }

    fn write_save(&mut self, handle: i32, bytes: &[u8]) {
        (**self).write_save(handle, bytes)
    }

    fn read_save(&mut self, handle: i32, buf: &mut [u8]) -> usize {
        (**self).read_save(handle, buf)
    }

    fn abort_game(&mut self, message: &str) {
        (**self).abort_game(message)
    }

    fn is_game_paused(&self) -> bool {
        (**self).is_game_paused()
    }
}
