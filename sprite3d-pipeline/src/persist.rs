//! Save-game state
//!
//! Two fields in a fixed order, native byte order, no version tag:
//! `frame_delay: f32` then `game_speed: i32`.

use crate::error::PipelineError;
use bytemuck::{Pod, Zeroable};
use sprite3d_backend::Screen;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SavedScreen {
    pub frame_delay: f32,
    pub game_speed: i32,
}

pub const SAVED_SCREEN_SIZE: usize = std::mem::size_of::<SavedScreen>();

impl SavedScreen {
    pub fn capture(screen: &Screen) -> Self {
        Self {
            frame_delay: screen.frame_delay,
            game_speed: screen.game_speed,
        }
    }

    /// Restore both fields verbatim
    pub fn apply(&self, screen: &mut Screen) {
        screen.frame_delay = self.frame_delay;
        screen.game_speed = self.game_speed;
    }

    pub fn to_bytes(self) -> [u8; SAVED_SCREEN_SIZE] {
        bytemuck::cast(self)
    }

    /// Read exactly [`SAVED_SCREEN_SIZE`] bytes; trailing bytes are left alone
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        let data = bytes
            .get(..SAVED_SCREEN_SIZE)
            .ok_or(PipelineError::TruncatedSave {
                read: bytes.len(),
                expected: SAVED_SCREEN_SIZE,
            })?;
        Ok(bytemuck::pod_read_unaligned(data))
    }
}
