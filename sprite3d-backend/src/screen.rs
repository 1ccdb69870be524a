//! Screen and device state shared by the pipeline and the backends

use glam::{IVec2, Mat4};
use sprite3d_scene::{build_transform, DrawCommand, RelativeTo};

/// Loops per second assumed until the game says otherwise
pub const DEFAULT_GAME_SPEED: i32 = 40;

/// Process-wide screen state
///
/// Initialised at graphics-mode setup and refreshed every render stage.
/// Only `frame_delay` and `game_speed` survive a save/restore.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub width: i32,
    pub height: i32,
    pub bpp: i32,

    /// Room origin in viewport pixels (hosts without stage matrices)
    pub viewport: IVec2,

    pub game_speed: i32,
    /// Seconds per game loop
    pub frame_delay: f32,

    pub world: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
    /// Whether the host supplied the current matrices
    pub host_matrices: bool,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            bpp: 32,
            viewport: IVec2::ZERO,
            game_speed: DEFAULT_GAME_SPEED,
            frame_delay: 1.0 / DEFAULT_GAME_SPEED as f32,
            world: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            host_matrices: false,
        }
    }

    /// Set loops per second and derive the frame delay
    ///
    /// Non-positive speeds are ignored.
    pub fn set_game_speed(&mut self, speed: i32) -> bool {
        if speed <= 0 {
            log::warn!("ignoring game speed {}", speed);
            return false;
        }
        self.game_speed = speed;
        self.frame_delay = 1.0 / speed as f32;
        true
    }

    /// Install host matrices, defaulting whichever are missing
    pub fn set_matrices(&mut self, world: Option<&Mat4>, view: Option<&Mat4>, proj: Option<&Mat4>) {
        self.host_matrices = world.is_some() || view.is_some() || proj.is_some();
        self.world = world.copied().unwrap_or(Mat4::IDENTITY);
        self.view = view.copied().unwrap_or(Mat4::IDENTITY);
        self.proj = match proj {
            Some(proj) => *proj,
            None => pixel_projection(self.width, self.height),
        };
    }

    /// World part of the final transform, composed transform included
    ///
    /// Room objects go through the host world matrix and the viewport
    /// offset; screen objects through neither.
    pub fn world_transform(&self, sprite: &DrawCommand) -> Mat4 {
        match sprite.relative_to {
            RelativeTo::Room => {
                let offset = build_transform(
                    self.viewport.x as f32,
                    self.viewport.y as f32,
                    1.0,
                    1.0,
                );
                self.world * offset * sprite.transform
            }
            RelativeTo::Screen => sprite.transform,
        }
    }

    /// Full local-to-clip transform for one draw
    pub fn device_transform(&self, sprite: &DrawCommand) -> Mat4 {
        self.proj * self.view * self.world_transform(sprite)
    }
}

/// Orthographic projection mapping pixels straight onto the device
///
/// `(0, 0)` is the top-left corner, `(width, height)` the bottom-right.
pub fn pixel_projection(width: i32, height: i32) -> Mat4 {
    if width <= 0 || height <= 0 {
        return Mat4::IDENTITY;
    }
    build_transform(-1.0, 1.0, 2.0 / width as f32, -2.0 / height as f32)
}
