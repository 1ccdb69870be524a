//! Draw commands handed to the render backends
//!
//! A command is everything a backend needs to draw one object: its texture,
//! the composed transform and the inherited colour modulation.

use crate::matrix::Matrix;
use crate::object::SceneObject;
use crate::types::{ObjectKey, RelativeTo, RenderStage, TextureHandle};
use glam::{Vec3, Vec4};

/// A draw command for a single scene object
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Object the command was resolved from
    pub key: ObjectKey,

    /// Texture to sample
    pub texture: TextureHandle,
    /// Quad size in pixels
    pub width: u32,
    pub height: u32,

    /// Composed transform (local folded into every ancestor)
    pub transform: Matrix,

    /// Inherited tint and alpha
    pub tint: Vec3,
    pub alpha: f32,

    pub stage: RenderStage,
    pub relative_to: RelativeTo,
}

impl DrawCommand {
    /// Create a draw command from an object and its resolved state
    pub fn from_object(obj: &SceneObject, transform: Matrix, tint: Vec3, alpha: f32) -> Self {
        Self {
            key: obj.key,
            texture: obj.texture,
            width: obj.width,
            height: obj.height,
            transform,
            tint,
            alpha,
            stage: obj.render_stage,
            relative_to: obj.relative_to,
        }
    }

    /// RGBA modulation colour, clamped to the displayable range
    pub fn modulation(&self) -> Vec4 {
        self.tint.extend(self.alpha).clamp(Vec4::ZERO, Vec4::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectSource;

    #[test]
    fn test_draw_command_creation() {
        let mut obj = SceneObject::new(ObjectSource::Background(0), TextureHandle(9), 320, 200);
        obj.key = ObjectKey(4);
        obj.render_stage = RenderStage::Background;

        let cmd = DrawCommand::from_object(&obj, Matrix::IDENTITY, Vec3::ONE, 0.5);
        assert_eq!(cmd.key, ObjectKey(4));
        assert_eq!(cmd.texture, TextureHandle(9));
        assert_eq!((cmd.width, cmd.height), (320, 200));
        assert_eq!(cmd.stage, RenderStage::Background);
        assert_eq!(cmd.alpha, 0.5);
    }

    #[test]
    fn test_modulation_clamped() {
        let obj = SceneObject::new(ObjectSource::Sprite(1), TextureHandle(1), 1, 1);
        let cmd = DrawCommand::from_object(&obj, Matrix::IDENTITY, Vec3::new(1.5, 0.5, -0.2), 2.0);
        assert_eq!(cmd.modulation(), Vec4::new(1.0, 0.5, 0.0, 1.0));
    }
}
