//! Scene objects (sprites and background captures)
//!
//! An object owns its local state and a backend texture handle. Its parent is
//! held as a key, never as ownership; composition with the parent happens in
//! the registry, which can resolve keys.

use crate::matrix::{build_rotation, build_transform, multiply, Matrix};
use crate::types::{ObjectKey, ObjectSource, RelativeTo, RenderStage, TextureHandle};
use glam::{IVec2, Vec2, Vec3};

/// A single transformable, renderable object with all its properties
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Key assigned by the registry on insertion
    pub key: ObjectKey,

    /// Where the pixels came from
    pub source: ObjectSource,

    /// Texture owned by the active backend
    pub texture: TextureHandle,
    /// Texture size in pixels
    pub width: u32,
    pub height: u32,

    // State flags
    pub enabled: bool,
    pub visible: bool,
    pub auto_updated: bool,
    pub auto_rendered: bool,

    // Transform properties
    /// Position in room or screen pixels
    pub position: IVec2,
    /// Pivot as a fraction of the texture size (not clamped)
    pub anchor: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    /// Uniform scale factor
    pub scaling: f32,

    // Colour modulation
    pub tint: Vec3,
    pub alpha: f32,

    pub render_stage: RenderStage,
    pub relative_to: RelativeTo,
    /// Room the object belongs to, -1 for none
    pub room: i32,

    parent: Option<ObjectKey>,

    /// Number of update ticks received
    pub update_ticks: u64,
}

impl SceneObject {
    /// Create an object with default properties around an existing texture
    pub fn new(source: ObjectSource, texture: TextureHandle, width: u32, height: u32) -> Self {
        Self {
            key: ObjectKey(0),
            source,
            texture,
            width,
            height,
            enabled: true,
            visible: true,
            auto_updated: false,
            auto_rendered: false,
            position: IVec2::ZERO,
            anchor: Vec2::ZERO,
            rotation: 0.0,
            scaling: 1.0,
            tint: Vec3::ONE,
            alpha: 1.0,
            render_stage: RenderStage::Scene,
            relative_to: RelativeTo::Room,
            room: -1,
            parent: None,
            update_ticks: 0,
        }
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = IVec2::new(x, y);
    }

    pub fn set_anchor(&mut self, x: f32, y: f32) {
        self.anchor = Vec2::new(x, y);
    }

    pub fn set_tint(&mut self, r: f32, g: f32, b: f32) {
        self.tint = Vec3::new(r, g, b);
    }

    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    /// Replace the parent key without any validation
    ///
    /// Callers outside the registry should use
    /// [`ObjectRegistry::set_parent`](crate::registry::ObjectRegistry::set_parent).
    pub(crate) fn set_parent_unchecked(&mut self, parent: Option<ObjectKey>) {
        self.parent = parent;
    }

    /// Enabled and visible
    pub fn is_drawable(&self) -> bool {
        self.enabled && self.visible
    }

    /// Per-frame update hook
    ///
    /// Objects carry no animation yet; the tick count is the only state.
    pub fn update(&mut self) {
        self.update_ticks += 1;
    }

    /// Local transform: rotate in local space, then scale and translate so
    /// the anchor lands on the position.
    pub fn local_transform(&self) -> Matrix {
        let s = self.scaling;
        let tx = self.position.x as f32 - self.anchor.x * self.width as f32 * s;
        let ty = self.position.y as f32 - self.anchor.y * self.height as f32 * s;
        multiply(build_rotation(self.rotation), build_transform(tx, ty, s, s))
    }
}
