//! Sprite3D scene graph
//!
//! Transformable 2D sprites drawn as textured quads through a host-provided
//! world/view/projection.
//!
//! Key pieces:
//! - Affine 4x4 matrix helpers on top of glam (SIMD)
//! - Scene objects with local transform, tint, alpha and a weak parent key
//! - Arena registry with stable keys and insertion-ordered traversal
//! - Draw commands resolved per render stage for the backends

pub mod matrix;
pub mod object;
pub mod registry;
pub mod render;
pub mod types;

pub use matrix::*;
pub use object::*;
pub use registry::*;
pub use render::*;
pub use types::*;

pub fn version() -> &'static str {
    "0.1.0"
}
