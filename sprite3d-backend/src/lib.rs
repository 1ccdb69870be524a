//! Sprite3D render backends
//!
//! One backend-agnostic contract over two GPU pipelines:
//! - D3D9 style: fixed-function transforms, texture factor modulation
//! - OpenGL style: one shader program, the transform premultiplied on the CPU
//!
//! Both draw the same quad geometry from the same composed matrix, so the two
//! produce the same image. The GPU API itself sits behind a thin device
//! trait per backend ([`D3d9Device`], [`GlApi`]) supplied by the plugin glue.

pub mod backend;
pub mod d3d9;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod ogl;
pub mod screen;
pub mod shader;
pub mod texture;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use backend::*;
pub use d3d9::*;
pub use error::*;
pub use factory::*;
pub use geometry::*;
pub use ogl::*;
pub use screen::*;
pub use shader::*;
pub use texture::*;
