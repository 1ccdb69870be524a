//! Quad geometry shared by both backends

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

/// One corner of a sprite quad
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    /// Local pixel position (z = 0)
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Pixel-space quad covering a `width` x `height` texture
///
/// Triangle-strip order: top-left, top-right, bottom-left, bottom-right.
pub fn sprite_quad(width: u32, height: u32) -> [QuadVertex; 4] {
    let w = width as f32;
    let h = height as f32;
    [
        QuadVertex { position: [0.0, 0.0, 0.0], uv: [0.0, 0.0] },
        QuadVertex { position: [w, 0.0, 0.0], uv: [1.0, 0.0] },
        QuadVertex { position: [0.0, h, 0.0], uv: [0.0, 1.0] },
        QuadVertex { position: [w, h, 0.0], uv: [1.0, 1.0] },
    ]
}

/// Pack an RGBA modulation colour as a D3D `ARGB` dword
pub fn pack_argb(color: Vec4) -> u32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(color.w) << 24) | (channel(color.x) << 16) | (channel(color.y) << 8) | channel(color.z)
}
