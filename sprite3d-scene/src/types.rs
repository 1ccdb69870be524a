//! Core type definitions for the sprite scene
//!
//! Enumerations use the integer values the host scripting layer sees, so they
//! are `#[repr(C)]` and convert from raw integers.

use std::fmt;

/// Render pass an object is drawn in
///
/// Passes run once per frame in declaration order.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderStage {
    Background = 0,
    #[default]
    Scene = 1,
    Gui = 2,
    Screen = 3,
}

impl RenderStage {
    /// All stages in frame order.
    pub const ALL: [RenderStage; 4] = [
        RenderStage::Background,
        RenderStage::Scene,
        RenderStage::Gui,
        RenderStage::Screen,
    ];

    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(RenderStage::Background),
            1 => Some(RenderStage::Scene),
            2 => Some(RenderStage::Gui),
            3 => Some(RenderStage::Screen),
            _ => None,
        }
    }

    /// Whether this is the last stage of a frame
    pub fn is_last(self) -> bool {
        self == RenderStage::Screen
    }
}

/// Coordinate space of an object's position
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelativeTo {
    #[default]
    Room = 0,
    Screen = 1,
}

impl RelativeTo {
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(RelativeTo::Room),
            1 => Some(RelativeTo::Screen),
            _ => None,
        }
    }
}

/// Texture sampling filter
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filtering {
    #[default]
    Nearest = 0,
    Linear = 1,
}

impl Filtering {
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Filtering::Nearest),
            1 => Some(Filtering::Linear),
            _ => None,
        }
    }
}

/// What an object was opened from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectSource {
    /// Host sprite slot
    Sprite(i32),
    /// Image file resolved against the game directory
    File(String),
    /// Capture of a room background frame
    Background(i32),
}

/// Stable key of a live scene object
///
/// Keys are handed out in increasing order and never reused, so a key held
/// after its object was destroyed simply resolves to nothing.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(pub u32);

impl ObjectKey {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Backend-issued texture handle
///
/// Opaque to the scene; only the backend that created it can resolve it.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);
