//! Sprite3D render pipeline
//!
//! Owns the per-process plugin state (screen, active backend, object
//! registry, manual render batch) and turns host callbacks into updates and
//! stage renders.

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod persist;
pub mod plugin;
pub mod scheduler;
pub mod source;

#[cfg(test)]
mod testing;

pub use config::*;
pub use error::*;
pub use events::*;
pub use host::*;
pub use persist::*;
pub use plugin::*;
pub use scheduler::*;
pub use source::*;
