//! Per-stage draw scheduling
//!
//! A stage draws the automatic sweep (auto-rendered objects assigned to it)
//! followed by the manually queued batch, filtered by stage at dispatch time.

use sprite3d_scene::{DrawCommand, ObjectKey, ObjectRegistry, RenderStage};

/// Objects queued for drawing during the current frame
///
/// Append-only until the frame's last stage, then cleared. Duplicates are
/// kept and draw once per entry.
#[derive(Debug, Default, Clone)]
pub struct RenderBatch {
    queued: Vec<ObjectKey>,
}

impl RenderBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: ObjectKey) {
        self.queued.push(key);
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn clear(&mut self) {
        self.queued.clear();
    }

    pub fn keys(&self) -> &[ObjectKey] {
        &self.queued
    }

    /// Queued draws for `stage`, in queue order
    ///
    /// Destroyed, disabled and hidden objects are skipped.
    pub fn stage_commands(&self, registry: &ObjectRegistry, stage: RenderStage) -> Vec<DrawCommand> {
        self.queued
            .iter()
            .filter_map(|key| registry.draw_command(*key))
            .filter(|cmd| cmd.stage == stage)
            .collect()
    }
}

/// Everything drawn during `stage`: automatic sweep, then the batch
pub fn stage_draw_list(
    registry: &ObjectRegistry,
    batch: &RenderBatch,
    stage: RenderStage,
) -> Vec<DrawCommand> {
    let mut commands = registry.stage_commands(stage);
    commands.extend(batch.stage_commands(registry, stage));
    commands
}
