//! Object registry with arena storage and stable keys
//!
//! Objects live in a Vec in insertion order, which is also the order every
//! per-frame sweep visits them. Parents are referenced by key and resolved at
//! composition time; a key whose object is gone behaves as "no parent".
//!
//! The registry never decides when an object dies. The host's reference
//! tracker asks for removal, and the caller releases the texture.

use crate::matrix::{multiply, Matrix};
use crate::object::SceneObject;
use crate::render::DrawCommand;
use crate::types::{ObjectKey, RenderStage};
use glam::Vec3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("no live object with key {0}")]
    UnknownObject(ObjectKey),

    #[error("parenting {child} to {parent} would create a cycle")]
    ParentCycle { child: ObjectKey, parent: ObjectKey },
}

/// All live scene objects
#[derive(Debug)]
pub struct ObjectRegistry {
    /// Insertion-ordered storage
    objects: Vec<SceneObject>,

    /// Next key to hand out; keys are never reused
    next_key: u32,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            objects: Vec::with_capacity(16),
            next_key: 1,
        }
    }

    /// Add an object and return its key
    pub fn insert(&mut self, mut obj: SceneObject) -> ObjectKey {
        let key = ObjectKey(self.next_key);
        self.next_key += 1;
        obj.key = key;
        self.objects.push(obj);
        key
    }

    /// Remove an object, handing it back so its texture can be released
    ///
    /// Children keep their parent key; it no longer resolves.
    pub fn remove(&mut self, key: ObjectKey) -> Option<SceneObject> {
        let pos = self.position(key)?;
        Some(self.objects.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, key: ObjectKey) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.iter().find(|obj| obj.key == key)
    }

    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|obj| obj.key == key)
    }

    /// Objects in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    /// Remove every object, in insertion order
    pub fn drain(&mut self) -> Vec<SceneObject> {
        std::mem::take(&mut self.objects)
    }

    fn position(&self, key: ObjectKey) -> Option<usize> {
        self.objects.iter().position(|obj| obj.key == key)
    }

    /// Replace an object's parent
    ///
    /// `None` clears it. A parent that would make the chain loop back onto
    /// `child` is rejected and the previous parent stays.
    pub fn set_parent(
        &mut self,
        child: ObjectKey,
        parent: Option<ObjectKey>,
    ) -> Result<(), SceneError> {
        if !self.contains(child) {
            return Err(SceneError::UnknownObject(child));
        }

        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(SceneError::UnknownObject(parent));
            }

            let mut cursor = Some(parent);
            while let Some(key) = cursor {
                if key == child {
                    log::warn!("rejected parent {} for {}: cycle", parent, child);
                    return Err(SceneError::ParentCycle { child, parent });
                }
                cursor = self.get(key).and_then(SceneObject::parent);
            }
        }

        if let Some(obj) = self.get_mut(child) {
            obj.set_parent_unchecked(parent);
        }
        Ok(())
    }

    /// Walk from `key` up through every resolvable ancestor
    fn ancestry(&self, key: ObjectKey) -> impl Iterator<Item = &SceneObject> {
        std::iter::successors(self.get(key), move |obj| {
            obj.parent().and_then(|parent| self.get(parent))
        })
    }

    /// Composed transform: local, then each ancestor's local, outwards
    ///
    /// Parenting is global. A parent's rotation moves and turns its children,
    /// while a child's own rotation only spins it in its local space.
    pub fn effective_transform(&self, key: ObjectKey) -> Option<Matrix> {
        let mut chain = self.ancestry(key);
        let first = chain.next()?.local_transform();
        Some(chain.fold(first, |acc, ancestor| {
            multiply(acc, ancestor.local_transform())
        }))
    }

    /// Tint and alpha multiplied down the parent chain
    pub fn effective_color(&self, key: ObjectKey) -> Option<(Vec3, f32)> {
        let mut chain = self.ancestry(key).peekable();
        chain.peek()?;
        Some(chain.fold((Vec3::ONE, 1.0), |(tint, alpha), obj| {
            (tint * obj.tint, alpha * obj.alpha)
        }))
    }

    /// Update one object regardless of its auto-update flag
    pub fn update(&mut self, key: ObjectKey) -> bool {
        match self.get_mut(key) {
            Some(obj) => {
                obj.update();
                true
            }
            None => false,
        }
    }

    /// Update every auto-updated object in insertion order
    ///
    /// Returns the number of objects updated.
    pub fn update_all(&mut self) -> usize {
        let mut count = 0;
        for obj in self.objects.iter_mut().filter(|obj| obj.auto_updated) {
            obj.update();
            count += 1;
        }
        count
    }

    /// Resolve a draw command for one object
    ///
    /// `None` when the object is gone, disabled or invisible.
    pub fn draw_command(&self, key: ObjectKey) -> Option<DrawCommand> {
        let obj = self.get(key)?;
        if !obj.is_drawable() {
            return None;
        }

        let transform = self.effective_transform(key)?;
        let (tint, alpha) = self.effective_color(key)?;
        Some(DrawCommand::from_object(obj, transform, tint, alpha))
    }

    /// Draw commands for the automatic sweep of one stage
    pub fn stage_commands(&self, stage: RenderStage) -> Vec<DrawCommand> {
        self.objects
            .iter()
            .filter(|obj| obj.auto_rendered && obj.render_stage == stage)
            .filter_map(|obj| self.draw_command(obj.key))
            .collect()
    }
}
