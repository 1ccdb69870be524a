//! Texture upload contract and bookkeeping
//!
//! Input pixels are rows of BGRA bytes, top row first. Backends pack the rows
//! into one tight buffer, convert channel order if the device cannot take
//! BGRA, and keep a table from the handles they issued to native objects.

use crate::error::BackendError;
use sprite3d_scene::{Filtering, TextureHandle};
use std::collections::HashMap;

pub const BYTES_PER_PIXEL: usize = 4;

/// Pack `height` rows of `width` BGRA pixels into one tight buffer
///
/// Rows may carry padding past `width * 4`; it is dropped.
pub fn pack_rows(rows: &[&[u8]], width: u32, height: u32) -> Result<Vec<u8>, BackendError> {
    if width == 0 || height == 0 {
        return Err(BackendError::InvalidPixels(format!(
            "empty texture {}x{}",
            width, height
        )));
    }
    if rows.len() < height as usize {
        return Err(BackendError::InvalidPixels(format!(
            "{} rows for height {}",
            rows.len(),
            height
        )));
    }

    let too_large = || BackendError::InvalidPixels(format!("texture {}x{} is too large", width, height));
    let pitch = (width as usize).checked_mul(BYTES_PER_PIXEL).ok_or_else(too_large)?;
    let rows = &rows[..height as usize];

    // Every row must hold a full pitch before anything is allocated.
    for (y, row) in rows.iter().enumerate() {
        if row.len() < pitch {
            return Err(BackendError::InvalidPixels(format!(
                "row {} has {} bytes, need {}",
                y,
                row.len(),
                pitch
            )));
        }
    }

    let size = pitch.checked_mul(rows.len()).ok_or_else(too_large)?;
    let mut packed = Vec::with_capacity(size);
    for row in rows {
        packed.extend_from_slice(&row[..pitch]);
    }

    Ok(packed)
}

/// Swap blue and red in place (BGRA <-> RGBA)
pub fn swap_red_blue(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
        px.swap(0, 2);
    }
}

/// A texture as the backend tracks it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureEntry<N> {
    /// Device object (D3D texture pointer, GL texture name)
    pub native: N,
    pub width: u32,
    pub height: u32,
    pub filtering: Filtering,
}

/// Handles issued by one backend and the native objects behind them
#[derive(Debug)]
pub struct TextureTable<N> {
    entries: HashMap<TextureHandle, TextureEntry<N>>,
    next_id: u64,
}

impl<N: Copy> Default for TextureTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Copy> TextureTable<N> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn insert(&mut self, entry: TextureEntry<N>) -> TextureHandle {
        let handle = TextureHandle(self.next_id);
        self.next_id += 1;
        self.entries.insert(handle, entry);
        handle
    }

    pub fn get(&self, handle: TextureHandle) -> Result<TextureEntry<N>, BackendError> {
        self.entries
            .get(&handle)
            .copied()
            .ok_or(BackendError::UnknownTexture(handle))
    }

    /// Look up a texture and check the incoming data matches its size
    pub fn get_sized(
        &self,
        handle: TextureHandle,
        width: u32,
        height: u32,
    ) -> Result<TextureEntry<N>, BackendError> {
        let entry = self.get(handle)?;
        if (entry.width, entry.height) != (width, height) {
            return Err(BackendError::SizeMismatch {
                texture: handle,
                expected: (entry.width, entry.height),
                actual: (width, height),
            });
        }
        Ok(entry)
    }

    pub fn remove(&mut self, handle: TextureHandle) -> Option<TextureEntry<N>> {
        self.entries.remove(&handle)
    }

    /// Remove every entry, returning the native objects to free
    pub fn drain(&mut self) -> Vec<N> {
        self.entries.drain().map(|(_, entry)| entry.native).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
