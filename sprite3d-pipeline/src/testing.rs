//! Scripted engine double

use crate::host::{Host, StageMatrices};
use crate::source::Bitmap;
use sprite3d_scene::ObjectKey;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug)]
pub struct ScriptedHost {
    pub version: i32,
    pub screen: (i32, i32, i32),
    pub matrices: Option<StageMatrices>,
    /// Added by `room_to_viewport`
    pub camera_offset: (i32, i32),
    pub sprites: HashMap<i32, Bitmap>,
    pub backgrounds: HashMap<i32, Bitmap>,
    pub game_dir: PathBuf,
    pub paused: bool,

    pub managed: Vec<ObjectKey>,
    pub saves: HashMap<i32, Vec<u8>>,
    pub aborts: Vec<String>,
    read_pos: HashMap<i32, usize>,
}

impl ScriptedHost {
    pub fn new(version: i32) -> Self {
        Self {
            version,
            screen: (640, 480, 32),
            matrices: None,
            camera_offset: (0, 0),
            sprites: HashMap::new(),
            backgrounds: HashMap::new(),
            game_dir: std::env::temp_dir(),
            paused: false,
            managed: Vec::new(),
            saves: HashMap::new(),
            aborts: Vec::new(),
            read_pos: HashMap::new(),
        }
    }

    /// Register a solid sprite
    pub fn with_sprite(mut self, id: i32, width: u32, height: u32) -> Self {
        let pixels = vec![0x80; (width * height * 4) as usize];
        self.sprites.insert(id, Bitmap::from_bgra(width, height, pixels));
        self
    }

    pub fn with_background(mut self, frame: i32, width: u32, height: u32) -> Self {
        let pixels = vec![0x40; (width * height * 4) as usize];
        self.backgrounds
            .insert(frame, Bitmap::from_bgra(width, height, pixels));
        self
    }
}

impl Host for ScriptedHost {
    fn interface_version(&self) -> i32 {
        self.version
    }

    fn screen_dimensions(&self) -> (i32, i32, i32) {
        self.screen
    }

    fn render_stage_matrices(&self) -> Option<StageMatrices> {
        self.matrices
    }

    fn room_to_viewport(&self, x: i32, y: i32) -> (i32, i32) {
        (x + self.camera_offset.0, y + self.camera_offset.1)
    }

    fn sprite_bitmap(&self, sprite: i32) -> Option<Bitmap> {
        self.sprites.get(&sprite).cloned()
    }

    fn background_bitmap(&self, frame: i32) -> Option<Bitmap> {
        self.backgrounds.get(&frame).cloned()
    }

    fn resolve_game_path(&self, file: &str) -> PathBuf {
        self.game_dir.join(file)
    }

    fn register_managed_object(&mut self, key: ObjectKey) {
        self.managed.push(key);
    }

    fn write_save(&mut self, handle: i32, bytes: &[u8]) {
        self.saves.entry(handle).or_default().extend_from_slice(bytes);
    }

    fn read_save(&mut self, handle: i32, buf: &mut [u8]) -> usize {
        let data = self.saves.get(&handle).map(Vec::as_slice).unwrap_or(&[]);
        let pos = self.read_pos.entry(handle).or_insert(0);
        let available = data.len().saturating_sub(*pos).min(buf.len());
        buf[..available].copy_from_slice(&data[*pos..*pos + available]);
        *pos += available;
        available
    }

    fn abort_game(&mut self, message: &str) {
        self.aborts.push(message.to_string());
    }

    fn is_game_paused(&self) -> bool {
        self.paused
    }
}
