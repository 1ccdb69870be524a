//! The plugin context
//!
//! One `Sprite3d` lives for the whole engine session. It is built at engine
//! startup, gets its backend at graphics initialisation, and is driven by
//! engine events until shutdown. Nothing here is shared across threads; the
//! embedding layer serialises all access.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::events::HostEvent;
use crate::host::Host;
use crate::persist::{SavedScreen, SAVED_SCREEN_SIZE};
use crate::scheduler::{stage_draw_list, RenderBatch};
use crate::source::{load_image_file, Bitmap};
use glam::IVec2;
use sprite3d_backend::{
    create_backend, BackendDevice, BackendError, BackendKind, DeviceHandle, RenderBackend, Screen,
};
use sprite3d_scene::{
    Filtering, ObjectKey, ObjectRegistry, ObjectSource, RenderStage, SceneObject,
};
use std::path::Path;

pub struct Sprite3d<H: Host> {
    config: PipelineConfig,
    host: H,
    screen: Screen,
    backend: Option<Box<dyn RenderBackend>>,
    registry: ObjectRegistry,
    batch: RenderBatch,
}

impl<H: Host> Sprite3d<H> {
    /// Engine startup
    ///
    /// Aborts the game when the engine interface is older than supported.
    pub fn startup(mut host: H, config: PipelineConfig) -> Result<Self, PipelineError> {
        let version = host.interface_version();
        log::info!("engine interface: {}", version);

        if version < config.min_interface_version {
            let err = PipelineError::InterfaceTooOld {
                found: version,
                required: config.min_interface_version,
            };
            log::error!("{}", err);
            host.abort_game(&format!(
                "Engine interface is too old, need version of AGS with interface version {} or higher.",
                config.matrices_interface_version
            ));
            return Err(err);
        }

        let mut screen = Screen::new();
        screen.set_game_speed(config.default_game_speed);

        Ok(Self {
            config,
            host,
            screen,
            backend: None,
            registry: ObjectRegistry::new(),
            batch: RenderBatch::new(),
        })
    }

    /// Select and initialise the backend for `driver_id`
    ///
    /// `device_for` supplies device access once the driver id is known to be
    /// supported. Failure aborts the game and leaves the plugin without a
    /// backend; every later operation then degrades to a no-op or an error.
    pub fn init_gfx<F>(&mut self, driver_id: &str, device_for: F) -> Result<(), PipelineError>
    where
        F: FnOnce(BackendKind) -> Result<BackendDevice, BackendError>,
    {
        if let Some(backend) = &self.backend {
            log::warn!(
                "graphics already initialised with {}, ignoring {}",
                backend.kind().driver_id(),
                driver_id
            );
            return Ok(());
        }

        let created = BackendKind::from_driver_id(driver_id)
            .and_then(device_for)
            .and_then(|device| create_backend(driver_id, device));
        let mut backend = match created {
            Ok(backend) => backend,
            Err(err) => return Err(self.abort_gfx(err)),
        };
        if let Err(err) = backend.init_gfx_mode(&mut self.screen) {
            backend.shutdown();
            return Err(self.abort_gfx(err));
        }

        log::info!(
            "running {} at {}x{}x{}",
            backend.kind().driver_id(),
            self.screen.width,
            self.screen.height,
            self.screen.bpp
        );
        self.backend = Some(backend);
        Ok(())
    }

    fn abort_gfx(&mut self, err: BackendError) -> PipelineError {
        log::error!("graphics initialisation failed: {}", err);
        self.host
            .abort_game(&format!("Unable to initialize plugin: {}.", err));
        err.into()
    }

    /// Dispatch one engine event
    pub fn on_event(&mut self, event: HostEvent, data: isize) {
        if self.host.is_game_paused() {
            log::trace!("{:?} while paused", event);
        }

        match event {
            HostEvent::SaveGame => self.save(data as i32),
            HostEvent::RestoreGame => {
                if let Err(err) = self.restore(data as i32) {
                    log::error!("restore failed: {}", err);
                }
            }
            HostEvent::PreRender => {
                let updated = self.registry.update_all();
                log::trace!("updated {} objects", updated);
            }
            HostEvent::PreScreenDraw => {
                self.capture_viewport();
                if let Some(backend) = self.backend.as_mut() {
                    backend.init_gfx_device(DeviceHandle(data as usize));
                }
                self.render(RenderStage::Background);
            }
            HostEvent::PreGuiDraw => {
                self.render(RenderStage::Scene);
            }
            HostEvent::PostScreenDraw => {
                self.render(RenderStage::Gui);
            }
            HostEvent::FinalScreenDraw => {
                self.render(RenderStage::Screen);
                self.batch.clear();
            }
        }
    }

    /// Room origin in viewport pixels, for hosts without stage matrices
    fn capture_viewport(&mut self) {
        self.screen.viewport = IVec2::ZERO;
        if self.host.interface_version() < self.config.matrices_interface_version {
            let (x, y) = self.host.room_to_viewport(0, 0);
            self.screen.viewport = IVec2::new(x, y);
        }
    }

    /// Draw one stage, returning how many sprites were drawn
    pub fn render(&mut self, stage: RenderStage) -> usize {
        let Some(backend) = self.backend.as_mut() else {
            return 0;
        };

        let (width, height, bpp) = self.host.screen_dimensions();
        self.screen.width = width;
        self.screen.height = height;
        self.screen.bpp = bpp;

        let matrices = if self.host.interface_version() >= self.config.matrices_interface_version {
            self.host.render_stage_matrices()
        } else {
            None
        };
        match matrices {
            Some(m) => backend.set_screen_matrixes(
                &mut self.screen,
                Some(&m.world),
                Some(&m.view),
                Some(&m.proj),
            ),
            None => backend.set_screen_matrixes(&mut self.screen, None, None, None),
        }

        let mut drawn = 0;
        for sprite in stage_draw_list(&self.registry, &self.batch, stage) {
            match backend.draw_sprite(&self.screen, &sprite) {
                Ok(()) => drawn += 1,
                Err(err) => log::warn!("{:?} stage: object {}: {}", stage, sprite.key, err),
            }
        }
        drawn
    }

    pub fn open_sprite(&mut self, sprite: i32) -> Result<ObjectKey, PipelineError> {
        let bitmap = self
            .host
            .sprite_bitmap(sprite)
            .ok_or(PipelineError::MissingSprite(sprite))?;
        self.open_bitmap(ObjectSource::Sprite(sprite), &bitmap, Filtering::Nearest)
    }

    /// Open an image shipped in the compiled game folder
    pub fn open_sprite_file(
        &mut self,
        file: &str,
        filtering: Filtering,
    ) -> Result<ObjectKey, PipelineError> {
        let path = self.host.resolve_game_path(file);
        let bitmap = load_image_file(&path)?;
        self.open_bitmap(
            ObjectSource::File(path.to_string_lossy().into_owned()),
            &bitmap,
            filtering,
        )
    }

    pub fn open_background(&mut self, frame: i32) -> Result<ObjectKey, PipelineError> {
        let bitmap = self
            .host
            .background_bitmap(frame)
            .ok_or(PipelineError::MissingBackground(frame))?;
        self.open_bitmap(ObjectSource::Background(frame), &bitmap, Filtering::Nearest)
    }

    /// Video playback is not available; never creates an object
    pub fn open_video(&mut self, file: &str) -> Option<ObjectKey> {
        log::debug!("video playback not supported, ignoring {}", file);
        None
    }

    fn open_bitmap(
        &mut self,
        source: ObjectSource,
        bitmap: &Bitmap,
        filtering: Filtering,
    ) -> Result<ObjectKey, PipelineError> {
        let backend = self.backend.as_mut().ok_or(PipelineError::NoBackend)?;
        let texture =
            backend.create_texture(&bitmap.rows(), bitmap.width, bitmap.height, filtering)?;

        let key = self.registry.insert(SceneObject::new(
            source,
            texture,
            bitmap.width,
            bitmap.height,
        ));
        self.host.register_managed_object(key);
        log::debug!("opened object {} ({}x{})", key, bitmap.width, bitmap.height);
        Ok(key)
    }

    /// Re-read an object's pixels from its source into its texture
    ///
    /// The source must still have the size the object was opened with.
    pub fn refresh_texture(&mut self, key: ObjectKey) -> Result<(), PipelineError> {
        let obj = self
            .registry
            .get(key)
            .ok_or(PipelineError::UnknownObject(key))?;
        let texture = obj.texture;

        let bitmap = match &obj.source {
            ObjectSource::Sprite(id) => self
                .host
                .sprite_bitmap(*id)
                .ok_or(PipelineError::MissingSprite(*id))?,
            ObjectSource::Background(frame) => self
                .host
                .background_bitmap(*frame)
                .ok_or(PipelineError::MissingBackground(*frame))?,
            ObjectSource::File(path) => load_image_file(Path::new(path))?,
        };

        let backend = self.backend.as_mut().ok_or(PipelineError::NoBackend)?;
        backend.update_texture_data(texture, &bitmap.rows(), bitmap.width, bitmap.height)?;
        Ok(())
    }

    /// Engine-driven disposal; releases the object's texture
    pub fn destroy_object(&mut self, key: ObjectKey) -> bool {
        let Some(obj) = self.registry.remove(key) else {
            return false;
        };
        if let Some(backend) = self.backend.as_mut() {
            backend.release_texture(obj.texture);
        }
        log::debug!("disposed object {}", key);
        true
    }

    /// Queue an object for drawing in its stage during this frame
    pub fn queue_render(&mut self, key: ObjectKey) -> Result<(), PipelineError> {
        if !self.registry.contains(key) {
            return Err(PipelineError::UnknownObject(key));
        }
        self.batch.push(key);
        Ok(())
    }

    pub fn update_object(&mut self, key: ObjectKey) -> bool {
        self.registry.update(key)
    }

    /// Parent `child` to the object with key `parent`
    ///
    /// Key 0 or a key with no live object clears the parent.
    pub fn set_parent(&mut self, child: ObjectKey, parent: u32) -> Result<(), PipelineError> {
        let parent = Some(ObjectKey(parent)).filter(|key| key.raw() != 0 && self.registry.contains(*key));
        self.registry.set_parent(child, parent)?;
        Ok(())
    }

    /// Key of the current parent, 0 for none or a disposed parent
    pub fn parent_key(&self, key: ObjectKey) -> u32 {
        self.registry
            .get(key)
            .and_then(SceneObject::parent)
            .filter(|parent| self.registry.contains(*parent))
            .map_or(0, ObjectKey::raw)
    }

    pub fn object(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.registry.get(key)
    }

    pub fn object_mut(&mut self, key: ObjectKey) -> Option<&mut SceneObject> {
        self.registry.get_mut(key)
    }

    pub fn set_game_speed(&mut self, speed: i32) -> bool {
        self.screen.set_game_speed(speed)
    }

    pub fn save(&mut self, handle: i32) {
        let saved = SavedScreen::capture(&self.screen);
        log::debug!("SAVE frameDelay: {}", saved.frame_delay);
        log::debug!("SAVE gameSpeed: {}", saved.game_speed);
        self.host.write_save(handle, &saved.to_bytes());
    }

    pub fn restore(&mut self, handle: i32) -> Result<(), PipelineError> {
        let mut buf = [0u8; SAVED_SCREEN_SIZE];
        let read = self.host.read_save(handle, &mut buf);
        if read < SAVED_SCREEN_SIZE {
            return Err(PipelineError::TruncatedSave {
                read,
                expected: SAVED_SCREEN_SIZE,
            });
        }

        let saved = SavedScreen::from_bytes(&buf)?;
        saved.apply(&mut self.screen);
        log::debug!("RESTORE frameDelay: {}", saved.frame_delay);
        log::debug!("RESTORE gameSpeed: {}", saved.game_speed);
        Ok(())
    }

    /// Release every object and the backend
    pub fn shutdown(&mut self) {
        log::info!("shutting down");
        let objects = self.registry.drain();
        if let Some(mut backend) = self.backend.take() {
            for obj in &objects {
                backend.release_texture(obj.texture);
            }
            backend.shutdown();
        }
        self.batch.clear();
    }

    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(|backend| backend.kind())
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn batch(&self) -> &RenderBatch {
        &self.batch
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StageMatrices;
    use crate::testing::ScriptedHost;
    use glam::Mat4;
    use sprite3d_backend::fake::{D3dCall, RecordingD3d9, RecordingGl};
    use sprite3d_backend::TransformState;
    use sprite3d_scene::build_transform;

    const FRAME: [HostEvent; 5] = [
        HostEvent::PreRender,
        HostEvent::PreScreenDraw,
        HostEvent::PreGuiDraw,
        HostEvent::PostScreenDraw,
        HostEvent::FinalScreenDraw,
    ];

    fn plugin(host: ScriptedHost) -> (Sprite3d<ScriptedHost>, RecordingD3d9) {
        let device = RecordingD3d9::new();
        let mut plugin = Sprite3d::startup(host, PipelineConfig::default()).unwrap();
        plugin
            .init_gfx("d3d9", |_| Ok(BackendDevice::D3d9(Box::new(device.clone()))))
            .unwrap();
        (plugin, device)
    }

    /// Native texture ids drawn during one event
    fn drawn_during(
        plugin: &mut Sprite3d<ScriptedHost>,
        device: &RecordingD3d9,
        event: HostEvent,
    ) -> Vec<u64> {
        device.clear_calls();
        plugin.on_event(event, 0x1000);
        device
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                D3dCall::SetTexture(id, _) => Some(id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_old_interface_aborts() {
        let result = Sprite3d::startup(ScriptedHost::new(22), PipelineConfig::default());
        assert!(matches!(
            result,
            Err(PipelineError::InterfaceTooOld { found: 22, required: 23 })
        ));
    }

    #[test]
    fn test_old_interface_abort_message() {
        let config = PipelineConfig::default();
        let mut host = ScriptedHost::new(config.min_interface_version - 1);

        assert!(Sprite3d::startup(&mut host, config.clone()).is_err());
        assert_eq!(
            host.aborts,
            vec!["Engine interface is too old, need version of AGS with interface version 25 or higher.".to_string()]
        );

        // The minimum version itself starts.
        let mut host = ScriptedHost::new(config.min_interface_version);
        assert!(Sprite3d::startup(&mut host, config).is_ok());
        assert!(host.aborts.is_empty());
    }

    #[test]
    fn test_unsupported_driver_leaves_no_backend() {
        let host = ScriptedHost::new(25).with_sprite(1, 4, 4);
        let mut plugin = Sprite3d::startup(host, PipelineConfig::default()).unwrap();

        let result = plugin.init_gfx("vulkan", |_| Ok(BackendDevice::Ogl(Box::new(RecordingGl::new()))));
        assert!(matches!(
            result,
            Err(PipelineError::Backend(BackendError::UnsupportedDriver(_)))
        ));
        assert_eq!(plugin.backend_kind(), None);
        assert_eq!(
            plugin.host().aborts,
            vec!["Unable to initialize plugin: graphics renderer not supported (vulkan).".to_string()]
        );

        // Everything after must degrade quietly.
        assert!(matches!(plugin.open_sprite(1), Err(PipelineError::NoBackend)));
        for event in FRAME {
            plugin.on_event(event, 0);
        }
        assert_eq!(plugin.render(RenderStage::Scene), 0);
        plugin.shutdown();
    }

    #[test]
    fn test_missing_device_access_aborts() {
        let mut plugin = Sprite3d::startup(ScriptedHost::new(25), PipelineConfig::default()).unwrap();
        let result = plugin.init_gfx("OGL", |kind| Err(BackendError::DeviceUnavailable(kind)));

        assert!(matches!(
            result,
            Err(PipelineError::Backend(BackendError::DeviceUnavailable(BackendKind::Ogl)))
        ));
        assert_eq!(plugin.backend_kind(), None);
        assert_eq!(plugin.host().aborts.len(), 1);
    }

    #[test]
    fn test_shader_failure_aborts() {
        let gl = RecordingGl::new();
        gl.fail_compile(sprite3d_backend::ShaderStage::Vertex, "bad");
        let mut plugin = Sprite3d::startup(ScriptedHost::new(25), PipelineConfig::default()).unwrap();

        assert!(plugin
            .init_gfx("ogl", |_| Ok(BackendDevice::Ogl(Box::new(gl))))
            .is_err());
        assert_eq!(plugin.backend_kind(), None);
        assert_eq!(plugin.host().aborts.len(), 1);
    }

    #[test]
    fn test_init_gfx_fills_screen() {
        let (plugin, _) = plugin(ScriptedHost::new(25));
        assert_eq!(plugin.backend_kind(), Some(BackendKind::D3d9));
        assert_eq!((plugin.screen().width, plugin.screen().height), (640, 480));
        assert_eq!(plugin.screen().game_speed, 40);
    }

    #[test]
    fn test_batch_renders_once_per_stage_then_clears() {
        let host = ScriptedHost::new(25).with_sprite(1, 4, 4).with_sprite(2, 8, 8);
        let (mut plugin, device) = plugin(host);

        let a = plugin.open_sprite(1).unwrap();
        let b = plugin.open_sprite(2).unwrap();
        plugin.object_mut(b).unwrap().render_stage = RenderStage::Gui;

        for _ in 0..2 {
            plugin.queue_render(a).unwrap();
            plugin.queue_render(b).unwrap();

            let draws: Vec<Vec<u64>> = FRAME
                .into_iter()
                .map(|event| drawn_during(&mut plugin, &device, event))
                .collect();

            // PreRender, Background, Scene, Gui, Screen
            assert_eq!(draws, vec![vec![], vec![], vec![1], vec![2], vec![]]);
            assert!(plugin.batch().is_empty());
        }
    }

    #[test]
    fn test_engine_codes_drive_a_frame() {
        let host = ScriptedHost::new(25).with_sprite(1, 4, 4).with_sprite(2, 4, 4);
        let (mut plugin, device) = plugin(host);

        let auto = plugin.open_sprite(1).unwrap();
        {
            let obj = plugin.object_mut(auto).unwrap();
            obj.auto_updated = true;
            obj.auto_rendered = true;
            obj.render_stage = RenderStage::Background;
        }
        let queued = plugin.open_sprite(2).unwrap();
        plugin.queue_render(queued).unwrap();

        let mut ticks_before_background = None;
        let mut draws = Vec::new();
        for code in [0x10000, 0x8, 0x40, 0x4, 0x800] {
            let event = HostEvent::from_raw(code).unwrap();
            if event == HostEvent::PreScreenDraw {
                ticks_before_background = Some(plugin.object(auto).unwrap().update_ticks);
            }
            draws.push(drawn_during(&mut plugin, &device, event));
        }

        assert_eq!(ticks_before_background, Some(1));
        assert_eq!(draws, vec![vec![], vec![1], vec![2], vec![], vec![]]);
        assert!(plugin.batch().is_empty());
        assert_eq!(plugin.object(auto).unwrap().update_ticks, 1);
    }

    #[test]
    fn test_auto_render_and_update() {
        let host = ScriptedHost::new(25).with_sprite(1, 4, 4).with_sprite(2, 4, 4);
        let (mut plugin, device) = plugin(host);

        let auto = plugin.open_sprite(1).unwrap();
        let idle = plugin.open_sprite(2).unwrap();
        {
            let obj = plugin.object_mut(auto).unwrap();
            obj.auto_rendered = true;
            obj.auto_updated = true;
            obj.render_stage = RenderStage::Background;
        }

        assert!(drawn_during(&mut plugin, &device, HostEvent::PreRender).is_empty());
        assert_eq!(plugin.object(auto).unwrap().update_ticks, 1);
        assert_eq!(plugin.object(idle).unwrap().update_ticks, 0);

        assert_eq!(drawn_during(&mut plugin, &device, HostEvent::PreScreenDraw), vec![1]);
        assert!(drawn_during(&mut plugin, &device, HostEvent::PreGuiDraw).is_empty());
    }

    #[test]
    fn test_pre_screen_draw_refreshes_device() {
        let (mut plugin, device) = plugin(ScriptedHost::new(25));
        plugin.on_event(HostEvent::PreScreenDraw, 0xBEEF);
        assert!(device.calls().contains(&D3dCall::Attach(DeviceHandle(0xBEEF))));
    }

    #[test]
    fn test_old_hosts_use_room_to_viewport() {
        let mut host = ScriptedHost::new(24);
        host.camera_offset = (-30, -12);
        host.matrices = Some(StageMatrices {
            world: build_transform(99.0, 99.0, 1.0, 1.0),
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        });
        let (mut plugin, _) = plugin(host);

        plugin.on_event(HostEvent::PreScreenDraw, 0);
        assert_eq!(plugin.screen().viewport, IVec2::new(-30, -12));
        // Interface 24 has no stage matrices even if the host offers them.
        assert!(!plugin.screen().host_matrices);
    }

    #[test]
    fn test_new_hosts_pass_stage_matrices() {
        let mut host = ScriptedHost::new(25);
        host.camera_offset = (-30, -12);
        let proj = build_transform(0.0, 0.0, 0.5, 0.5);
        host.matrices = Some(StageMatrices {
            world: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            proj,
        });
        let (mut plugin, device) = plugin(host);

        plugin.on_event(HostEvent::PreScreenDraw, 0);
        assert_eq!(plugin.screen().viewport, IVec2::ZERO);
        assert!(plugin.screen().host_matrices);
        assert!(device
            .calls()
            .contains(&D3dCall::SetTransform(TransformState::Projection, proj.to_cols_array())));
    }

    #[test]
    fn test_save_restore_round_trip() {
        let (mut plugin, _) = plugin(ScriptedHost::new(25));
        assert!(plugin.set_game_speed(40));
        for event in FRAME {
            plugin.on_event(event, 0);
        }
        plugin.on_event(HostEvent::SaveGame, 3);
        let saved = plugin.host().saves[&3].clone();
        assert_eq!(saved.len(), SAVED_SCREEN_SIZE);

        let mut host = ScriptedHost::new(25);
        host.saves.insert(3, saved);
        let mut fresh = Sprite3d::startup(host, PipelineConfig::default()).unwrap();
        fresh.set_game_speed(10);
        fresh.on_event(HostEvent::RestoreGame, 3);

        assert_eq!(fresh.screen().game_speed, 40);
        assert_eq!(
            fresh.screen().frame_delay.to_bits(),
            plugin.screen().frame_delay.to_bits()
        );
        assert_eq!(fresh.screen().frame_delay, 1.0 / 40.0);
    }

    #[test]
    fn test_truncated_restore_keeps_state() {
        let mut host = ScriptedHost::new(25);
        host.saves.insert(1, vec![0, 0, 0]);
        let mut plugin = Sprite3d::startup(host, PipelineConfig::default()).unwrap();

        assert!(matches!(
            plugin.restore(1),
            Err(PipelineError::TruncatedSave { read: 3, expected: 8 })
        ));
        assert_eq!(plugin.screen().game_speed, 40);
    }

    #[test]
    fn test_non_positive_speed_ignored() {
        let (mut plugin, _) = plugin(ScriptedHost::new(25));
        assert!(!plugin.set_game_speed(-5));
        assert_eq!(plugin.screen().game_speed, 40);
    }

    #[test]
    fn test_open_registers_managed_object() {
        let host = ScriptedHost::new(25).with_sprite(5, 2, 2).with_background(0, 16, 8);
        let (mut plugin, _) = plugin(host);

        let sprite = plugin.open_sprite(5).unwrap();
        let bg = plugin.open_background(0).unwrap();
        assert_eq!(plugin.host().managed, vec![sprite, bg]);

        let obj = plugin.object(bg).unwrap();
        assert_eq!((obj.width, obj.height), (16, 8));
        assert_eq!(obj.render_stage, RenderStage::Scene);
        assert_eq!(obj.scaling, 1.0);

        assert!(matches!(plugin.open_sprite(6), Err(PipelineError::MissingSprite(6))));
        assert!(matches!(plugin.open_background(3), Err(PipelineError::MissingBackground(3))));
        assert_eq!(plugin.open_video("intro.ogv"), None);
    }

    #[test]
    fn test_texture_failure_creates_nothing() {
        let host = ScriptedHost::new(25).with_sprite(1, 2, 2);
        let (mut plugin, device) = plugin(host);
        device.fail_texture_alloc(true);

        assert!(matches!(
            plugin.open_sprite(1),
            Err(PipelineError::Backend(BackendError::TextureAllocation { .. }))
        ));
        assert!(plugin.registry().is_empty());
        assert!(plugin.host().managed.is_empty());
    }

    #[test]
    fn test_open_sprite_file_with_filtering() {
        let name = format!("sprite3d-plugin-{}.png", std::process::id());
        let host = ScriptedHost::new(25);
        let path = host.game_dir.join(&name);
        image::RgbaImage::from_raw(2, 1, vec![255; 8])
            .unwrap()
            .save(&path)
            .unwrap();

        let (mut plugin, device) = plugin(host);
        let key = plugin.open_sprite_file(&name, Filtering::Linear);
        std::fs::remove_file(&path).ok();
        let key = key.unwrap();

        plugin.queue_render(key).unwrap();
        assert_eq!(plugin.object(key).unwrap().width, 2);
        device.clear_calls();
        plugin.on_event(HostEvent::PreGuiDraw, 0);
        assert!(device.calls().contains(&D3dCall::SetTexture(1, Filtering::Linear)));
    }

    #[test]
    fn test_destroy_releases_and_skips_queued() {
        let host = ScriptedHost::new(25).with_sprite(1, 2, 2);
        let (mut plugin, device) = plugin(host);
        let key = plugin.open_sprite(1).unwrap();
        plugin.queue_render(key).unwrap();

        assert!(plugin.destroy_object(key));
        assert!(!plugin.destroy_object(key));
        assert!(device.calls().contains(&D3dCall::ReleaseTexture(1)));

        assert!(drawn_during(&mut plugin, &device, HostEvent::PreGuiDraw).is_empty());
        assert!(matches!(plugin.queue_render(key), Err(PipelineError::UnknownObject(_))));
    }

    #[test]
    fn test_parent_by_key() {
        let host = ScriptedHost::new(25).with_sprite(1, 2, 2);
        let (mut plugin, _) = plugin(host);
        let parent = plugin.open_sprite(1).unwrap();
        let child = plugin.open_sprite(1).unwrap();

        plugin.set_parent(child, parent.raw()).unwrap();
        assert_eq!(plugin.parent_key(child), parent.raw());

        // A cycle is refused and leaves the parent as it was.
        assert!(plugin.set_parent(parent, child.raw()).is_err());
        assert_eq!(plugin.parent_key(parent), 0);

        plugin.set_parent(child, 0).unwrap();
        assert_eq!(plugin.parent_key(child), 0);

        plugin.set_parent(child, 999).unwrap();
        assert_eq!(plugin.parent_key(child), 0);

        plugin.set_parent(child, parent.raw()).unwrap();
        plugin.destroy_object(parent);
        assert_eq!(plugin.parent_key(child), 0);
    }

    #[test]
    fn test_refresh_background_texture() {
        let host = ScriptedHost::new(25).with_background(0, 2, 2);
        let (mut plugin, device) = plugin(host);
        let key = plugin.open_background(0).unwrap();
        device.clear_calls();

        plugin.refresh_texture(key).unwrap();
        assert!(device
            .calls()
            .iter()
            .any(|c| matches!(c, D3dCall::WriteTexture { texture: 1, .. })));

        // A differently sized frame cannot be written into the old texture.
        plugin.host_mut().backgrounds.insert(0, Bitmap::from_bgra(4, 4, vec![0; 64]));
        assert!(matches!(
            plugin.refresh_texture(key),
            Err(PipelineError::Backend(BackendError::SizeMismatch { .. }))
        ));
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let host = ScriptedHost::new(25).with_sprite(1, 2, 2);
        let (mut plugin, device) = plugin(host);
        plugin.open_sprite(1).unwrap();
        plugin.open_sprite(1).unwrap();

        plugin.shutdown();
        let released = device
            .calls()
            .into_iter()
            .filter(|c| matches!(c, D3dCall::ReleaseTexture(_)))
            .count();
        assert_eq!(released, 2);
        assert_eq!(plugin.backend_kind(), None);
        assert!(plugin.registry().is_empty());

        // Disposal after shutdown is harmless.
        assert!(!plugin.destroy_object(ObjectKey(1)));
    }
}
