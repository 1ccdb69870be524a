//! Sprite3D engine plugin - C ABI
//!
//! The engine talks to the plugin through a small C++ shim that forwards the
//! four plugin entry points here and passes the engine services as a
//! [`Sprite3dEngineApi`] table. All plugin state lives in one process-wide
//! slot; the engine calls in from its main thread only.

use libc::{c_char, c_int, c_void};
use parking_lot::Mutex;
use sprite3d_backend::{BackendDevice, BackendError, BackendKind, D3d9Device, DeviceHandle};
use sprite3d_pipeline::{HostEvent, PipelineConfig, Sprite3d};
use std::ffi::CStr;

mod d3d9_shim;
mod gl;
mod host;
mod logging;
mod script;

pub use d3d9_shim::*;
pub use gl::LoadedGl;
pub use host::*;
pub use logging::*;
pub use script::*;

static PLUGIN: Mutex<Option<Sprite3d<EngineHost>>> = parking_lot::const_mutex(None);

/// Run `f` on the live plugin
///
/// `None` before startup, after shutdown, or when called back while another
/// call is still inside the plugin (an engine abort re-entering shutdown).
pub(crate) fn with_plugin<R>(f: impl FnOnce(&mut Sprite3d<EngineHost>) -> R) -> Option<R> {
    let Some(mut slot) = PLUGIN.try_lock() else {
        log::warn!("plugin re-entered, call ignored");
        return None;
    };
    slot.as_mut().map(f)
}

fn device_for(
    api: &Sprite3dEngineApi,
    kind: BackendKind,
    data: *mut c_void,
) -> Result<BackendDevice, BackendError> {
    match kind {
        BackendKind::D3d9 => {
            let shim = unsafe { api.d3d9.as_ref() }.copied();
            let mut device = shim
                .and_then(|shim| unsafe { ShimDevice::new(shim) })
                .ok_or(BackendError::DeviceUnavailable(kind))?;
            if !data.is_null() {
                device.attach(DeviceHandle(data as usize));
            }
            Ok(BackendDevice::D3d9(Box::new(device)))
        }
        BackendKind::Ogl => {
            let loader = api
                .gl_get_proc_address
                .ok_or(BackendError::DeviceUnavailable(kind))?;
            match unsafe { LoadedGl::load(loader) } {
                Ok(gl) => Ok(BackendDevice::Ogl(Box::new(gl))),
                Err(symbol) => {
                    log::error!("OGL: {} not found", symbol);
                    Err(BackendError::DeviceUnavailable(kind))
                }
            }
        }
    }
}

// ============================================================================
// ENGINE ENTRY POINTS
// ============================================================================

/// Engine startup: check the interface, hook events, register the script API
///
/// Returns 1 when the plugin is running. On 0 the game has been aborted.
///
/// # Safety
/// `api` must point to a table whose functions stay callable until
/// [`sprite3d_engine_shutdown`].
#[no_mangle]
pub unsafe extern "C" fn sprite3d_engine_startup(api: *const Sprite3dEngineApi) -> c_int {
    init_logging(LoggingConfig::from_env());

    if api.is_null() {
        log::error!("startup without an engine table");
        return 0;
    }

    let host = EngineHost::new(*api);
    let Ok(mut plugin) = Sprite3d::startup(host, PipelineConfig::default()) else {
        return 0;
    };

    let host = plugin.host_mut();
    for event in HostEvent::ALL {
        host.request_event_hook(event.code());
    }
    let functions = script_functions();
    for (name, func) in &functions {
        host.register_script_function(name, *func);
    }
    log::info!("registered {} script functions", functions.len());

    let previous = PLUGIN.lock().replace(plugin);
    if let Some(mut previous) = previous {
        log::warn!("startup while running, dropping the previous session");
        previous.shutdown();
    }
    1
}

/// Pick the backend for the engine's renderer
///
/// `data` is the renderer's device pointer (Direct3D) or null.
///
/// # Safety
/// `driver_id` must be null or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn sprite3d_engine_init_gfx(driver_id: *const c_char, data: *mut c_void) -> c_int {
    if driver_id.is_null() {
        log::error!("init gfx without a driver id");
        return 0;
    }
    let driver_id = CStr::from_ptr(driver_id).to_string_lossy();

    let result = with_plugin(|plugin| {
        let api = *plugin.host().api();
        plugin.init_gfx(&driver_id, |kind| device_for(&api, kind, data))
    });
    c_int::from(matches!(result, Some(Ok(()))))
}

/// Engine event callback; always returns 0 so other plugins see the event
#[no_mangle]
pub extern "C" fn sprite3d_engine_on_event(event: c_int, data: isize) -> c_int {
    match HostEvent::from_raw(event) {
        Some(event) => {
            with_plugin(|plugin| plugin.on_event(event, data));
        }
        None => log::trace!("unhandled event {:#x}", event),
    }
    0
}

/// Release every object and GPU resource
#[no_mangle]
pub extern "C" fn sprite3d_engine_shutdown() {
    let taken = match PLUGIN.try_lock() {
        Some(mut slot) => slot.take(),
        None => {
            log::warn!("shutdown re-entered, ignored");
            return;
        }
    };
    if let Some(mut plugin) = taken {
        plugin.shutdown();
    }
}

/// Returns a static string, safe to call.
#[no_mangle]
pub extern "C" fn sprite3d_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::MutexGuard;
    use sprite3d_scene::RenderStage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub use crate::host::tests::{api_for, FakeEngine};

    static SERIAL: Mutex<()> = parking_lot::const_mutex(());
    static NEXT_TEXTURE: AtomicUsize = AtomicUsize::new(0x1000);
    static DRAWS: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn attach(_: *mut c_void, _: *mut c_void) {}
    unsafe extern "C" fn back_buffer(_: *mut c_void, w: *mut c_int, h: *mut c_int, bpp: *mut c_int) -> c_int {
        *w = 320;
        *h = 200;
        *bpp = 32;
        1
    }
    unsafe extern "C" fn create_texture(_: *mut c_void, _: u32, _: u32) -> *mut c_void {
        NEXT_TEXTURE.fetch_add(0x10, Ordering::SeqCst) as *mut c_void
    }
    unsafe extern "C" fn write_texture(_: *mut c_void, _: *mut c_void, _: *const u8, _: usize, _: usize) -> c_int {
        1
    }
    unsafe extern "C" fn release_texture(_: *mut c_void, _: *mut c_void) {}
    unsafe extern "C" fn set_transform(_: *mut c_void, _: c_int, _: *const f32) {}
    unsafe extern "C" fn set_texture(_: *mut c_void, _: *mut c_void, _: c_int) {}
    unsafe extern "C" fn set_texture_factor(_: *mut c_void, _: u32) {}
    unsafe extern "C" fn draw_quad(_: *mut c_void, _: *const sprite3d_backend::QuadVertex) {
        DRAWS.fetch_add(1, Ordering::SeqCst);
    }

    fn shim() -> Sprite3dD3d9Shim {
        Sprite3dD3d9Shim {
            user: std::ptr::null_mut(),
            attach: Some(attach),
            back_buffer: Some(back_buffer),
            create_texture: Some(create_texture),
            write_texture: Some(write_texture),
            release_texture: Some(release_texture),
            set_transform: Some(set_transform),
            set_texture: Some(set_texture),
            set_texture_factor: Some(set_texture_factor),
            draw_quad: Some(draw_quad),
        }
    }

    /// Tests sharing the global plugin slot run one at a time
    pub fn serial() -> MutexGuard<'static, ()> {
        SERIAL.lock()
    }

    /// A started plugin; shut down on drop
    pub struct Started {
        _serial: MutexGuard<'static, ()>,
    }

    impl Drop for Started {
        fn drop(&mut self) {
            sprite3d_engine_shutdown();
        }
    }

    pub fn started(engine: &FakeEngine, driver_id: &str) -> Started {
        let serial = serial();
        let table = shim();
        let mut api = api_for(engine, 25);
        api.d3d9 = &table;

        assert_eq!(unsafe { sprite3d_engine_startup(&api) }, 1);
        let driver_id = std::ffi::CString::new(driver_id).unwrap();
        unsafe { sprite3d_engine_init_gfx(driver_id.as_ptr(), std::ptr::null_mut()) };
        Started { _serial: serial }
    }

    #[test]
    fn test_old_interface_not_started() {
        let _serial = serial();
        let engine = FakeEngine::default();
        let api = api_for(&engine, 20);

        assert_eq!(unsafe { sprite3d_engine_startup(&api) }, 0);
        assert_eq!(engine.aborts.lock().len(), 1);
        assert!(with_plugin(|_| ()).is_none());
        assert_eq!(unsafe { sprite3d_engine_startup(std::ptr::null()) }, 0);
    }

    #[test]
    fn test_unsupported_driver_aborts() {
        let engine = FakeEngine::default();
        let _plugin = started(&engine, "software");

        assert_eq!(
            *engine.aborts.lock(),
            vec!["Unable to initialize plugin: graphics renderer not supported (software).".to_string()]
        );
        assert_eq!(with_plugin(|p| p.backend_kind()), Some(None));
    }

    #[test]
    fn test_missing_gl_loader_aborts() {
        let engine = FakeEngine::default();
        let _plugin = started(&engine, "OGL");

        assert_eq!(engine.aborts.lock().len(), 1);
        assert!(engine.aborts.lock()[0].contains("no Ogl device access"));
    }

    #[test]
    fn test_d3d9_frame_and_save() {
        let engine = FakeEngine::with_sprite();
        let _plugin = started(&engine, "D3D9");
        assert_eq!(with_plugin(|p| p.screen().width), Some(320));
        assert_eq!(*engine.hooks.lock(), vec![0x10, 0x20, 0x10000, 0x8, 0x40, 0x4, 0x800]);

        let obj = sprite3d_open_sprite(1);
        assert_eq!(*engine.managed.lock(), vec![obj as usize]);
        sprite3d_set_auto_rendered(obj, 1);
        sprite3d_set_render_stage(obj, RenderStage::Background as c_int);

        let before = DRAWS.load(Ordering::SeqCst);
        for event in [0x10000, 0x8, 0x40, 0x4, 0x800, 0x8000] {
            assert_eq!(sprite3d_engine_on_event(event, 0), 0);
        }
        assert_eq!(DRAWS.load(Ordering::SeqCst) - before, 1);

        sprite3d_set_loops_per_second(60);
        sprite3d_engine_on_event(HostEvent::SaveGame.code(), 7);
        let saved = engine.saved.lock().clone();
        assert_eq!(saved.len(), 8);
        assert_eq!(saved[4..], 60i32.to_ne_bytes());
    }

    #[test]
    fn test_calls_after_shutdown_are_neutral() {
        let engine = FakeEngine::with_sprite();
        let obj = {
            let _plugin = started(&engine, "d3d9");
            sprite3d_open_sprite(1)
        };
        let _serial = serial();

        assert_eq!(sprite3d_get_x(obj), 0);
        assert!(sprite3d_open_sprite(1).is_null());
        assert_eq!(sprite3d_object_dispose(obj, 1), 1);
        assert_eq!(sprite3d_engine_on_event(HostEvent::PreRender.code(), 0), 0);
        sprite3d_engine_shutdown();
    }

    #[test]
    fn test_version_string() {
        let version = unsafe { CStr::from_ptr(sprite3d_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }
}
