//! Script-facing functions
//!
//! The engine calls these with the object handle it got from a factory,
//! which is the object's key (see [`object_address`]). Calls on unknown
//! handles or before startup return neutral values.
//!
//! Script floats arrive as plain `f32`; the C++ shim converts from the
//! engine's float calling convention.

use crate::host::{object_address, object_key};
use crate::with_plugin;
use libc::{c_char, c_int, c_void};
use sprite3d_pipeline::PipelineError;
use sprite3d_scene::{Filtering, ObjectKey, RelativeTo, RenderStage, SceneObject};
use std::ffi::CStr;
use std::ptr;

/// Managed type name given to the engine for sprite objects
pub const SPRITE_TYPE_NAME: &CStr = c"D3D_Sprite";

fn read<R: Default>(object: *const c_void, f: impl FnOnce(&SceneObject) -> R) -> R {
    let key = object_key(object);
    with_plugin(|plugin| match plugin.object(key) {
        Some(obj) => f(obj),
        None => {
            log::warn!("script read on unknown object {}", key);
            R::default()
        }
    })
    .unwrap_or_default()
}

fn write(object: *const c_void, f: impl FnOnce(&mut SceneObject)) {
    let key = object_key(object);
    with_plugin(|plugin| match plugin.object_mut(key) {
        Some(obj) => f(obj),
        None => log::warn!("script write on unknown object {}", key),
    });
}

fn opened(what: &str, result: Option<Result<ObjectKey, PipelineError>>) -> *const c_void {
    match result {
        Some(Ok(key)) => object_address(key),
        Some(Err(err)) => {
            log::error!("{} failed: {}", what, err);
            ptr::null()
        }
        None => ptr::null(),
    }
}

// *** D3D ***

#[no_mangle]
pub extern "C" fn sprite3d_set_loops_per_second(loops: c_int) {
    with_plugin(|plugin| {
        if !plugin.set_game_speed(loops) {
            log::warn!("ignoring loops per second {}", loops);
        }
    });
}

#[no_mangle]
pub extern "C" fn sprite3d_open_sprite(sprite: c_int) -> *const c_void {
    opened("OpenSprite", with_plugin(|plugin| plugin.open_sprite(sprite)))
}

/// # Safety
/// `file` must be null or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn sprite3d_open_sprite_file(file: *const c_char, filtering: c_int) -> *const c_void {
    if file.is_null() {
        return ptr::null();
    }
    let file = CStr::from_ptr(file).to_string_lossy();
    let filtering = Filtering::from_raw(filtering).unwrap_or_else(|| {
        log::warn!("unknown filtering {}, using nearest", filtering);
        Filtering::Nearest
    });
    opened(
        "OpenSpriteFile",
        with_plugin(|plugin| plugin.open_sprite_file(&file, filtering)),
    )
}

#[no_mangle]
pub extern "C" fn sprite3d_open_background(frame: c_int) -> *const c_void {
    opened("OpenBackground", with_plugin(|plugin| plugin.open_background(frame)))
}

/// # Safety
/// `file` must be null or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn sprite3d_open_video(file: *const c_char) -> *const c_void {
    let file = if file.is_null() {
        Default::default()
    } else {
        CStr::from_ptr(file).to_string_lossy()
    };
    with_plugin(|plugin| plugin.open_video(&file))
        .flatten()
        .map_or(ptr::null(), object_address)
}

// *** Object attributes ***

#[no_mangle]
pub extern "C" fn sprite3d_set_enabled(object: *const c_void, enabled: c_int) {
    write(object, |obj| obj.enabled = enabled != 0);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_enabled(object: *const c_void) -> c_int {
    read(object, |obj| obj.enabled as c_int)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_visible(object: *const c_void, visible: c_int) {
    write(object, |obj| obj.visible = visible != 0);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_visible(object: *const c_void) -> c_int {
    read(object, |obj| obj.visible as c_int)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_x(object: *const c_void, x: c_int) {
    write(object, |obj| obj.position.x = x);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_x(object: *const c_void) -> c_int {
    read(object, |obj| obj.position.x)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_y(object: *const c_void, y: c_int) {
    write(object, |obj| obj.position.y = y);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_y(object: *const c_void) -> c_int {
    read(object, |obj| obj.position.y)
}

#[no_mangle]
pub extern "C" fn sprite3d_get_width(object: *const c_void) -> c_int {
    read(object, |obj| obj.width as c_int)
}

#[no_mangle]
pub extern "C" fn sprite3d_get_height(object: *const c_void) -> c_int {
    read(object, |obj| obj.height as c_int)
}

/// Setter registered for the read-only size attributes
#[no_mangle]
pub extern "C" fn sprite3d_set_size_ignored(_object: *const c_void, _value: c_int) {}

#[no_mangle]
pub extern "C" fn sprite3d_set_anchor_x(object: *const c_void, x: f32) {
    write(object, |obj| obj.anchor.x = x);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_anchor_x(object: *const c_void) -> f32 {
    read(object, |obj| obj.anchor.x)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_anchor_y(object: *const c_void, y: f32) {
    write(object, |obj| obj.anchor.y = y);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_anchor_y(object: *const c_void) -> f32 {
    read(object, |obj| obj.anchor.y)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_rotation(object: *const c_void, radians: f32) {
    write(object, |obj| obj.rotation = radians);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_rotation(object: *const c_void) -> f32 {
    read(object, |obj| obj.rotation)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_scaling(object: *const c_void, scaling: f32) {
    write(object, |obj| obj.scaling = scaling);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_scaling(object: *const c_void) -> f32 {
    read(object, |obj| obj.scaling)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_tint_r(object: *const c_void, r: f32) {
    write(object, |obj| obj.tint.x = r);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_tint_r(object: *const c_void) -> f32 {
    read(object, |obj| obj.tint.x)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_tint_g(object: *const c_void, g: f32) {
    write(object, |obj| obj.tint.y = g);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_tint_g(object: *const c_void) -> f32 {
    read(object, |obj| obj.tint.y)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_tint_b(object: *const c_void, b: f32) {
    write(object, |obj| obj.tint.z = b);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_tint_b(object: *const c_void) -> f32 {
    read(object, |obj| obj.tint.z)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_alpha(object: *const c_void, alpha: f32) {
    write(object, |obj| obj.alpha = alpha);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_alpha(object: *const c_void) -> f32 {
    read(object, |obj| obj.alpha)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_auto_updated(object: *const c_void, auto: c_int) {
    write(object, |obj| obj.auto_updated = auto != 0);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_auto_updated(object: *const c_void) -> c_int {
    read(object, |obj| obj.auto_updated as c_int)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_auto_rendered(object: *const c_void, auto: c_int) {
    write(object, |obj| obj.auto_rendered = auto != 0);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_auto_rendered(object: *const c_void) -> c_int {
    read(object, |obj| obj.auto_rendered as c_int)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_render_stage(object: *const c_void, stage: c_int) {
    match RenderStage::from_raw(stage) {
        Some(stage) => write(object, |obj| obj.render_stage = stage),
        None => log::warn!("ignoring render stage {}", stage),
    }
}

#[no_mangle]
pub extern "C" fn sprite3d_get_render_stage(object: *const c_void) -> c_int {
    read(object, |obj| obj.render_stage as c_int)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_relative_to(object: *const c_void, relative: c_int) {
    match RelativeTo::from_raw(relative) {
        Some(relative) => write(object, |obj| obj.relative_to = relative),
        None => log::warn!("ignoring relativeTo {}", relative),
    }
}

#[no_mangle]
pub extern "C" fn sprite3d_get_relative_to(object: *const c_void) -> c_int {
    read(object, |obj| obj.relative_to as c_int)
}

#[no_mangle]
pub extern "C" fn sprite3d_set_room(object: *const c_void, room: c_int) {
    write(object, |obj| obj.room = room);
}

#[no_mangle]
pub extern "C" fn sprite3d_get_room(object: *const c_void) -> c_int {
    read(object, |obj| obj.room)
}

// *** Object methods ***

#[no_mangle]
pub extern "C" fn sprite3d_set_position(object: *const c_void, x: c_int, y: c_int) {
    write(object, |obj| obj.set_position(x, y));
}

#[no_mangle]
pub extern "C" fn sprite3d_set_anchor(object: *const c_void, x: f32, y: f32) {
    write(object, |obj| obj.set_anchor(x, y));
}

#[no_mangle]
pub extern "C" fn sprite3d_set_tint(object: *const c_void, r: f32, g: f32, b: f32) {
    write(object, |obj| obj.set_tint(r, g, b));
}

/// Key 0 or an unknown key clears the parent
#[no_mangle]
pub extern "C" fn sprite3d_set_parent(object: *const c_void, parent: c_int) {
    let key = object_key(object);
    with_plugin(|plugin| {
        if let Err(err) = plugin.set_parent(key, parent as u32) {
            log::warn!("SetParent({}) on object {}: {}", parent, key, err);
        }
    });
}

#[no_mangle]
pub extern "C" fn sprite3d_get_key(object: *const c_void) -> c_int {
    read(object, |obj| obj.key.raw() as c_int)
}

#[no_mangle]
pub extern "C" fn sprite3d_update(object: *const c_void) {
    let key = object_key(object);
    with_plugin(|plugin| plugin.update_object(key));
}

/// Draw once in the object's stage during the current frame
#[no_mangle]
pub extern "C" fn sprite3d_render(object: *const c_void) {
    let key = object_key(object);
    with_plugin(|plugin| {
        if let Err(err) = plugin.queue_render(key) {
            log::warn!("Render: {}", err);
        }
    });
}

// *** Video ***
//
// Video objects are never created, so these only answer the script.

#[no_mangle]
pub extern "C" fn sprite3d_video_set_looping(_object: *const c_void, _looping: c_int) {}

#[no_mangle]
pub extern "C" fn sprite3d_video_get_looping(_object: *const c_void) -> c_int {
    0
}

#[no_mangle]
pub extern "C" fn sprite3d_video_set_fps(_object: *const c_void, _fps: f32) {}

#[no_mangle]
pub extern "C" fn sprite3d_video_get_fps(_object: *const c_void) -> f32 {
    0.0
}

#[no_mangle]
pub extern "C" fn sprite3d_video_next_frame(_object: *const c_void) -> c_int {
    0
}

#[no_mangle]
pub extern "C" fn sprite3d_video_autoplay(_object: *const c_void) {}

#[no_mangle]
pub extern "C" fn sprite3d_video_is_autoplaying(_object: *const c_void) -> c_int {
    0
}

#[no_mangle]
pub extern "C" fn sprite3d_video_stop_autoplay(_object: *const c_void) {}

// *** Managed objects ***

/// Engine garbage collection of a sprite handle; returns 1 once disposed
#[no_mangle]
pub extern "C" fn sprite3d_object_dispose(object: *const c_void, _force: c_int) -> c_int {
    let key = object_key(object);
    with_plugin(|plugin| {
        plugin.destroy_object(key);
    });
    1
}

#[no_mangle]
pub extern "C" fn sprite3d_object_type_name() -> *const c_char {
    SPRITE_TYPE_NAME.as_ptr()
}

// *** Registration ***

pub type ScriptFunction = (&'static CStr, *const c_void);

macro_rules! script_names {
    ($class:literal: $($name:literal => $func:expr,)*) => {
        [$((concat!($class, "::", $name, "\0"), $func as *const c_void),)*]
    };
}

macro_rules! object_functions {
    ($class:literal) => {
        script_names! { $class:
            "set_isEnabled" => sprite3d_set_enabled,
            "get_isEnabled" => sprite3d_get_enabled,
            "set_isVisible" => sprite3d_set_visible,
            "get_isVisible" => sprite3d_get_visible,
            "set_x" => sprite3d_set_x,
            "get_x" => sprite3d_get_x,
            "set_y" => sprite3d_set_y,
            "get_y" => sprite3d_get_y,
            "get_width" => sprite3d_get_width,
            "set_width" => sprite3d_set_size_ignored,
            "get_height" => sprite3d_get_height,
            "set_height" => sprite3d_set_size_ignored,
            "set_anchorX" => sprite3d_set_anchor_x,
            "get_anchorX" => sprite3d_get_anchor_x,
            "set_anchorY" => sprite3d_set_anchor_y,
            "get_anchorY" => sprite3d_get_anchor_y,
            "set_rotation" => sprite3d_set_rotation,
            "get_rotation" => sprite3d_get_rotation,
            "set_scaling" => sprite3d_set_scaling,
            "get_scaling" => sprite3d_get_scaling,
            "set_tintR" => sprite3d_set_tint_r,
            "get_tintR" => sprite3d_get_tint_r,
            "set_tintG" => sprite3d_set_tint_g,
            "get_tintG" => sprite3d_get_tint_g,
            "set_tintB" => sprite3d_set_tint_b,
            "get_tintB" => sprite3d_get_tint_b,
            "set_alpha" => sprite3d_set_alpha,
            "get_alpha" => sprite3d_get_alpha,
            "set_isAutoUpdated" => sprite3d_set_auto_updated,
            "get_isAutoUpdated" => sprite3d_get_auto_updated,
            "set_isAutoRendered" => sprite3d_set_auto_rendered,
            "get_isAutoRendered" => sprite3d_get_auto_rendered,
            "set_renderStage" => sprite3d_set_render_stage,
            "get_renderStage" => sprite3d_get_render_stage,
            "set_relativeTo" => sprite3d_set_relative_to,
            "get_relativeTo" => sprite3d_get_relative_to,
            "set_room" => sprite3d_set_room,
            "get_room" => sprite3d_get_room,
            "SetPosition^2" => sprite3d_set_position,
            "SetAnchor^2" => sprite3d_set_anchor,
            "SetTint^3" => sprite3d_set_tint,
            "SetParent^1" => sprite3d_set_parent,
            "GetKey^0" => sprite3d_get_key,
            "Update^0" => sprite3d_update,
            "Render^0" => sprite3d_render,
        }
    };
}

/// Every script function, by engine name
pub fn script_functions() -> Vec<ScriptFunction> {
    let d3d = script_names! { "D3D":
        "SetLoopsPerSecond" => sprite3d_set_loops_per_second,
        "OpenVideo" => sprite3d_open_video,
        "OpenSprite" => sprite3d_open_sprite,
        "OpenSpriteFile" => sprite3d_open_sprite_file,
        "OpenBackground" => sprite3d_open_background,
    };
    let video = script_names! { "D3D_Video":
        "set_isLooping" => sprite3d_video_set_looping,
        "get_isLooping" => sprite3d_video_get_looping,
        "set_fps" => sprite3d_video_set_fps,
        "get_fps" => sprite3d_video_get_fps,
        "NextFrame^0" => sprite3d_video_next_frame,
        "Autoplay^0" => sprite3d_video_autoplay,
        "IsAutoplaying^0" => sprite3d_video_is_autoplaying,
        "StopAutoplay^0" => sprite3d_video_stop_autoplay,
    };

    d3d.into_iter()
        .chain(object_functions!("D3D_Video"))
        .chain(video)
        .chain(object_functions!("D3D_Sprite"))
        .filter_map(|(name, func)| match CStr::from_bytes_with_nul(name.as_bytes()) {
            Ok(name) => Some((name, func)),
            Err(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{started, FakeEngine};
    use std::collections::HashSet;

    #[test]
    fn test_registration_names() {
        let functions = script_functions();
        let names: HashSet<_> = functions.iter().map(|(name, _)| name.to_str().unwrap()).collect();

        assert_eq!(names.len(), functions.len());
        assert_eq!(functions.len(), 5 + 45 + 8 + 45);
        for name in [
            "D3D::OpenSpriteFile",
            "D3D_Sprite::get_isAutoRendered",
            "D3D_Sprite::SetTint^3",
            "D3D_Video::Render^0",
            "D3D_Video::NextFrame^0",
        ] {
            assert!(names.contains(name), "{}", name);
        }
        assert!(functions.iter().all(|(_, func)| !func.is_null()));
    }

    #[test]
    fn test_attributes_through_handles() {
        let engine = FakeEngine::with_sprite();
        let _plugin = started(&engine, "d3d9");

        let obj = sprite3d_open_sprite(1);
        assert!(!obj.is_null());

        sprite3d_set_position(obj, 10, 20);
        sprite3d_set_x(obj, 11);
        assert_eq!((sprite3d_get_x(obj), sprite3d_get_y(obj)), (11, 20));
        assert_eq!((sprite3d_get_width(obj), sprite3d_get_height(obj)), (1, 2));
        sprite3d_set_size_ignored(obj, 99);
        assert_eq!(sprite3d_get_width(obj), 1);

        sprite3d_set_tint(obj, 0.5, 0.25, 1.0);
        sprite3d_set_tint_g(obj, 0.75);
        assert_eq!(sprite3d_get_tint_g(obj), 0.75);
        sprite3d_set_anchor(obj, 0.5, 1.0);
        assert_eq!(sprite3d_get_anchor_y(obj), 1.0);

        assert_eq!(sprite3d_get_render_stage(obj), RenderStage::Scene as c_int);
        sprite3d_set_render_stage(obj, 2);
        sprite3d_set_render_stage(obj, 7);
        assert_eq!(sprite3d_get_render_stage(obj), 2);

        assert_eq!(sprite3d_get_auto_rendered(obj), 0);
        sprite3d_set_auto_rendered(obj, 1);
        assert_eq!(sprite3d_get_auto_rendered(obj), 1);
        assert_eq!(sprite3d_get_room(obj), -1);
        assert_eq!(sprite3d_get_key(obj), object_key(obj).raw() as c_int);
    }

    #[test]
    fn test_parent_and_dispose() {
        let engine = FakeEngine::with_sprite();
        let _plugin = started(&engine, "d3d9");

        let parent = sprite3d_open_sprite(1);
        let child = sprite3d_open_sprite(1);
        sprite3d_set_parent(child, sprite3d_get_key(parent));
        let parent_key = with_plugin(|p| p.parent_key(object_key(child))).unwrap();
        assert_eq!(parent_key as c_int, sprite3d_get_key(parent));

        assert_eq!(sprite3d_object_dispose(parent, 0), 1);
        assert_eq!(with_plugin(|p| p.parent_key(object_key(child))), Some(0));

        // Unknown handles answer neutrally.
        assert_eq!(sprite3d_get_x(parent), 0);
        sprite3d_set_x(parent, 5);
    }

    #[test]
    fn test_failed_factories_return_null() {
        let engine = FakeEngine::with_sprite();
        let _plugin = started(&engine, "d3d9");

        assert!(sprite3d_open_sprite(42).is_null());
        assert!(sprite3d_open_background(0).is_null());
        assert!(unsafe { sprite3d_open_video(c"intro.ogv".as_ptr()) }.is_null());
        assert!(unsafe { sprite3d_open_sprite_file(c"missing-sprite3d.png".as_ptr(), 1) }.is_null());
        assert!(unsafe { sprite3d_open_sprite_file(ptr::null(), 0) }.is_null());
        assert_eq!(sprite3d_video_get_fps(ptr::null()), 0.0);
        assert_eq!(sprite3d_video_next_frame(ptr::null()), 0);
    }

    #[test]
    fn test_render_queues_into_batch() {
        let engine = FakeEngine::with_sprite();
        let _plugin = started(&engine, "d3d9");

        let obj = sprite3d_open_sprite(1);
        sprite3d_render(obj);
        sprite3d_render(obj);
        assert_eq!(with_plugin(|p| p.batch().len()), Some(2));

        sprite3d_update(obj);
        assert_eq!(with_plugin(|p| p.object(object_key(obj)).map(|o| o.update_ticks)), Some(Some(1)));
    }
}
