//! Recording device doubles for tests
//!
//! Both doubles are cheap clones over shared state: hand one clone to the
//! backend and keep another to inspect the call log or flip failure switches.

use crate::backend::DeviceHandle;
use crate::d3d9::{BackBufferDesc, D3d9Device, TransformState};
use crate::geometry::QuadVertex;
use crate::ogl::{GlApi, PixelFormat};
use crate::shader::ShaderStage;
use parking_lot::Mutex;
use sprite3d_scene::Filtering;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader(ShaderStage, u32),
    ShaderSource(u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader(u32, u32),
    DetachShader(u32, u32),
    BindAttribLocation(u32, u32, String),
    LinkProgram(u32),
    DeleteProgram(u32),
    UseProgram(u32),
    UniformMatrix4(i32, [f32; 16]),
    Uniform4(i32, [f32; 4]),
    Uniform1i(i32, i32),
    GenTexture(u32),
    BindTexture(u32),
    TextureFiltering(Filtering),
    TexImage {
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
    },
    TexSubImage {
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
    },
    DeleteTexture(u32),
    EnableBlending,
    DrawQuad([QuadVertex; 4]),
}

#[derive(Debug)]
struct GlState {
    calls: Vec<GlCall>,
    next_name: u32,
    next_texture: u32,
    bgra: bool,
    viewport: (i32, i32),
    compile_failure: Option<(ShaderStage, String)>,
    link_failure: Option<String>,
    shader_stages: Vec<(u32, ShaderStage)>,
    texture_alloc_fails: bool,
}

/// In-memory GL that records every call
#[derive(Debug, Clone)]
pub struct RecordingGl {
    state: Arc<Mutex<GlState>>,
}

impl Default for RecordingGl {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingGl {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GlState {
                calls: Vec::new(),
                next_name: 1,
                next_texture: 1,
                bgra: true,
                viewport: (640, 480),
                compile_failure: None,
                link_failure: None,
                shader_stages: Vec::new(),
                texture_alloc_fails: false,
            })),
        }
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn set_bgra(&self, supported: bool) {
        self.state.lock().bgra = supported;
    }

    pub fn set_viewport(&self, width: i32, height: i32) {
        self.state.lock().viewport = (width, height);
    }

    /// Make every compile of `stage` fail with `log`
    pub fn fail_compile(&self, stage: ShaderStage, log: &str) {
        self.state.lock().compile_failure = Some((stage, log.to_string()));
    }

    pub fn fail_link(&self, log: &str) {
        self.state.lock().link_failure = Some(log.to_string());
    }

    pub fn fail_texture_alloc(&self, fail: bool) {
        self.state.lock().texture_alloc_fails = fail;
    }

    fn record(&self, call: GlCall) {
        self.state.lock().calls.push(call);
    }

    fn next_name(&self) -> u32 {
        let mut state = self.state.lock();
        let name = state.next_name;
        state.next_name += 1;
        name
    }

    fn failing_stage(&self, shader: u32) -> Option<String> {
        let state = self.state.lock();
        let (stage, log) = state.compile_failure.as_ref()?;
        state
            .shader_stages
            .iter()
            .any(|(id, s)| *id == shader && s == stage)
            .then(|| log.clone())
    }
}

impl GlApi for RecordingGl {
    fn supports_bgra(&self) -> bool {
        self.state.lock().bgra
    }

    fn viewport_size(&self) -> (i32, i32) {
        self.state.lock().viewport
    }

    fn create_shader(&mut self, stage: ShaderStage) -> u32 {
        let name = self.next_name();
        self.state.lock().shader_stages.push((name, stage));
        self.record(GlCall::CreateShader(stage, name));
        name
    }

    fn shader_source(&mut self, shader: u32, _source: &str) {
        self.record(GlCall::ShaderSource(shader));
    }

    fn compile_shader(&mut self, shader: u32) {
        self.record(GlCall::CompileShader(shader));
    }

    fn shader_compiled(&mut self, shader: u32) -> bool {
        self.failing_stage(shader).is_none()
    }

    fn shader_info_log(&mut self, shader: u32) -> String {
        self.failing_stage(shader).unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: u32) {
        self.record(GlCall::DeleteShader(shader));
    }

    fn create_program(&mut self) -> u32 {
        let name = self.next_name();
        self.record(GlCall::CreateProgram(name));
        name
    }

    fn attach_shader(&mut self, program: u32, shader: u32) {
        self.record(GlCall::AttachShader(program, shader));
    }

    fn detach_shader(&mut self, program: u32, shader: u32) {
        self.record(GlCall::DetachShader(program, shader));
    }

    fn bind_attrib_location(&mut self, program: u32, index: u32, name: &str) {
        self.record(GlCall::BindAttribLocation(program, index, name.to_string()));
    }

    fn link_program(&mut self, program: u32) {
        self.record(GlCall::LinkProgram(program));
    }

    fn program_linked(&mut self, _program: u32) -> bool {
        self.state.lock().link_failure.is_none()
    }

    fn program_info_log(&mut self, _program: u32) -> String {
        self.state.lock().link_failure.clone().unwrap_or_default()
    }

    fn delete_program(&mut self, program: u32) {
        self.record(GlCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: u32) {
        self.record(GlCall::UseProgram(program));
    }

    fn uniform_location(&mut self, _program: u32, name: &str) -> i32 {
        match name {
            "u_Transform" => 0,
            "u_Texture" => 1,
            "u_Tint" => 2,
            _ => -1,
        }
    }

    fn uniform_matrix4(&mut self, location: i32, matrix: &[f32; 16]) {
        self.record(GlCall::UniformMatrix4(location, *matrix));
    }

    fn uniform4(&mut self, location: i32, value: [f32; 4]) {
        self.record(GlCall::Uniform4(location, value));
    }

    fn uniform1i(&mut self, location: i32, value: i32) {
        self.record(GlCall::Uniform1i(location, value));
    }

    fn gen_texture(&mut self) -> u32 {
        let name = {
            let mut state = self.state.lock();
            if state.texture_alloc_fails {
                0
            } else {
                let name = state.next_texture;
                state.next_texture += 1;
                name
            }
        };
        self.record(GlCall::GenTexture(name));
        name
    }

    fn bind_texture(&mut self, texture: u32) {
        self.record(GlCall::BindTexture(texture));
    }

    fn set_texture_filtering(&mut self, filtering: Filtering) {
        self.record(GlCall::TextureFiltering(filtering));
    }

    fn tex_image(&mut self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]) {
        self.record(GlCall::TexImage {
            width,
            height,
            format,
            pixels: pixels.to_vec(),
        });
    }

    fn tex_sub_image(&mut self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]) {
        self.record(GlCall::TexSubImage {
            width,
            height,
            format,
            pixels: pixels.to_vec(),
        });
    }

    fn delete_texture(&mut self, texture: u32) {
        self.record(GlCall::DeleteTexture(texture));
    }

    fn enable_blending(&mut self) {
        self.record(GlCall::EnableBlending);
    }

    fn draw_quad(&mut self, vertices: &[QuadVertex; 4]) {
        self.record(GlCall::DrawQuad(*vertices));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum D3dCall {
    Attach(DeviceHandle),
    CreateTexture { width: u32, height: u32 },
    WriteTexture {
        texture: u64,
        pitch: usize,
        bytes: Vec<u8>,
    },
    ReleaseTexture(u64),
    SetTransform(TransformState, [f32; 16]),
    SetTexture(u64, Filtering),
    SetTextureFactor(u32),
    DrawQuad([QuadVertex; 4]),
}

#[derive(Debug)]
struct D3dState {
    calls: Vec<D3dCall>,
    next_texture: u64,
    back_buffer: Option<BackBufferDesc>,
    texture_alloc_fails: bool,
    writes_fail: bool,
}

/// In-memory D3D9 device that records every call
#[derive(Debug, Clone)]
pub struct RecordingD3d9 {
    state: Arc<Mutex<D3dState>>,
}

impl Default for RecordingD3d9 {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingD3d9 {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(D3dState {
                calls: Vec::new(),
                next_texture: 1,
                back_buffer: Some(BackBufferDesc {
                    width: 640,
                    height: 480,
                    bpp: 32,
                }),
                texture_alloc_fails: false,
                writes_fail: false,
            })),
        }
    }

    pub fn calls(&self) -> Vec<D3dCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn set_back_buffer(&self, desc: Option<BackBufferDesc>) {
        self.state.lock().back_buffer = desc;
    }

    pub fn fail_texture_alloc(&self, fail: bool) {
        self.state.lock().texture_alloc_fails = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().writes_fail = fail;
    }

    fn record(&self, call: D3dCall) {
        self.state.lock().calls.push(call);
    }
}

impl D3d9Device for RecordingD3d9 {
    fn attach(&mut self, device: DeviceHandle) {
        self.record(D3dCall::Attach(device));
    }

    fn back_buffer(&mut self) -> Option<BackBufferDesc> {
        self.state.lock().back_buffer
    }

    fn create_texture(&mut self, width: u32, height: u32) -> Option<u64> {
        self.record(D3dCall::CreateTexture { width, height });
        let mut state = self.state.lock();
        if state.texture_alloc_fails {
            return None;
        }
        let id = state.next_texture;
        state.next_texture += 1;
        Some(id)
    }

    fn write_texture(&mut self, texture: u64, bgra: &[u8], pitch: usize) -> bool {
        self.record(D3dCall::WriteTexture {
            texture,
            pitch,
            bytes: bgra.to_vec(),
        });
        !self.state.lock().writes_fail
    }

    fn release_texture(&mut self, texture: u64) {
        self.record(D3dCall::ReleaseTexture(texture));
    }

    fn set_transform(&mut self, state: TransformState, matrix: &[f32; 16]) {
        self.record(D3dCall::SetTransform(state, *matrix));
    }

    fn set_texture(&mut self, texture: u64, filtering: Filtering) {
        self.record(D3dCall::SetTexture(texture, filtering));
    }

    fn set_texture_factor(&mut self, argb: u32) {
        self.record(D3dCall::SetTextureFactor(argb));
    }

    fn draw_quad(&mut self, vertices: &[QuadVertex; 4]) {
        self.record(D3dCall::DrawQuad(*vertices));
    }
}
