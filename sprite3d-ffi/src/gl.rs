//! OpenGL entry points resolved through the engine's loader
//!
//! The engine owns the context and makes it current before any draw
//! callback; everything here assumes it is.

use crate::host::GetProcAddress;
use libc::{c_char, c_void};
use sprite3d_backend::{GlApi, PixelFormat, QuadVertex, ShaderStage, ATTRIB_POSITION, ATTRIB_TEXCOORD};
use sprite3d_scene::Filtering;
use std::ffi::{CStr, CString};

const GL_FALSE: u8 = 0;
const GL_TRIANGLE_STRIP: u32 = 0x0005;
const GL_SRC_ALPHA: u32 = 0x0302;
const GL_ONE_MINUS_SRC_ALPHA: u32 = 0x0303;
const GL_BLEND: u32 = 0x0BE2;
const GL_VIEWPORT: u32 = 0x0BA2;
const GL_TEXTURE_2D: u32 = 0x0DE1;
const GL_UNSIGNED_BYTE: u32 = 0x1401;
const GL_FLOAT: u32 = 0x1406;
const GL_RGBA: u32 = 0x1908;
const GL_VERSION: u32 = 0x1F02;
const GL_EXTENSIONS: u32 = 0x1F03;
const GL_NEAREST: i32 = 0x2600;
const GL_LINEAR: i32 = 0x2601;
const GL_TEXTURE_MAG_FILTER: u32 = 0x2800;
const GL_TEXTURE_MIN_FILTER: u32 = 0x2801;
const GL_TEXTURE_WRAP_S: u32 = 0x2802;
const GL_TEXTURE_WRAP_T: u32 = 0x2803;
const GL_BGRA: u32 = 0x80E1;
const GL_CLAMP_TO_EDGE: i32 = 0x812F;
const GL_TEXTURE0: u32 = 0x84C0;
const GL_ARRAY_BUFFER: u32 = 0x8892;
const GL_FRAGMENT_SHADER: u32 = 0x8B30;
const GL_VERTEX_SHADER: u32 = 0x8B31;
const GL_COMPILE_STATUS: u32 = 0x8B81;
const GL_LINK_STATUS: u32 = 0x8B82;
const GL_INFO_LOG_LENGTH: u32 = 0x8B84;

macro_rules! gl_functions {
    ($($field:ident = $name:literal : fn($($arg:ty),*) $(-> $ret:ty)?;)*) => {
        struct GlFunctions {
            $($field: unsafe extern "system" fn($($arg),*) $(-> $ret)?,)*
        }

        impl GlFunctions {
            /// Resolve every entry point, naming the first one missing
            unsafe fn load(get_proc_address: GetProcAddress) -> Result<Self, &'static str> {
                Ok(Self {
                    $($field: {
                        let ptr = get_proc_address(concat!($name, "\0").as_ptr().cast());
                        if ptr.is_null() {
                            return Err($name);
                        }
                        std::mem::transmute::<*const c_void, unsafe extern "system" fn($($arg),*) $(-> $ret)?>(ptr)
                    },)*
                })
            }
        }
    };
}

gl_functions! {
    get_string = "glGetString": fn(u32) -> *const u8;
    get_integerv = "glGetIntegerv": fn(u32, *mut i32);
    enable = "glEnable": fn(u32);
    blend_func = "glBlendFunc": fn(u32, u32);

    create_shader = "glCreateShader": fn(u32) -> u32;
    shader_source = "glShaderSource": fn(u32, i32, *const *const c_char, *const i32);
    compile_shader = "glCompileShader": fn(u32);
    get_shaderiv = "glGetShaderiv": fn(u32, u32, *mut i32);
    get_shader_info_log = "glGetShaderInfoLog": fn(u32, i32, *mut i32, *mut c_char);
    delete_shader = "glDeleteShader": fn(u32);

    create_program = "glCreateProgram": fn() -> u32;
    attach_shader = "glAttachShader": fn(u32, u32);
    detach_shader = "glDetachShader": fn(u32, u32);
    bind_attrib_location = "glBindAttribLocation": fn(u32, u32, *const c_char);
    link_program = "glLinkProgram": fn(u32);
    get_programiv = "glGetProgramiv": fn(u32, u32, *mut i32);
    get_program_info_log = "glGetProgramInfoLog": fn(u32, i32, *mut i32, *mut c_char);
    delete_program = "glDeleteProgram": fn(u32);
    use_program = "glUseProgram": fn(u32);

    get_uniform_location = "glGetUniformLocation": fn(u32, *const c_char) -> i32;
    uniform_matrix4fv = "glUniformMatrix4fv": fn(i32, i32, u8, *const f32);
    uniform4f = "glUniform4f": fn(i32, f32, f32, f32, f32);
    uniform1i = "glUniform1i": fn(i32, i32);

    active_texture = "glActiveTexture": fn(u32);
    gen_textures = "glGenTextures": fn(i32, *mut u32);
    bind_texture = "glBindTexture": fn(u32, u32);
    tex_parameteri = "glTexParameteri": fn(u32, u32, i32);
    tex_image_2d = "glTexImage2D": fn(u32, i32, i32, i32, i32, i32, u32, u32, *const c_void);
    tex_sub_image_2d = "glTexSubImage2D": fn(u32, i32, i32, i32, i32, i32, u32, u32, *const c_void);
    delete_textures = "glDeleteTextures": fn(i32, *const u32);

    bind_buffer = "glBindBuffer": fn(u32, u32);
    enable_vertex_attrib_array = "glEnableVertexAttribArray": fn(u32);
    disable_vertex_attrib_array = "glDisableVertexAttribArray": fn(u32);
    vertex_attrib_pointer = "glVertexAttribPointer": fn(u32, i32, u32, u8, i32, *const c_void);
    draw_arrays = "glDrawArrays": fn(u32, i32, i32);
}

/// GL function table bound to the engine's context
pub struct LoadedGl {
    gl: GlFunctions,
    /// OpenGL ES context: BGRA needs the extension and a matching internal format
    es: bool,
    bgra: bool,
}

impl LoadedGl {
    /// Resolve the entry points and probe the context
    ///
    /// # Safety
    /// The engine's GL context must be current, and `get_proc_address` must
    /// resolve core 1.1 entry points as well as later ones.
    pub unsafe fn load(get_proc_address: GetProcAddress) -> Result<Self, &'static str> {
        let gl = GlFunctions::load(get_proc_address)?;

        let version = gl_string(&gl, GL_VERSION);
        let es = version.contains("OpenGL ES");
        let bgra = !es || gl_string(&gl, GL_EXTENSIONS).contains("GL_EXT_texture_format_BGRA8888");
        log::info!("OGL: {} (BGRA uploads: {})", version, bgra);

        Ok(Self { gl, es, bgra })
    }

    fn external_format(format: PixelFormat) -> u32 {
        match format {
            PixelFormat::Bgra => GL_BGRA,
            PixelFormat::Rgba => GL_RGBA,
        }
    }
}

unsafe fn gl_string(gl: &GlFunctions, name: u32) -> String {
    let ptr = (gl.get_string)(name);
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr.cast()).to_string_lossy().into_owned()
}

fn info_log(len: i32, read: impl FnOnce(i32, *mut i32, *mut c_char)) -> String {
    if len <= 1 {
        return String::new();
    }
    let mut buf = vec![0u8; len as usize];
    let mut written = 0;
    read(len, &mut written, buf.as_mut_ptr().cast());
    buf.truncate(written.clamp(0, len) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

impl GlApi for LoadedGl {
    fn supports_bgra(&self) -> bool {
        self.bgra
    }

    fn viewport_size(&self) -> (i32, i32) {
        let mut viewport = [0i32; 4];
        unsafe { (self.gl.get_integerv)(GL_VIEWPORT, viewport.as_mut_ptr()) };
        (viewport[2], viewport[3])
    }

    fn create_shader(&mut self, stage: ShaderStage) -> u32 {
        let kind = match stage {
            ShaderStage::Vertex => GL_VERTEX_SHADER,
            ShaderStage::Fragment => GL_FRAGMENT_SHADER,
        };
        unsafe { (self.gl.create_shader)(kind) }
    }

    fn shader_source(&mut self, shader: u32, source: &str) {
        let ptr = source.as_ptr().cast::<c_char>();
        let len = source.len() as i32;
        unsafe { (self.gl.shader_source)(shader, 1, &ptr, &len) }
    }

    fn compile_shader(&mut self, shader: u32) {
        unsafe { (self.gl.compile_shader)(shader) }
    }

    fn shader_compiled(&mut self, shader: u32) -> bool {
        let mut status = 0;
        unsafe { (self.gl.get_shaderiv)(shader, GL_COMPILE_STATUS, &mut status) };
        status != 0
    }

    fn shader_info_log(&mut self, shader: u32) -> String {
        let mut len = 0;
        unsafe { (self.gl.get_shaderiv)(shader, GL_INFO_LOG_LENGTH, &mut len) };
        let get = self.gl.get_shader_info_log;
        info_log(len, |max, written, buf| unsafe { get(shader, max, written, buf) })
    }

    fn delete_shader(&mut self, shader: u32) {
        unsafe { (self.gl.delete_shader)(shader) }
    }

    fn create_program(&mut self) -> u32 {
        unsafe { (self.gl.create_program)() }
    }

    fn attach_shader(&mut self, program: u32, shader: u32) {
        unsafe { (self.gl.attach_shader)(program, shader) }
    }

    fn detach_shader(&mut self, program: u32, shader: u32) {
        unsafe { (self.gl.detach_shader)(program, shader) }
    }

    fn bind_attrib_location(&mut self, program: u32, index: u32, name: &str) {
        if let Ok(name) = CString::new(name) {
            unsafe { (self.gl.bind_attrib_location)(program, index, name.as_ptr()) }
        }
    }

    fn link_program(&mut self, program: u32) {
        unsafe { (self.gl.link_program)(program) }
    }

    fn program_linked(&mut self, program: u32) -> bool {
        let mut status = 0;
        unsafe { (self.gl.get_programiv)(program, GL_LINK_STATUS, &mut status) };
        status != 0
    }

    fn program_info_log(&mut self, program: u32) -> String {
        let mut len = 0;
        unsafe { (self.gl.get_programiv)(program, GL_INFO_LOG_LENGTH, &mut len) };
        let get = self.gl.get_program_info_log;
        info_log(len, |max, written, buf| unsafe { get(program, max, written, buf) })
    }

    fn delete_program(&mut self, program: u32) {
        unsafe { (self.gl.delete_program)(program) }
    }

    fn use_program(&mut self, program: u32) {
        unsafe { (self.gl.use_program)(program) }
    }

    fn uniform_location(&mut self, program: u32, name: &str) -> i32 {
        match CString::new(name) {
            Ok(name) => unsafe { (self.gl.get_uniform_location)(program, name.as_ptr()) },
            Err(_) => -1,
        }
    }

    fn uniform_matrix4(&mut self, location: i32, matrix: &[f32; 16]) {
        unsafe { (self.gl.uniform_matrix4fv)(location, 1, GL_FALSE, matrix.as_ptr()) }
    }

    fn uniform4(&mut self, location: i32, value: [f32; 4]) {
        unsafe { (self.gl.uniform4f)(location, value[0], value[1], value[2], value[3]) }
    }

    fn uniform1i(&mut self, location: i32, value: i32) {
        unsafe { (self.gl.uniform1i)(location, value) }
    }

    fn gen_texture(&mut self) -> u32 {
        let mut name = 0;
        unsafe { (self.gl.gen_textures)(1, &mut name) };
        name
    }

    fn bind_texture(&mut self, texture: u32) {
        unsafe {
            (self.gl.active_texture)(GL_TEXTURE0);
            (self.gl.bind_texture)(GL_TEXTURE_2D, texture);
        }
    }

    fn set_texture_filtering(&mut self, filtering: Filtering) {
        let filter = match filtering {
            Filtering::Nearest => GL_NEAREST,
            Filtering::Linear => GL_LINEAR,
        };
        unsafe {
            (self.gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_MIN_FILTER, filter);
            (self.gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_MAG_FILTER, filter);
            (self.gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_WRAP_S, GL_CLAMP_TO_EDGE);
            (self.gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_WRAP_T, GL_CLAMP_TO_EDGE);
        }
    }

    fn tex_image(&mut self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]) {
        let external = Self::external_format(format);
        // ES requires the internal format to match the external one.
        let internal = if self.es { external } else { GL_RGBA };
        unsafe {
            (self.gl.tex_image_2d)(
                GL_TEXTURE_2D,
                0,
                internal as i32,
                width as i32,
                height as i32,
                0,
                external,
                GL_UNSIGNED_BYTE,
                pixels.as_ptr().cast(),
            )
        }
    }

    fn tex_sub_image(&mut self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]) {
        unsafe {
            (self.gl.tex_sub_image_2d)(
                GL_TEXTURE_2D,
                0,
                0,
                0,
                width as i32,
                height as i32,
                Self::external_format(format),
                GL_UNSIGNED_BYTE,
                pixels.as_ptr().cast(),
            )
        }
    }

    fn delete_texture(&mut self, texture: u32) {
        unsafe { (self.gl.delete_textures)(1, &texture) }
    }

    fn enable_blending(&mut self) {
        unsafe {
            (self.gl.enable)(GL_BLEND);
            (self.gl.blend_func)(GL_SRC_ALPHA, GL_ONE_MINUS_SRC_ALPHA);
        }
    }

    fn draw_quad(&mut self, vertices: &[QuadVertex; 4]) {
        let stride = std::mem::size_of::<QuadVertex>() as i32;
        let base = vertices.as_ptr().cast::<u8>();
        let uv_offset = std::mem::size_of::<[f32; 3]>();
        unsafe {
            (self.gl.bind_buffer)(GL_ARRAY_BUFFER, 0);
            (self.gl.enable_vertex_attrib_array)(ATTRIB_POSITION);
            (self.gl.vertex_attrib_pointer)(ATTRIB_POSITION, 3, GL_FLOAT, GL_FALSE, stride, base.cast());
            (self.gl.enable_vertex_attrib_array)(ATTRIB_TEXCOORD);
            (self.gl.vertex_attrib_pointer)(
                ATTRIB_TEXCOORD,
                2,
                GL_FLOAT,
                GL_FALSE,
                stride,
                base.add(uv_offset).cast(),
            );
            (self.gl.draw_arrays)(GL_TRIANGLE_STRIP, 0, 4);
            (self.gl.disable_vertex_attrib_array)(ATTRIB_TEXCOORD);
            (self.gl.disable_vertex_attrib_array)(ATTRIB_POSITION);
        }
    }
}
