//! OpenGL backend
//!
//! Draws through one shader program. The host owns the GL context, so the
//! backend only ever touches it between the host's own draw calls.

use crate::backend::{BackendKind, DeviceHandle, RenderBackend};
use crate::error::BackendError;
use crate::geometry::{sprite_quad, QuadVertex};
use crate::screen::Screen;
use crate::shader::{
    create_shader_program, delete_shader_program, ShaderStage, SPRITE_FRAGMENT_SHADER,
    SPRITE_VERTEX_SHADER,
};
use crate::texture::{pack_rows, swap_red_blue, TextureEntry, TextureTable};
use sprite3d_scene::{to_device_array, DrawCommand, Filtering, Matrix, TextureHandle};

/// Channel order of pixels handed to `tex_image`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bgra,
    Rgba,
}

/// The slice of OpenGL the backend needs
///
/// Names follow GL: 0 is never a valid shader, program or texture name.
pub trait GlApi: Send {
    /// `GL_EXT_bgra` / GL 1.2 style BGRA uploads
    fn supports_bgra(&self) -> bool;
    /// Current `GL_VIEWPORT` width and height
    fn viewport_size(&self) -> (i32, i32);

    fn create_shader(&mut self, stage: ShaderStage) -> u32;
    fn shader_source(&mut self, shader: u32, source: &str);
    fn compile_shader(&mut self, shader: u32);
    fn shader_compiled(&mut self, shader: u32) -> bool;
    fn shader_info_log(&mut self, shader: u32) -> String;
    fn delete_shader(&mut self, shader: u32);

    fn create_program(&mut self) -> u32;
    fn attach_shader(&mut self, program: u32, shader: u32);
    fn detach_shader(&mut self, program: u32, shader: u32);
    fn bind_attrib_location(&mut self, program: u32, index: u32, name: &str);
    fn link_program(&mut self, program: u32);
    fn program_linked(&mut self, program: u32) -> bool;
    fn program_info_log(&mut self, program: u32) -> String;
    fn delete_program(&mut self, program: u32);
    fn use_program(&mut self, program: u32);

    fn uniform_location(&mut self, program: u32, name: &str) -> i32;
    fn uniform_matrix4(&mut self, location: i32, matrix: &[f32; 16]);
    fn uniform4(&mut self, location: i32, value: [f32; 4]);
    fn uniform1i(&mut self, location: i32, value: i32);

    fn gen_texture(&mut self) -> u32;
    fn bind_texture(&mut self, texture: u32);
    fn set_texture_filtering(&mut self, filtering: Filtering);
    /// Allocate and fill the bound texture
    fn tex_image(&mut self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]);
    /// Overwrite the bound texture's full content
    fn tex_sub_image(&mut self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]);
    fn delete_texture(&mut self, texture: u32);

    /// Straight alpha blending (`SRC_ALPHA`, `ONE_MINUS_SRC_ALPHA`)
    fn enable_blending(&mut self);
    /// Draw a textured triangle strip with the current program
    fn draw_quad(&mut self, vertices: &[QuadVertex; 4]);
}

#[derive(Debug, Clone, Copy, Default)]
struct Uniforms {
    transform: i32,
    texture: i32,
    tint: i32,
}

pub struct OglBackend {
    gl: Box<dyn GlApi>,
    program: u32,
    uniforms: Uniforms,
    textures: TextureTable<u32>,
    device: DeviceHandle,
}

impl OglBackend {
    pub fn new(gl: Box<dyn GlApi>) -> Self {
        Self {
            gl,
            program: 0,
            uniforms: Uniforms::default(),
            textures: TextureTable::new(),
            device: DeviceHandle::default(),
        }
    }

    /// Pack rows and convert to whatever the context accepts
    fn prepare_pixels(
        &self,
        rows: &[&[u8]],
        width: u32,
        height: u32,
    ) -> Result<(Vec<u8>, PixelFormat), BackendError> {
        let mut pixels = pack_rows(rows, width, height)?;
        if self.gl.supports_bgra() {
            return Ok((pixels, PixelFormat::Bgra));
        }
        swap_red_blue(&mut pixels);
        Ok((pixels, PixelFormat::Rgba))
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl RenderBackend for OglBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ogl
    }

    fn init_gfx_mode(&mut self, screen: &mut Screen) -> Result<(), BackendError> {
        if self.program == 0 {
            self.program = create_shader_program(
                &mut *self.gl,
                "Sprite",
                SPRITE_VERTEX_SHADER,
                SPRITE_FRAGMENT_SHADER,
            )?;
            self.uniforms = Uniforms {
                transform: self.gl.uniform_location(self.program, "u_Transform"),
                texture: self.gl.uniform_location(self.program, "u_Texture"),
                tint: self.gl.uniform_location(self.program, "u_Tint"),
            };
        }

        let (width, height) = self.gl.viewport_size();
        if width > 0 && height > 0 {
            screen.width = width;
            screen.height = height;
        }
        self.gl.enable_blending();

        log::info!("OGL: initialised for {}x{}", screen.width, screen.height);
        Ok(())
    }

    fn init_gfx_device(&mut self, device: DeviceHandle) {
        // The GL context is current on the host's thread; nothing to rebind.
        if self.device != device {
            log::debug!("OGL: context handle {:#x}", device.0);
            self.device = device;
        }
    }

    fn set_screen_matrixes(
        &mut self,
        screen: &mut Screen,
        world: Option<&Matrix>,
        view: Option<&Matrix>,
        proj: Option<&Matrix>,
    ) {
        screen.set_matrices(world, view, proj);
    }

    fn create_texture(
        &mut self,
        rows: &[&[u8]],
        width: u32,
        height: u32,
        filtering: Filtering,
    ) -> Result<TextureHandle, BackendError> {
        let (pixels, format) = self.prepare_pixels(rows, width, height)?;

        let name = self.gl.gen_texture();
        if name == 0 {
            return Err(BackendError::TextureAllocation { width, height });
        }
        self.gl.bind_texture(name);
        self.gl.set_texture_filtering(filtering);
        self.gl.tex_image(width, height, format, &pixels);

        Ok(self.textures.insert(TextureEntry {
            native: name,
            width,
            height,
            filtering,
        }))
    }

    fn update_texture_data(
        &mut self,
        texture: TextureHandle,
        rows: &[&[u8]],
        width: u32,
        height: u32,
    ) -> Result<(), BackendError> {
        let entry = self.textures.get_sized(texture, width, height)?;
        let (pixels, format) = self.prepare_pixels(rows, width, height)?;

        self.gl.bind_texture(entry.native);
        self.gl.tex_sub_image(width, height, format, &pixels);
        Ok(())
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if let Some(entry) = self.textures.remove(texture) {
            self.gl.delete_texture(entry.native);
        }
    }

    fn draw_sprite(&mut self, screen: &Screen, sprite: &DrawCommand) -> Result<(), BackendError> {
        if self.program == 0 {
            return Err(BackendError::NotInitialized);
        }
        let entry = self.textures.get(sprite.texture)?;

        let transform = to_device_array(&screen.device_transform(sprite));
        let tint = sprite.modulation();

        self.gl.use_program(self.program);
        self.gl.uniform_matrix4(self.uniforms.transform, &transform);
        self.gl.uniform4(self.uniforms.tint, tint.to_array());
        self.gl.uniform1i(self.uniforms.texture, 0);
        self.gl.bind_texture(entry.native);
        self.gl.draw_quad(&sprite_quad(sprite.width, sprite.height));
        Ok(())
    }

    fn shutdown(&mut self) {
        for name in self.textures.drain() {
            self.gl.delete_texture(name);
        }
        delete_shader_program(&mut *self.gl, &mut self.program);
        log::info!("OGL: shut down");
    }
}
