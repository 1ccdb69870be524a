//! Shader program creation for the GL backend
//!
//! Every failure branch deletes the GL objects created before it, newest
//! first, so a failed compile or link leaves nothing behind.

use crate::error::BackendError;
use crate::ogl::GlApi;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Attribute slots bound before linking
pub const ATTRIB_POSITION: u32 = 0;
pub const ATTRIB_TEXCOORD: u32 = 1;

pub const SPRITE_VERTEX_SHADER: &str = r#"#version 120
attribute vec3 a_Position;
attribute vec2 a_TexCoord;
uniform mat4 u_Transform;
varying vec2 v_TexCoord;

void main()
{
    v_TexCoord = a_TexCoord;
    gl_Position = u_Transform * vec4(a_Position, 1.0);
}
"#;

pub const SPRITE_FRAGMENT_SHADER: &str = r#"#version 120
uniform sampler2D u_Texture;
uniform vec4 u_Tint;
varying vec2 v_TexCoord;

void main()
{
    gl_FragColor = texture2D(u_Texture, v_TexCoord) * u_Tint;
}
"#;

fn log_shader_error(what: &str, failed_to: &str, info_log: &str) {
    log::error!("OpenGL: {} failed to {}:", what, failed_to);
    if info_log.is_empty() {
        log::error!("Shader info log was empty.");
    } else {
        log::error!("----------------------------------------");
        log::error!("{}", info_log.trim_end());
        log::error!("----------------------------------------");
    }
}

fn compile_stage<G: GlApi + ?Sized>(
    gl: &mut G,
    name: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<u32, BackendError> {
    let shader = gl.create_shader(stage);
    if shader == 0 {
        return Err(BackendError::ShaderCreate {
            name: name.to_string(),
            stage,
        });
    }

    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if gl.shader_compiled(shader) {
        return Ok(shader);
    }

    let info_log = gl.shader_info_log(shader);
    log_shader_error(&format!("{} program's {} shader", name, stage), "compile", &info_log);
    gl.delete_shader(shader);
    Err(BackendError::ShaderCompile {
        name: name.to_string(),
        stage,
        log: info_log,
    })
}

/// Compile and link a vertex + fragment program
///
/// Cleanup on failure:
/// - vertex compile: the vertex shader
/// - fragment compile: the fragment shader, then the vertex shader
/// - link: the program, then the fragment shader, then the vertex shader
///
/// On success both shader objects are detached and deleted; only the program
/// name is returned.
pub fn create_shader_program<G: GlApi + ?Sized>(
    gl: &mut G,
    name: &str,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<u32, BackendError> {
    let vertex = compile_stage(gl, name, ShaderStage::Vertex, vertex_src)?;

    let fragment = match compile_stage(gl, name, ShaderStage::Fragment, fragment_src) {
        Ok(fragment) => fragment,
        Err(err) => {
            gl.delete_shader(vertex);
            return Err(err);
        }
    };

    let program = gl.create_program();
    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    gl.bind_attrib_location(program, ATTRIB_POSITION, "a_Position");
    gl.bind_attrib_location(program, ATTRIB_TEXCOORD, "a_TexCoord");
    gl.link_program(program);

    if !gl.program_linked(program) {
        let info_log = gl.program_info_log(program);
        log_shader_error(&format!("{} program", name), "link", &info_log);
        gl.delete_program(program);
        gl.delete_shader(fragment);
        gl.delete_shader(vertex);
        return Err(BackendError::ShaderLink {
            name: name.to_string(),
            log: info_log,
        });
    }

    gl.detach_shader(program, vertex);
    gl.delete_shader(vertex);
    gl.detach_shader(program, fragment);
    gl.delete_shader(fragment);

    log::info!("OGL: {} shader program created successfully", name);
    Ok(program)
}

/// Delete a program created by [`create_shader_program`] and zero the name
pub fn delete_shader_program<G: GlApi + ?Sized>(gl: &mut G, program: &mut u32) {
    if *program != 0 {
        gl.delete_program(*program);
    }
    *program = 0;
}
