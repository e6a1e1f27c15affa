//! Embedded WGSL sources and the frame uniform layout they share.
//!
//! Each shader file declares `var<uniform> uniforms: FrameUniforms` but not
//! the struct itself; [`compose`] prepends the struct generated from the
//! [`UniformBlock`] that is uploaded each frame.

use glam::{Mat4, Vec2, Vec3};

use crate::config::SceneConfig;
use crate::uniforms::{names, UniformBlock};

pub const DISPLACEMENT_SOURCE: &str = include_str!("shaders/displacement.wgsl");
pub const BODIES_SOURCE: &str = include_str!("shaders/bodies.wgsl");
pub const CLOUD_SOURCE: &str = include_str!("shaders/cloud.wgsl");

/// Name of the generated uniform struct.
pub const FRAME_UNIFORMS: &str = "FrameUniforms";

/// The frame uniform block with its initial values.
///
/// Colors, light parameters and opacities are fixed for the session and set
/// here; the scene updates the rest every tick.
pub fn frame_uniform_layout(config: &SceneConfig) -> UniformBlock {
    UniformBlock::new()
        .declare(names::VIEW_PROJ, Mat4::IDENTITY)
        .declare(names::SPHERE_MODEL, Mat4::IDENTITY)
        .declare(names::CLOUD_MODEL, Mat4::IDENTITY)
        .declare(names::LIGHT_POSITION, Vec3::new(0.0, 0.0, config.light.z_offset))
        .declare(names::LIGHT_INTENSITY, config.light.intensity)
        .declare(names::LIGHT_COLOR, config.light.color.to_vec3())
        .declare(names::LIGHT_DISTANCE, config.light.distance)
        .declare(names::BODY_COLOR, config.field.color.to_vec3())
        .declare(names::AMBIENT, config.light.ambient)
        .declare(names::SPHERE_COLOR, config.displacement.color.to_vec3())
        .declare(names::TIME, 0.0f32)
        .declare(names::CLOUD_COLOR, config.cloud.color.to_vec3())
        .declare(names::BODY_EMISSIVE, config.field.emissive_intensity)
        .declare(names::POINTER, Vec2::ZERO)
        .declare(names::BODY_OPACITY, config.field.opacity)
        .declare(names::CLOUD_OPACITY, config.cloud.opacity)
}

/// Full shader source: the generated uniform struct followed by `body`.
pub fn compose(block: &UniformBlock, body: &str) -> String {
    format!("{}\n{}", block.to_wgsl_struct(FRAME_UNIFORMS), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code).map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn layout_is_tightly_packed() {
        let block = frame_uniform_layout(&SceneConfig::default());
        assert_eq!(block.len(), 16);
        assert_eq!(block.byte_size(), 288);
        assert_eq!(block.offset_of(names::LIGHT_INTENSITY), Some(204));
        assert_eq!(block.offset_of(names::TIME), Some(252));
        assert_eq!(block.offset_of(names::POINTER), Some(272));
        assert_eq!(block.offset_of(names::CLOUD_OPACITY), Some(284));
    }

    #[test]
    fn all_shaders_validate() {
        let block = frame_uniform_layout(&SceneConfig::default());
        for (name, body) in [
            ("displacement", DISPLACEMENT_SOURCE),
            ("bodies", BODIES_SOURCE),
            ("cloud", CLOUD_SOURCE),
        ] {
            let source = compose(&block, body);
            if let Err(e) = validate_wgsl(&source) {
                panic!("{name} shader failed validation: {e}\n{source}");
            }
        }
    }

    #[test]
    fn displacement_constants_are_embedded() {
        for snippet in [
            "position.x * 2.0 + uniforms.time",
            "position.y * 2.0 + uniforms.time",
            "* 0.15",
            "position.xy * 0.2",
            "smoothstep(0.0, 1.5, d)) * 0.2",
            "0.3 + distortion * 2.5",
        ] {
            assert!(DISPLACEMENT_SOURCE.contains(snippet), "missing `{snippet}`");
        }
    }

    #[test]
    fn composed_shader_declares_struct_first() {
        let block = frame_uniform_layout(&SceneConfig::default());
        let source = compose(&block, CLOUD_SOURCE);
        let decl = source.find("struct FrameUniforms").unwrap();
        let usage = source.find("var<uniform> uniforms: FrameUniforms").unwrap();
        assert!(decl < usage);
    }
}
