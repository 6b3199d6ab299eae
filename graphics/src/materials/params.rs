//! GPU parameter blocks.
//!
//! Each block mirrors a shader constant buffer byte for byte. Field offsets
//! are part of the shader contract and are checked at compile time; padding
//! is spelled out as explicit fields so the blocks stay `Pod`.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::{offset_of, size_of};
use verdant_core::math::vec3_to_array;
use verdant_core::{Light, LightKind};

use crate::technique::ParameterLayout;

/// Forward pass block of the standard material.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct StandardParameters {
    pub camera_position: [f32; 3],
    pub reference_alpha: f32,
    pub diffuse_color: [f32; 3],
    pub alpha: f32,
    pub ambient_color: [f32; 3],
    pub _padding0: f32,
    pub emissive_color: [f32; 3],
    pub tex_coord_fix: f32,
    pub texture_offset: [f32; 2],
    pub _padding1: [f32; 2],
}

const_assert_eq!(size_of::<StandardParameters>(), 80);
const_assert_eq!(offset_of!(StandardParameters, camera_position), 0);
const_assert_eq!(offset_of!(StandardParameters, reference_alpha), 12);
const_assert_eq!(offset_of!(StandardParameters, diffuse_color), 16);
const_assert_eq!(offset_of!(StandardParameters, alpha), 28);
const_assert_eq!(offset_of!(StandardParameters, ambient_color), 32);
const_assert_eq!(offset_of!(StandardParameters, emissive_color), 48);
const_assert_eq!(offset_of!(StandardParameters, tex_coord_fix), 60);
const_assert_eq!(offset_of!(StandardParameters, texture_offset), 64);

/// G-buffer pass block shared by the standard, dual and environment materials.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GBufferParameters {
    pub specular_power: f32,
    pub texture_offset: [f32; 2],
    pub _padding: f32,
}

const_assert_eq!(size_of::<GBufferParameters>(), 16);
const_assert_eq!(offset_of!(GBufferParameters, specular_power), 0);
const_assert_eq!(offset_of!(GBufferParameters, texture_offset), 4);

/// The single light a forward draw is shaded with.
///
/// Fields a light kind does not use keep their previous value. `cone_angle`
/// stores the cosine of half the spot opening angle.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct LightParameters {
    pub position: [f32; 3],
    pub range: f32,
    pub direction: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub cone_angle: f32,
}

const_assert_eq!(size_of::<LightParameters>(), 48);
const_assert_eq!(offset_of!(LightParameters, position), 0);
const_assert_eq!(offset_of!(LightParameters, range), 12);
const_assert_eq!(offset_of!(LightParameters, direction), 16);
const_assert_eq!(offset_of!(LightParameters, intensity), 28);
const_assert_eq!(offset_of!(LightParameters, color), 32);
const_assert_eq!(offset_of!(LightParameters, cone_angle), 44);

impl LightParameters {
    /// Write `light` into the block.
    pub fn update(&mut self, light: &Light) {
        self.color = light.color.to_array3();
        self.intensity = light.intensity;

        match light.kind {
            LightKind::Directional { direction } => {
                self.direction = vec3_to_array(direction);
            }
            LightKind::Point { position, range } => {
                self.position = vec3_to_array(position);
                self.range = range;
            }
            LightKind::Spot {
                position,
                direction,
                range,
                cone_angle,
            } => {
                self.position = vec3_to_array(position);
                self.direction = vec3_to_array(direction);
                self.range = range;
                self.cone_angle = (cone_angle / 2.0).cos();
            }
        }
    }
}

/// Forward material block, including the nearby light.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ForwardParameters {
    pub camera_position: [f32; 3],
    pub reference_alpha: f32,
    pub diffuse_color: [f32; 3],
    pub alpha: f32,
    pub ambient_color: [f32; 3],
    pub specular_power: f32,
    pub texture_offset: [f32; 2],
    pub specular_intensity: f32,
    pub _padding: f32,
    pub light: LightParameters,
}

const_assert_eq!(size_of::<ForwardParameters>(), 112);
const_assert_eq!(offset_of!(ForwardParameters, camera_position), 0);
const_assert_eq!(offset_of!(ForwardParameters, reference_alpha), 12);
const_assert_eq!(offset_of!(ForwardParameters, diffuse_color), 16);
const_assert_eq!(offset_of!(ForwardParameters, alpha), 28);
const_assert_eq!(offset_of!(ForwardParameters, ambient_color), 32);
const_assert_eq!(offset_of!(ForwardParameters, specular_power), 44);
const_assert_eq!(offset_of!(ForwardParameters, texture_offset), 48);
const_assert_eq!(offset_of!(ForwardParameters, specular_intensity), 56);
const_assert_eq!(offset_of!(ForwardParameters, light), 64);

/// Forward pass block of the dual texture material.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct DualParameters {
    pub diffuse_color: [f32; 4],
    pub ambient_color: [f32; 3],
    pub tex_coord_fix: f32,
    pub texture_offset1: [f32; 2],
    pub texture_offset2: [f32; 2],
}

const_assert_eq!(size_of::<DualParameters>(), 48);
const_assert_eq!(offset_of!(DualParameters, diffuse_color), 0);
const_assert_eq!(offset_of!(DualParameters, ambient_color), 16);
const_assert_eq!(offset_of!(DualParameters, tex_coord_fix), 28);
const_assert_eq!(offset_of!(DualParameters, texture_offset1), 32);
const_assert_eq!(offset_of!(DualParameters, texture_offset2), 40);

/// Forward pass block of the environment material.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct EnvironmentParameters {
    pub camera_position: [f32; 3],
    pub fresnel_factor: f32,
    pub diffuse_color: [f32; 3],
    pub environment_amount: f32,
    pub ambient_color: [f32; 3],
    pub tex_coord_fix: f32,
}

const_assert_eq!(size_of::<EnvironmentParameters>(), 48);
const_assert_eq!(offset_of!(EnvironmentParameters, camera_position), 0);
const_assert_eq!(offset_of!(EnvironmentParameters, fresnel_factor), 12);
const_assert_eq!(offset_of!(EnvironmentParameters, diffuse_color), 16);
const_assert_eq!(offset_of!(EnvironmentParameters, environment_amount), 28);
const_assert_eq!(offset_of!(EnvironmentParameters, ambient_color), 32);
const_assert_eq!(offset_of!(EnvironmentParameters, tex_coord_fix), 44);

pub const STANDARD_LAYOUT: ParameterLayout =
    ParameterLayout::of::<StandardParameters>("StandardParameters");
pub const GBUFFER_LAYOUT: ParameterLayout =
    ParameterLayout::of::<GBufferParameters>("GBufferParameters");
pub const FORWARD_LAYOUT: ParameterLayout =
    ParameterLayout::of::<ForwardParameters>("ForwardParameters");
pub const DUAL_LAYOUT: ParameterLayout = ParameterLayout::of::<DualParameters>("DualParameters");
pub const ENVIRONMENT_LAYOUT: ParameterLayout =
    ParameterLayout::of::<EnvironmentParameters>("EnvironmentParameters");

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::Color;
    use verdant_core::math::Vec3;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(STANDARD_LAYOUT.size, 80);
        assert_eq!(GBUFFER_LAYOUT.size, 16);
        assert_eq!(FORWARD_LAYOUT.size, 112);
        assert_eq!(DUAL_LAYOUT.size, 48);
        assert_eq!(ENVIRONMENT_LAYOUT.size, 48);
    }

    #[test]
    fn test_bytes_follow_field_offsets() {
        let params = EnvironmentParameters {
            fresnel_factor: 2.5,
            tex_coord_fix: -1.0,
            ..Default::default()
        };
        let bytes = bytemuck::bytes_of(&params);
        assert_eq!(&bytes[12..16], &2.5f32.to_ne_bytes());
        assert_eq!(&bytes[44..48], &(-1.0f32).to_ne_bytes());
    }

    #[test]
    fn test_spot_light_stores_half_angle_cosine() {
        let mut block = LightParameters::default();
        let angle = std::f32::consts::FRAC_PI_2;
        block.update(&Light::spot(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, -1.0, 0.0),
            15.0,
            angle,
            Color::WHITE,
            3.0,
        ));

        assert!((block.cone_angle - (angle / 2.0).cos()).abs() < 1e-6);
        assert_eq!(block.position, [1.0, 2.0, 3.0]);
        assert_eq!(block.direction, [0.0, -1.0, 0.0]);
        assert_eq!(block.range, 15.0);
        assert_eq!(block.intensity, 3.0);
    }

    #[test]
    fn test_directional_light_keeps_position() {
        let mut block = LightParameters {
            position: [4.0, 5.0, 6.0],
            ..Default::default()
        };
        block.update(&Light::directional(Vec3::new(0.0, 0.0, -1.0), Color::WHITE, 1.0));

        assert_eq!(block.position, [4.0, 5.0, 6.0]);
        assert_eq!(block.direction, [0.0, 0.0, -1.0]);
    }
}
